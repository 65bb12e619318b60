/// File storage backends
///
/// Uploaded bytes are written through the [`FileStore`] trait. Two
/// backends exist:
///
/// - [`local::LocalStore`]: files under a configured root directory
/// - [`blob::BlobStore`]: an object-store container reached over REST
///
/// Storage keys are generated once at upload time as
/// `{uuid}_{sanitized original name}`: collision-resistant and free of
/// path separators, so a key can never escape the storage root.
use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

pub mod blob;
pub mod local;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The object does not exist in the backend
    #[error("Object not found: {0}")]
    NotFound(String),

    /// I/O failure against local disk
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Object-store request failed
    #[error("Object store error: {0}")]
    Remote(String),
}

/// Where retrieved content lives
///
/// Local-backed files come back as bytes; remote-backed files come back as
/// a URL the caller redirects to.
#[derive(Debug, Clone)]
pub enum Retrieved {
    /// Raw bytes read from local disk
    Bytes(Bytes),

    /// Object URL for a redirect
    Url(String),
}

/// Outcome of a successful `put`
#[derive(Debug, Clone)]
pub struct PutOutcome {
    /// Whether the bytes went to the object store
    pub is_remote: bool,

    /// Object URL for remote-backed files
    pub remote_url: Option<String>,
}

/// Contract implemented by every storage backend
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Backend name, for logging
    fn name(&self) -> &str;

    /// Persists bytes under a key
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<PutOutcome, StorageError>;

    /// Retrieves content (bytes or a redirect URL) for a key
    async fn get(&self, key: &str) -> Result<Retrieved, StorageError>;

    /// Removes the bytes for a key
    ///
    /// Missing objects surface as [`StorageError::NotFound`]; callers on
    /// the delete path treat that as non-fatal.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Strips a client-supplied filename down to a path-safe form
///
/// Path separators and anything outside `[A-Za-z0-9._-]` are removed, and
/// leading dots are dropped so the result can never be a dotfile or a
/// traversal component. An empty result falls back to `"file"`.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let cleaned = cleaned.trim_start_matches('.').to_string();

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Generates a fresh collision-resistant storage key for an upload
pub fn storage_key(original_name: &str) -> String {
    format!("{}_{}", Uuid::new_v4(), sanitize_filename(original_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_name() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("data_2024-01.csv"), "data_2024-01.csv");
    }

    #[test]
    fn test_sanitize_removes_path_traversal() {
        let sanitized = sanitize_filename("../../etc/passwd");
        assert!(!sanitized.contains(".."));
        assert!(!sanitized.contains('/'));
        assert_eq!(sanitized, "etcpasswd");
    }

    #[test]
    fn test_sanitize_removes_separators_and_specials() {
        assert_eq!(sanitize_filename("a/b\\c.txt"), "abc.txt");
        assert_eq!(sanitize_filename("we ird name!.png"), "weirdname.png");
        assert_eq!(sanitize_filename("sp\0oof.txt"), "spoof.txt");
    }

    #[test]
    fn test_sanitize_never_returns_empty_or_dotfile() {
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename("///"), "file");
        assert_eq!(sanitize_filename("...."), "file");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
    }

    #[test]
    fn test_storage_key_is_unique_and_safe() {
        let k1 = storage_key("../../etc/passwd");
        let k2 = storage_key("../../etc/passwd");

        assert_ne!(k1, k2);
        assert!(k1.ends_with("_etcpasswd"));
        assert!(!k1.contains('/'));
        assert!(!k1.contains(".."));
    }
}
