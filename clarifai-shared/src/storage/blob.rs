/// Object-store storage backend
///
/// Talks to a blob container over plain REST: PUT to upload, DELETE to
/// remove, and object URLs handed back for download redirects. The
/// credential is a SAS-style query string appended to every object URL.
///
/// Configured from `BLOB_ENDPOINT` + `BLOB_CONTAINER` + `BLOB_SAS_TOKEN`;
/// when unconfigured the application falls back to [`super::local::LocalStore`].
use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::{FileStore, PutOutcome, Retrieved, StorageError};

/// Object-store backed file store
#[derive(Debug, Clone)]
pub struct BlobStore {
    client: reqwest::Client,

    /// Container base URL, e.g. "https://acct.blob.example.net/uploads"
    base_url: String,

    /// SAS-style query credential, e.g. "sv=...&sig=..." (may be empty)
    sas_token: String,
}

impl BlobStore {
    pub fn new(endpoint: &str, container: &str, sas_token: &str) -> Self {
        let base_url = format!(
            "{}/{}",
            endpoint.trim_end_matches('/'),
            container.trim_matches('/')
        );

        Self {
            client: reqwest::Client::new(),
            base_url,
            sas_token: sas_token.trim_start_matches('?').to_string(),
        }
    }

    /// Public object URL (without the credential), recorded on file rows
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(key))
    }

    /// Object URL with the credential attached, used for requests
    fn signed_url(&self, key: &str) -> String {
        if self.sas_token.is_empty() {
            self.object_url(key)
        } else {
            format!("{}?{}", self.object_url(key), self.sas_token)
        }
    }
}

#[async_trait]
impl FileStore for BlobStore {
    fn name(&self) -> &str {
        "blob"
    }

    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<PutOutcome, StorageError> {
        let response = self
            .client
            .put(self.signed_url(key))
            .header("x-ms-blob-type", "BlockBlob")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::Remote(format!(
                "upload of {} failed with status {}",
                key,
                response.status()
            )));
        }

        debug!(key, "Uploaded object to blob store");

        Ok(PutOutcome {
            is_remote: true,
            remote_url: Some(self.object_url(key)),
        })
    }

    async fn get(&self, key: &str) -> Result<Retrieved, StorageError> {
        // Downloads are served by redirecting the client to the object URL;
        // no bytes flow through the application.
        Ok(Retrieved::Url(self.signed_url(key)))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let response = self
            .client
            .delete(self.signed_url(key))
            .send()
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(key.to_string()));
        }

        if !response.status().is_success() {
            return Err(StorageError::Remote(format!(
                "delete of {} failed with status {}",
                key,
                response.status()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_shape() {
        let store = BlobStore::new("https://acct.blob.example.net/", "uploads", "sv=1&sig=abc");
        assert_eq!(
            store.object_url("k_report.pdf"),
            "https://acct.blob.example.net/uploads/k_report.pdf"
        );
    }

    #[test]
    fn test_signed_url_appends_credential() {
        let store = BlobStore::new("https://acct.blob.example.net", "uploads", "?sv=1&sig=abc");
        assert_eq!(
            store.signed_url("k"),
            "https://acct.blob.example.net/uploads/k?sv=1&sig=abc"
        );
    }

    #[test]
    fn test_signed_url_without_credential() {
        let store = BlobStore::new("https://acct.blob.example.net", "uploads", "");
        assert_eq!(store.signed_url("k"), store.object_url("k"));
    }

    #[test]
    fn test_object_url_escapes_key() {
        let store = BlobStore::new("https://acct.blob.example.net", "uploads", "");
        assert_eq!(
            store.object_url("a b"),
            "https://acct.blob.example.net/uploads/a%20b"
        );
    }
}
