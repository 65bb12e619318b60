/// Uploaded-file metadata model
///
/// Rows describe uploaded files; the bytes themselves live in a storage
/// backend (local disk or object store, see the `storage` module). The
/// `stored_name` doubles as the storage key and is collision-resistant:
/// `{uuid}_{sanitized original name}`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE files (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     stored_name TEXT NOT NULL,
///     original_name TEXT NOT NULL,
///     size_bytes BIGINT NOT NULL,
///     content_type TEXT NOT NULL,
///     uploader_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     task_id UUID REFERENCES tasks(id) ON DELETE CASCADE,
///     is_remote BOOLEAN NOT NULL DEFAULT FALSE,
///     remote_url TEXT,
///     uploaded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// File metadata row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredFile {
    /// Unique file ID
    pub id: Uuid,

    /// Storage key (collision-resistant, path-safe)
    pub stored_name: String,

    /// Name the file was uploaded under; used as the download name
    pub original_name: String,

    /// Size in bytes
    pub size_bytes: i64,

    /// Declared content type
    pub content_type: String,

    /// User who uploaded the file
    pub uploader_id: Uuid,

    /// Owning task, if the file was attached to one
    pub task_id: Option<Uuid>,

    /// Whether the bytes live in the object store rather than local disk
    pub is_remote: bool,

    /// Object URL for remote-backed files
    pub remote_url: Option<String>,

    pub uploaded_at: DateTime<Utc>,
}

/// Input for recording an uploaded file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    pub stored_name: String,
    pub original_name: String,
    pub size_bytes: i64,
    pub content_type: String,
    pub uploader_id: Uuid,
    pub task_id: Option<Uuid>,
    pub is_remote: bool,
    pub remote_url: Option<String>,
}

impl StoredFile {
    /// Records a file after its bytes were persisted to a backend
    pub async fn create(pool: &PgPool, data: CreateFile) -> Result<Self, sqlx::Error> {
        let file = sqlx::query_as::<_, StoredFile>(
            r#"
            INSERT INTO files (stored_name, original_name, size_bytes, content_type,
                               uploader_id, task_id, is_remote, remote_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, stored_name, original_name, size_bytes, content_type,
                      uploader_id, task_id, is_remote, remote_url, uploaded_at
            "#,
        )
        .bind(data.stored_name)
        .bind(data.original_name)
        .bind(data.size_bytes)
        .bind(data.content_type)
        .bind(data.uploader_id)
        .bind(data.task_id)
        .bind(data.is_remote)
        .bind(data.remote_url)
        .fetch_one(pool)
        .await?;

        Ok(file)
    }

    /// Finds a file by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let file = sqlx::query_as::<_, StoredFile>(
            r#"
            SELECT id, stored_name, original_name, size_bytes, content_type,
                   uploader_id, task_id, is_remote, remote_url, uploaded_at
            FROM files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(file)
    }

    /// Lists all files, newest upload first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let files = sqlx::query_as::<_, StoredFile>(
            r#"
            SELECT id, stored_name, original_name, size_bytes, content_type,
                   uploader_id, task_id, is_remote, remote_url, uploaded_at
            FROM files
            ORDER BY uploaded_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(files)
    }

    /// Lists files attached to one task
    pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let files = sqlx::query_as::<_, StoredFile>(
            r#"
            SELECT id, stored_name, original_name, size_bytes, content_type,
                   uploader_id, task_id, is_remote, remote_url, uploaded_at
            FROM files
            WHERE task_id = $1
            ORDER BY uploaded_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(files)
    }

    /// Deletes the metadata row
    ///
    /// The caller removes the underlying bytes first (best-effort); this
    /// runs unconditionally afterwards.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_file_struct() {
        let create = CreateFile {
            stored_name: "a1b2c3_report.pdf".to_string(),
            original_name: "report.pdf".to_string(),
            size_bytes: 1024,
            content_type: "application/pdf".to_string(),
            uploader_id: Uuid::new_v4(),
            task_id: None,
            is_remote: false,
            remote_url: None,
        };

        assert_eq!(create.size_bytes, 1024);
        assert!(!create.is_remote);
    }
}
