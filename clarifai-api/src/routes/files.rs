/// File upload, download, and deletion endpoints
///
/// Bytes live in the active storage backend; metadata rows live in the
/// database. Uploads accept a multipart batch under the `files` field
/// name. Downloads stream bytes for local-backed files and redirect for
/// remote-backed ones.
///
/// # Endpoints
///
/// - `GET    /v1/files`: paginated metadata listing
/// - `POST   /v1/files`: multipart batch upload
/// - `GET    /v1/files/:id`: download or redirect
/// - `DELETE /v1/files/:id`: remove bytes and metadata
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use clarifai_shared::{
    auth::middleware::AuthContext,
    models::file::{CreateFile, StoredFile},
    storage::{storage_key, FileStore, Retrieved, StorageError},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query parameters for the file listing
#[derive(Debug, Default, Deserialize)]
pub struct FileListQuery {
    /// 1-based page number (default 1)
    pub page: Option<i64>,

    /// Page size (default 20, capped at 100)
    pub per_page: Option<i64>,
}

/// Paginated file listing
#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<StoredFile>,
    pub page: i64,
    pub per_page: i64,
}

/// Query parameters for the batch upload
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    /// Task to attach the uploads to, if any
    pub task_id: Option<Uuid>,
}

/// Batch upload outcome
///
/// `stored` counts the parts that were actually persisted; a request whose
/// parts all carried empty filenames succeeds with `stored: 0`.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub stored: usize,
    pub files: Vec<StoredFile>,
}

/// Lists file metadata, newest upload first
pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<FileListQuery>,
) -> ApiResult<Json<FileListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let files = StoredFile::list(&state.db, per_page, (page - 1) * per_page).await?;

    Ok(Json(FileListResponse {
        files,
        page,
        per_page,
    }))
}

/// Stores a multipart batch of files
///
/// Every part named `files` with a non-empty filename is written to the
/// active backend under a fresh collision-resistant key and recorded.
/// Parts with empty filenames are skipped, matching what browsers send
/// for an unused file input. If `task_id` names an unknown task the
/// request is rejected before any bytes are written.
///
/// # Errors
///
/// - `400`: malformed multipart body
/// - `404`: `task_id` does not exist
pub async fn upload_files(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    if let Some(task_id) = query.task_id {
        clarifai_shared::models::task::Task::find_by_id(&state.db, task_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Task {task_id} not found")))?;
    }

    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("files") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        if original_name.is_empty() {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;

        let key = storage_key(&original_name);
        let size_bytes = data.len() as i64;

        let outcome = state
            .store
            .put(&key, data, &content_type)
            .await
            .map_err(|e| ApiError::InternalError(format!("Failed to store upload: {e}")))?;

        let file = StoredFile::create(
            &state.db,
            CreateFile {
                stored_name: key,
                original_name,
                size_bytes,
                content_type,
                uploader_id: auth.user_id,
                task_id: query.task_id,
                is_remote: outcome.is_remote,
                remote_url: outcome.remote_url,
            },
        )
        .await?;

        files.push(file);
    }

    tracing::info!(stored = files.len(), "Upload batch processed");

    Ok(Json(UploadResponse {
        stored: files.len(),
        files,
    }))
}

/// Downloads a file
///
/// Local-backed files come back as bytes with the original filename in
/// the Content-Disposition header; remote-backed files answer with a
/// temporary redirect to the object URL.
///
/// # Errors
///
/// - `404`: unknown id, or the bytes are gone from the backend
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let file = StoredFile::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("File {id} not found")))?;

    let retrieved = state.store.get(&file.stored_name).await.map_err(|e| match e {
        StorageError::NotFound(_) => {
            ApiError::NotFound(format!("File {id} is missing from storage"))
        }
        other => ApiError::InternalError(format!("Failed to retrieve file: {other}")),
    })?;

    match retrieved {
        Retrieved::Bytes(bytes) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                file.original_name.replace('"', "")
            );

            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, file.content_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response())
        }
        Retrieved::Url(url) => Ok(Redirect::temporary(&url).into_response()),
    }
}

/// Removes stored bytes without failing the request
///
/// Byte removal is best-effort: a missing object or a backend failure is
/// logged at warn and the caller proceeds to remove the metadata row, so
/// a half-deleted file can always be cleaned up.
async fn remove_bytes_best_effort(store: &dyn FileStore, id: Uuid, key: &str) {
    match store.delete(key).await {
        Ok(()) => {}
        Err(StorageError::NotFound(_)) => {
            tracing::warn!(file_id = %id, key, "Bytes already absent, removing metadata");
        }
        Err(e) => {
            tracing::warn!(file_id = %id, key, error = %e, "Byte removal failed, removing metadata anyway");
        }
    }
}

/// Deletes a file's bytes and metadata
///
/// The byte removal never blocks the deletion: whatever the storage
/// backend reports, the metadata row is removed.
///
/// # Errors
///
/// - `404`: unknown id
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let file = StoredFile::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("File {id} not found")))?;

    remove_bytes_best_effort(state.store.as_ref(), id, &file.stored_name).await;

    StoredFile::delete(&state.db, id).await?;

    Ok(Json(serde_json::json!({ "status": "deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use clarifai_shared::storage::PutOutcome;

    /// Storage backend whose delete always fails in a scripted way
    struct BrokenStore {
        error: fn(&str) -> StorageError,
    }

    #[async_trait]
    impl FileStore for BrokenStore {
        fn name(&self) -> &str {
            "broken"
        }

        async fn put(
            &self,
            key: &str,
            _bytes: Bytes,
            _content_type: &str,
        ) -> Result<PutOutcome, StorageError> {
            Err((self.error)(key))
        }

        async fn get(&self, key: &str) -> Result<Retrieved, StorageError> {
            Err((self.error)(key))
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            Err((self.error)(key))
        }
    }

    #[tokio::test]
    async fn test_byte_removal_survives_missing_object() {
        let store = BrokenStore {
            error: |key| StorageError::NotFound(key.to_string()),
        };

        remove_bytes_best_effort(&store, Uuid::new_v4(), "k_gone.pdf").await;
    }

    #[tokio::test]
    async fn test_byte_removal_survives_backend_failure() {
        // A flaky object store must not block metadata removal.
        let store = BrokenStore {
            error: |_| StorageError::Remote("delete failed with status 503".to_string()),
        };

        remove_bytes_best_effort(&store, Uuid::new_v4(), "k_report.pdf").await;
    }

    #[tokio::test]
    async fn test_byte_removal_survives_io_failure() {
        let store = BrokenStore {
            error: |_| std::io::Error::from(std::io::ErrorKind::PermissionDenied).into(),
        };

        remove_bytes_best_effort(&store, Uuid::new_v4(), "k_data.csv").await;
    }
}
