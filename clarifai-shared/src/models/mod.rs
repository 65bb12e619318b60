/// Database models for Clarifai
///
/// All models follow the same shape: a row struct derived with
/// `sqlx::FromRow`, a `Create*` input struct, and async CRUD functions
/// taking a `&PgPool`.
///
/// # Models
///
/// - `user`: accounts, local and federated
/// - `task`: the tracked work item and its lifecycle
/// - `file`: uploaded file metadata (bytes live in a storage backend)
pub mod file;
pub mod task;
pub mod user;
