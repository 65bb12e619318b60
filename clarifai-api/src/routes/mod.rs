/// API route handlers
///
/// - `health`: liveness/readiness probe
/// - `auth`: registration, local login, federated login, logout
/// - `tasks`: task lifecycle and dashboard
/// - `files`: upload, download, delete
pub mod auth;
pub mod files;
pub mod health;
pub mod tasks;
