/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength validation
/// - [`jwt`]: HS256 session-token generation and validation
/// - [`middleware`]: request auth context carried in axum extensions
///
/// Local logins verify an argon2 hash; federated logins skip the password
/// path entirely and are established by the identity-provider callback.
/// Both end in the same session JWT.
pub mod jwt;
pub mod middleware;
pub mod password;
