/// Session tokens (JWT, HS256)
///
/// A single token type backs the logged-in session: 24 hours, carrying the
/// user id and email. Logout is client-side token discard; there is no
/// server-side revocation list.
///
/// # Example
///
/// ```
/// use clarifai_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::new(Uuid::new_v4(), "pm@example.com");
/// let token = create_token(&claims, "a-secret-of-at-least-32-characters!!")?;
/// let validated = validate_token(&token, "a-secret-of-at-least-32-characters!!")?;
/// assert_eq!(validated.sub, claims.sub);
/// # Ok(())
/// # }
/// ```
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim baked into every token
const ISSUER: &str = "clarifai";

/// Session lifetime
const SESSION_HOURS: i64 = 24;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token failed validation (bad signature, malformed, wrong issuer)
    #[error("Invalid token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,
}

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user ID
    pub sub: Uuid,

    /// User email (convenience for handlers and logging)
    pub email: String,

    /// Issuer, always "clarifai"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates session claims for a user with the default lifetime
    pub fn new(user_id: Uuid, email: &str) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            email: email.to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(SESSION_HOURS)).timestamp(),
        }
    }
}

/// Signs claims into a compact JWT
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Validates a token's signature, expiry, and issuer
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(e.to_string()),
    })?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_create_and_validate_roundtrip() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "pm@example.com");
        let token = create_token(&claims, SECRET).unwrap();

        let validated = validate_token(&token, SECRET).unwrap();
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.email, "pm@example.com");
        assert_eq!(validated.iss, "clarifai");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "pm@example.com");
        let token = create_token(&claims, SECRET).unwrap();

        assert!(validate_token(&token, "another-secret-that-is-32-bytes!!").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut claims = Claims::new(Uuid::new_v4(), "pm@example.com");
        claims.iat -= 100_000;
        claims.exp = claims.iat + 1;

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(validate_token("not.a.jwt", SECRET).is_err());
    }

    #[test]
    fn test_session_expires_in_24_hours() {
        let claims = Claims::new(Uuid::new_v4(), "pm@example.com");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }
}
