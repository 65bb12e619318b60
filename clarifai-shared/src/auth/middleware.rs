/// Request authentication context
///
/// After the API's bearer-token middleware validates a session token it
/// inserts an `AuthContext` into the request extensions; handlers pull it
/// out with axum's `Extension` extractor.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use clarifai_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}", auth.email)
/// }
/// ```
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;

/// Identity of the authenticated caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// User email from the session token
    pub email: String,
}

impl AuthContext {
    /// Builds the context from validated session claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "pm@example.com");
        let ctx = AuthContext::from_claims(&claims);

        assert_eq!(ctx.user_id, user_id);
        assert_eq!(ctx.email, "pm@example.com");
    }
}
