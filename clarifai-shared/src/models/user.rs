/// User model and database operations
///
/// Users authenticate either with a locally stored argon2 password hash or
/// through the federated identity provider, in which case `password_hash`
/// is NULL and `external_subject` carries the provider's subject id.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email TEXT NOT NULL UNIQUE,
///     username TEXT NOT NULL,
///     password_hash TEXT,
///     role TEXT NOT NULL DEFAULT 'user',
///     is_federated BOOLEAN NOT NULL DEFAULT FALSE,
///     external_subject TEXT UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User account row
///
/// Passwords are stored as Argon2id hashes, never in plaintext. Federated
/// users carry no local credential at all.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, unique across all users
    pub email: String,

    /// Display name
    pub username: String,

    /// Argon2id password hash (None for federated users)
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    /// Flat role string; present in the schema but not used for
    /// authorization decisions
    pub role: String,

    /// Whether this account authenticates via the identity provider
    pub is_federated: bool,

    /// Identity-provider subject id, unique when present
    pub external_subject: Option<String>,

    pub created_at: DateTime<Utc>,

    /// When the user last logged in (None if never)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a local (password) user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub username: String,

    /// Argon2id hash, not the plaintext password
    pub password_hash: String,
}

impl User {
    /// Creates a local user with a password credential
    ///
    /// # Errors
    ///
    /// Fails on a duplicate email (unique constraint) or connection error.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, username, password_hash, role, is_federated,
                      external_subject, created_at, last_login_at
            "#,
        )
        .bind(data.email)
        .bind(data.username)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Creates or refreshes a federated user keyed by email
    ///
    /// Called after a successful identity-provider handshake. An existing
    /// row (local or federated) is switched to federated and picks up the
    /// provider subject id; the password hash, if any, is left in place.
    pub async fn upsert_federated(
        pool: &PgPool,
        email: &str,
        username: &str,
        external_subject: &str,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, is_federated, external_subject)
            VALUES ($1, $2, TRUE, $3)
            ON CONFLICT (email) DO UPDATE
            SET username = EXCLUDED.username,
                is_federated = TRUE,
                external_subject = EXCLUDED.external_subject
            RETURNING id, email, username, password_hash, role, is_federated,
                      external_subject, created_at, last_login_at
            "#,
        )
        .bind(email)
        .bind(username)
        .bind(external_subject)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, role, is_federated,
                   external_subject, created_at, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, role, is_federated,
                   external_subject, created_at, last_login_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Stamps the last-login time after successful authentication
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users ordered by display name (for assignee pickers)
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, role, is_federated,
                   external_subject, created_at, last_login_at
            FROM users
            ORDER BY username ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_struct() {
        let create = CreateUser {
            email: "pm@example.com".to_string(),
            username: "pm".to_string(),
            password_hash: "$argon2id$...".to_string(),
        };

        assert_eq!(create.email, "pm@example.com");
        assert_eq!(create.username, "pm");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "pm@example.com".to_string(),
            username: "pm".to_string(),
            password_hash: Some("$argon2id$secret".to_string()),
            role: "user".to_string(),
            is_federated: false,
            external_subject: None,
            created_at: Utc::now(),
            last_login_at: None,
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("pm@example.com"));
    }
}
