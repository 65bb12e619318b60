/// Configuration management for the API server
///
/// Loads configuration from environment variables into a type-safe struct.
/// Only `DATABASE_URL` and `JWT_SECRET` are required; the object store,
/// verification backend, federated identity, and telemetry sections are
/// optional, and their absence degrades the corresponding feature instead
/// of failing startup.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `JWT_SECRET`: session-token signing key, at least 32 chars (required)
/// - `API_HOST` / `API_PORT`: bind address (default 0.0.0.0:8080)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default 10)
/// - `UPLOAD_ROOT`: local upload directory (default ./uploads)
/// - `MAX_UPLOAD_BYTES`: per-request upload cap (default 16 MiB)
/// - `BLOB_ENDPOINT` / `BLOB_CONTAINER` / `BLOB_SAS_TOKEN`: object store
/// - `CHAT_ENDPOINT` / `CHAT_API_KEY` / `CHAT_DEPLOYMENT`: verification
///   backend
/// - `IDP_CLIENT_ID` / `IDP_CLIENT_SECRET` / `IDP_TENANT`: federated login
/// - `TELEMETRY_CONNECTION_STRING`: recorded and logged at startup
use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Session-token configuration
    pub jwt: JwtConfig,

    /// Upload handling
    pub uploads: UploadConfig,

    /// Object store, if configured
    pub blob: Option<BlobConfig>,

    /// Verification chat backend, if configured
    pub chat: Option<ChatConfig>,

    /// Federated identity provider, if configured
    pub identity: Option<IdentityConfig>,

    /// Telemetry connection string, if provided
    pub telemetry_connection_string: Option<String>,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Session-token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Signing secret, at least 32 bytes
    pub secret: String,
}

/// Upload handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Root directory for local-disk uploads
    pub root: String,

    /// Maximum accepted multipart body size in bytes
    pub max_bytes: usize,
}

/// Object-store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Account endpoint, e.g. "https://acct.blob.example.net"
    pub endpoint: String,

    /// Container name
    pub container: String,

    /// SAS-style query credential (may be empty for public containers)
    pub sas_token: String,
}

/// Verification chat-backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Chat-completions endpoint URL
    pub endpoint: String,

    /// API key sent in the `api-key` header
    pub api_key: String,

    /// Model deployment name
    pub deployment: String,
}

/// Federated identity-provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// OAuth client id
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: String,

    /// Provider tenant id
    pub tenant: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a value
    /// fails to parse. Optional sections never cause an error; a partially
    /// set section is treated as unconfigured with a warning.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env if present (development convenience).
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let upload_root = env::var("UPLOAD_ROOT").unwrap_or_else(|_| "./uploads".to_string());
        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (16 * 1024 * 1024).to_string())
            .parse::<usize>()?;

        let blob = optional_section(
            "object store",
            [
                env::var("BLOB_ENDPOINT").ok(),
                env::var("BLOB_CONTAINER").ok(),
            ],
            || BlobConfig {
                endpoint: env::var("BLOB_ENDPOINT").unwrap_or_default(),
                container: env::var("BLOB_CONTAINER").unwrap_or_default(),
                sas_token: env::var("BLOB_SAS_TOKEN").unwrap_or_default(),
            },
        );

        let chat = optional_section(
            "verification backend",
            [
                env::var("CHAT_ENDPOINT").ok(),
                env::var("CHAT_API_KEY").ok(),
                env::var("CHAT_DEPLOYMENT").ok(),
            ],
            || ChatConfig {
                endpoint: env::var("CHAT_ENDPOINT").unwrap_or_default(),
                api_key: env::var("CHAT_API_KEY").unwrap_or_default(),
                deployment: env::var("CHAT_DEPLOYMENT").unwrap_or_default(),
            },
        );

        let identity = optional_section(
            "federated identity",
            [
                env::var("IDP_CLIENT_ID").ok(),
                env::var("IDP_CLIENT_SECRET").ok(),
                env::var("IDP_TENANT").ok(),
            ],
            || IdentityConfig {
                client_id: env::var("IDP_CLIENT_ID").unwrap_or_default(),
                client_secret: env::var("IDP_CLIENT_SECRET").unwrap_or_default(),
                tenant: env::var("IDP_TENANT").unwrap_or_default(),
            },
        );

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            uploads: UploadConfig {
                root: upload_root,
                max_bytes: max_upload_bytes,
            },
            blob,
            chat,
            identity,
            telemetry_connection_string: env::var("TELEMETRY_CONNECTION_STRING").ok(),
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// Builds an optional config section
///
/// All listed variables must be present for the section to activate; a
/// partially set section is ignored with a warning so a stray variable
/// can't half-enable a feature.
fn optional_section<T, const N: usize>(
    name: &str,
    vars: [Option<String>; N],
    build: impl FnOnce() -> T,
) -> Option<T> {
    let set = vars.iter().filter(|v| v.is_some()).count();

    if set == N {
        Some(build())
    } else {
        if set > 0 {
            tracing::warn!(
                "Ignoring partially configured {} ({}/{} variables set)",
                name,
                set,
                N
            );
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/clarifai".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            uploads: UploadConfig {
                root: "./uploads".to_string(),
                max_bytes: 16 * 1024 * 1024,
            },
            blob: None,
            chat: None,
            identity: None,
            telemetry_connection_string: None,
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_optional_section_requires_all_vars() {
        let full = optional_section("t", [Some("a".to_string()), Some("b".to_string())], || 1);
        assert_eq!(full, Some(1));

        let partial = optional_section("t", [Some("a".to_string()), None], || 1);
        assert_eq!(partial, None);

        let empty: Option<i32> = optional_section("t", [None, None], || 1);
        assert_eq!(empty, None);
    }
}
