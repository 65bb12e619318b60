//! # Clarifai API Server
//!
//! Internal task tracker with business-goal verification. The server
//! provides:
//! - Task lifecycle endpoints (create, verify, submit, status updates)
//! - File upload/download against local disk or an object store
//! - Session authentication (local accounts and federated login)
//! - A per-user dashboard
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p clarifai-api
//! ```

use clarifai_api::{app, config::Config};
use clarifai_shared::{
    db,
    storage::{blob::BlobStore, local::LocalStore, FileStore},
    verify::{HttpChatBackend, Verifier},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clarifai_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Clarifai API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    if let Some(conn) = &config.telemetry_connection_string {
        tracing::info!("Telemetry connection string configured ({} chars)", conn.len());
    }

    let pool = db::pool::create_pool(db::pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    db::migrations::run_migrations(&pool).await?;

    let store: Arc<dyn FileStore> = match &config.blob {
        Some(blob) => {
            tracing::info!(container = %blob.container, "Using object-store backend");
            Arc::new(BlobStore::new(&blob.endpoint, &blob.container, &blob.sas_token))
        }
        None => {
            tracing::info!(root = %config.uploads.root, "Using local-disk backend");
            Arc::new(LocalStore::new(&config.uploads.root).await?)
        }
    };

    let verifier = match &config.chat {
        Some(chat) => Verifier::new(Arc::new(HttpChatBackend::new(
            &chat.endpoint,
            &chat.api_key,
            &chat.deployment,
        ))),
        None => {
            tracing::info!("No verification backend configured, assessments use fallback data");
            Verifier::unconfigured()
        }
    };

    let bind_address = config.bind_address();
    let state = app::AppState::new(pool, config, store, verifier);
    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, router).await?;

    Ok(())
}
