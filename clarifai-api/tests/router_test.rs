/// Router-level tests
///
/// These exercise the HTTP surface without a live database: the pool is
/// built lazily and the requests below are answered before any query
/// runs, so routing, the session layer, and error shapes can be checked
/// in isolation.
use axum::body::Body;
use axum::http::{Request, StatusCode};
use clarifai_api::app::{build_router, AppState};
use clarifai_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, UploadConfig};
use clarifai_shared::storage::local::LocalStore;
use clarifai_shared::verify::Verifier;
use std::sync::Arc;
use tower::ServiceExt as _;

const TEST_SECRET: &str = "router-test-secret-at-least-32-bytes!!";

async fn test_router(upload_root: &std::path::Path) -> axum::Router {
    let config = Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: "postgresql://localhost:1/unreachable".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
        uploads: UploadConfig {
            root: upload_root.display().to_string(),
            max_bytes: 1024 * 1024,
        },
        blob: None,
        chat: None,
        identity: None,
        telemetry_connection_string: None,
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database.url)
        .unwrap();

    let store = Arc::new(LocalStore::new(upload_root).await.unwrap());

    build_router(AppState::new(pool, config, store, Verifier::unconfigured()))
}

#[tokio::test]
async fn test_tasks_require_authentication() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path()).await;

    let response = router
        .oneshot(Request::get("/v1/tasks").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_files_require_authentication() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path()).await;

    let response = router
        .oneshot(Request::get("/v1/files").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_bearer_token_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path()).await;

    let response = router
        .oneshot(
            Request::get("/v1/dashboard")
                .header("authorization", "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path()).await;

    let response = router
        .oneshot(
            Request::get("/v1/tasks")
                .header("authorization", "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_federated_login_unconfigured_is_503() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path()).await;

    let response = router
        .oneshot(
            Request::get("/v1/auth/federated?redirect_uri=http://localhost/cb")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path()).await;

    let response = router
        .oneshot(Request::get("/v1/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
