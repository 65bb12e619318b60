/// Application state and router builder
///
/// `AppState` is the explicit context object handed to every handler:
/// database pool, configuration, the active storage backend, and the
/// verification shim. It is constructed once at startup and never
/// reassigned (tests inject their own).
use crate::{config::Config, error::ApiError, routes};
use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use clarifai_shared::{
    auth::{jwt, middleware::AuthContext},
    storage::FileStore,
    verify::Verifier,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned per request via axum's `State` extractor; `Arc` keeps the clone
/// cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Active file storage backend (local disk or object store)
    pub store: Arc<dyn FileStore>,

    /// Business-goal verification shim
    pub verifier: Verifier,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, store: Arc<dyn FileStore>, verifier: Verifier) -> Self {
        Self {
            db,
            config: Arc::new(config),
            store,
            verifier,
        }
    }

    /// Session-token signing secret
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete axum router
///
/// ```text
/// /
/// ├── /health                          # public
/// └── /v1/
///     ├── /auth/                       # login surface (public)
///     │   ├── POST /register  /login
///     │   ├── POST /logout             # authenticated
///     │   └── GET  /federated  /federated/callback
///     ├── /dashboard                   # authenticated
///     ├── /tasks/...                   # authenticated
///     └── /files/...                   # authenticated
/// ```
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public auth surface: no session required to obtain one.
    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/federated", get(routes::auth::federated_start))
        .route("/federated/callback", get(routes::auth::federated_callback));

    let session_auth_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/", post(routes::tasks::create_task))
        .route("/mine", get(routes::tasks::my_tasks))
        .route("/:id", get(routes::tasks::view_task))
        .route("/:id/verify", post(routes::tasks::verify_task))
        .route("/:id/submit", post(routes::tasks::submit_task))
        .route("/:id/status", post(routes::tasks::update_task_status))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let file_routes = Router::new()
        .route("/", get(routes::files::list_files))
        .route("/", post(routes::files::upload_files))
        .route("/:id", get(routes::files::download_file))
        .route("/:id", delete(routes::files::delete_file))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let dashboard_routes = Router::new()
        .route("/dashboard", get(routes::tasks::dashboard))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(session_auth_routes))
        .nest("/tasks", task_routes)
        .nest("/files", file_routes)
        .merge(dashboard_routes);

    let max_upload = state.config.uploads.max_bytes;

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Session authentication middleware
///
/// Validates the bearer token from the Authorization header and injects an
/// `AuthContext` into request extensions.
async fn session_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;
    req.extensions_mut().insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}
