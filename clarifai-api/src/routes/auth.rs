/// Authentication endpoints
///
/// Local accounts register and log in with email + password; federated
/// accounts arrive through an OAuth-style code handshake with the
/// configured identity provider. Both paths end in the same session
/// token. Logout is a stateless acknowledgement; the session token is
/// discarded client-side.
///
/// # Endpoints
///
/// - `POST /v1/auth/register`: create a local account
/// - `POST /v1/auth/login`: local login
/// - `POST /v1/auth/logout`: acknowledge logout (authenticated)
/// - `GET  /v1/auth/federated`: provider authorize URL
/// - `GET  /v1/auth/federated/callback`: code exchange → session token
use crate::{
    app::AppState,
    config::IdentityConfig,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use clarifai_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Display name
    #[validate(length(min = 1, max = 80, message = "Username must be 1-80 characters"))]
    pub username: String,

    /// Password (strength-checked separately)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Session response returned by every successful authentication
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// User ID
    pub user_id: String,

    /// Display name
    pub username: String,

    /// Session token (24 h)
    pub token: String,
}

/// Registers a new local user
///
/// # Errors
///
/// - `422`: validation or password-strength failure
/// - `409`: email already exists
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<SessionResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    password::validate_password_strength(&req.password)
        .map_err(|e| ApiError::invalid_field("password", &e))?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            username: req.username,
            password_hash,
        },
    )
    .await?;

    let token = jwt::create_token(&jwt::Claims::new(user.id, &user.email), state.jwt_secret())?;

    Ok(Json(SessionResponse {
        user_id: user.id.to_string(),
        username: user.username,
        token,
    }))
}

/// Local login with email and password
///
/// Federated accounts hold no local credential and are turned away toward
/// the federated flow. A successful login stamps `last_login_at`.
///
/// # Errors
///
/// - `401`: unknown email, wrong password, or a federated-only account
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    // Same message for every failure mode so the response doesn't reveal
    // which part was wrong.
    let hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    if !password::verify_password(&req.password, hash)? {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    User::update_last_login(&state.db, user.id).await?;

    let token = jwt::create_token(&jwt::Claims::new(user.id, &user.email), state.jwt_secret())?;

    Ok(Json(SessionResponse {
        user_id: user.id.to_string(),
        username: user.username,
        token,
    }))
}

/// Logout acknowledgement
///
/// Sessions are stateless; the client discards its token. The endpoint
/// exists so the surface matches the product's login/logout pair.
pub async fn logout(Extension(auth): Extension<AuthContext>) -> Json<serde_json::Value> {
    tracing::info!(user_id = %auth.user_id, "User logged out");
    Json(serde_json::json!({ "status": "logged_out" }))
}

/// Query for the federated authorize-URL endpoint
#[derive(Debug, Deserialize)]
pub struct FederatedStartQuery {
    /// Where the provider should send the code (the callback URL as the
    /// client reaches it)
    pub redirect_uri: String,
}

/// Federated authorize-URL response
#[derive(Debug, Serialize)]
pub struct FederatedStartResponse {
    /// Provider URL the client navigates to
    pub authorize_url: String,
}

/// Query delivered to the federated callback
#[derive(Debug, Deserialize)]
pub struct FederatedCallbackQuery {
    /// Authorization code from the provider
    pub code: String,

    /// Must match the redirect_uri used to obtain the code
    pub redirect_uri: String,
}

fn authority(identity: &IdentityConfig) -> String {
    format!("https://login.microsoftonline.com/{}", identity.tenant)
}

fn identity_config(state: &AppState) -> ApiResult<&IdentityConfig> {
    state
        .config
        .identity
        .as_ref()
        .ok_or_else(|| ApiError::NotConfigured("Federated login is not configured".to_string()))
}

/// Builds the provider authorize URL for the client to navigate to
///
/// # Errors
///
/// - `503`: federated login not configured
pub async fn federated_start(
    State(state): State<AppState>,
    Query(query): Query<FederatedStartQuery>,
) -> ApiResult<Json<FederatedStartResponse>> {
    let identity = identity_config(&state)?;

    let authorize_url = format!(
        "{}/oauth2/v2.0/authorize?client_id={}&response_type=code&scope=openid%20profile%20email&redirect_uri={}",
        authority(identity),
        urlencoding::encode(&identity.client_id),
        urlencoding::encode(&query.redirect_uri),
    );

    Ok(Json(FederatedStartResponse { authorize_url }))
}

/// Shape of the provider's token response (fields we use)
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Shape of the provider's userinfo response (fields we use)
#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

/// Exchanges the authorization code and logs the federated user in
///
/// The code is traded for an access token, the provider's userinfo
/// endpoint supplies subject/email/name, and the user row is upserted as
/// federated. Provider failures degrade to `502` without crashing the
/// application or creating partial state.
///
/// # Errors
///
/// - `503`: federated login not configured
/// - `502`: provider rejected the exchange or returned an unusable answer
pub async fn federated_callback(
    State(state): State<AppState>,
    Query(query): Query<FederatedCallbackQuery>,
) -> ApiResult<Json<SessionResponse>> {
    let identity = identity_config(&state)?;

    let client = reqwest::Client::new();

    let token: TokenResponse = client
        .post(format!("{}/oauth2/v2.0/token", authority(identity)))
        .form(&[
            ("client_id", identity.client_id.as_str()),
            ("client_secret", identity.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", query.code.as_str()),
            ("redirect_uri", query.redirect_uri.as_str()),
        ])
        .send()
        .await
        .map_err(|e| ApiError::UpstreamError(format!("token exchange failed: {e}")))?
        .error_for_status()
        .map_err(|e| ApiError::UpstreamError(format!("token exchange rejected: {e}")))?
        .json()
        .await
        .map_err(|e| ApiError::UpstreamError(format!("unusable token response: {e}")))?;

    let info: UserInfo = client
        .get("https://graph.microsoft.com/oidc/userinfo")
        .bearer_auth(&token.access_token)
        .send()
        .await
        .map_err(|e| ApiError::UpstreamError(format!("userinfo request failed: {e}")))?
        .error_for_status()
        .map_err(|e| ApiError::UpstreamError(format!("userinfo rejected: {e}")))?
        .json()
        .await
        .map_err(|e| ApiError::UpstreamError(format!("unusable userinfo response: {e}")))?;

    let email = info
        .email
        .ok_or_else(|| ApiError::UpstreamError("provider returned no email".to_string()))?;
    let username = info.name.unwrap_or_else(|| email.clone());

    let user = User::upsert_federated(&state.db, &email, &username, &info.sub).await?;
    User::update_last_login(&state.db, user.id).await?;

    let token = jwt::create_token(&jwt::Claims::new(user.id, &user.email), state.jwt_secret())?;

    Ok(Json(SessionResponse {
        user_id: user.id.to_string(),
        username: user.username,
        token,
    }))
}
