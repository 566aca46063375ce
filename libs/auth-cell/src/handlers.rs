use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
    http::{HeaderMap, StatusCode},
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::extractor::{extract_bearer_token, JsonBody};
use shared_utils::jwt::validate_token;

use crate::models::{LoginRequest, RegisterRequest};
use crate::services::AuthService;

pub async fn register(
    State(config): State<Arc<AppConfig>>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let session = AuthService::new(&config).register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Your account has been created! You are now logged in.",
            "session": session
        })),
    ))
}

pub async fn login(
    State(config): State<Arc<AppConfig>>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let session = AuthService::new(&config).login(request).await?;

    Ok(Json(json!({
        "message": "Login successful.",
        "role": session.user.role,
        "session": session
    })))
}

/// Sessions are stateless tokens; the client forgets its token.
pub async fn logout(Extension(user): Extension<User>) -> Json<Value> {
    debug!("User {} logged out", user.id);
    Json(json!({ "message": "You have been logged out." }))
}

pub async fn dashboard(Extension(user): Extension<User>) -> Json<Value> {
    Json(json!({
        "role": user.role,
        "dashboard": user.role.dashboard_path()
    }))
}

pub async fn validate_session_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&headers)?;
    let claims = validate_token(&token, &config.session_secret).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: claims.sub,
        email: claims.email,
        role: claims.role,
    }))
}
