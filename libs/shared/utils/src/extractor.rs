use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
    Json,
};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::{SupabaseClient, UserStore};
use shared_models::auth::{Role, User};
use shared_models::error::AppError;

use crate::jwt::{subject_id, validate_token};

/// JSON request body. Malformed or missing bodies become a 400 `{"error": ...}`
/// instead of axum's plain-text rejection.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                debug!("Rejected request body: {}", rejection.body_text());
                Err(AppError::BadRequest(rejection.body_text()))
            }
        }
    }
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    match auth_value.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(AppError::Auth("Invalid authorization header format".to_string())),
    }
}

/// Resolves the bearer token to a live, active account and stores it in the
/// request extensions. Deactivated accounts lose their session immediately.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())?;

    let claims = validate_token(&token, &config.session_secret).map_err(AppError::Auth)?;
    let user_id = subject_id(&claims).map_err(AppError::Auth)?;

    let users = UserStore::new(Arc::new(SupabaseClient::new(&config)));
    let record = users
        .find_active_by_id(user_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let user: User = match record {
        Some(record) => record.into(),
        None => {
            debug!("Rejecting session for missing or inactive user {}", user_id);
            return Err(AppError::Auth("Session is no longer valid".to_string()));
        }
    };

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub fn extract_user<B>(request: &Request<B>) -> Result<User, AppError> {
    request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

fn ensure_role<B>(request: &Request<B>, required: Role) -> Result<(), AppError> {
    let user = extract_user(request)?;
    if user.role == required {
        return Ok(());
    }

    warn!(
        "User {} with role {} denied access to {} route {}",
        user.id,
        user.role,
        required,
        request.uri().path()
    );

    let audience = match required {
        Role::Admin => "admins",
        Role::Doctor => "doctors",
        Role::Patient => "patients",
    };
    Err(AppError::Forbidden(format!("This page is for {} only.", audience)))
}

pub async fn admin_required(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    ensure_role(&request, Role::Admin)?;
    Ok(next.run(request).await)
}

pub async fn doctor_required(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    ensure_role(&request, Role::Doctor)?;
    Ok(next.run(request).await)
}

pub async fn patient_required(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    ensure_role(&request, Role::Patient)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::{
        http::{HeaderValue, StatusCode},
        middleware,
        routing::get,
        Extension, Router,
    };
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::test_utils::{JwtTestUtils, TestConfig, TestUser};

    fn gated_app(config: Arc<AppConfig>) -> Router {
        Router::new()
            .route("/admin", get(|Extension(user): Extension<User>| async move { user.name }))
            .route_layer(middleware::from_fn(admin_required))
            .route_layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
            .with_state(config)
    }

    async fn mount_user(server: &MockServer, user: &TestUser, active: bool) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .and(query_param("id", format!("eq.{}", user.id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                user.row_with_status(active)
            ])))
            .mount(server)
            .await;
    }

    fn req(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_matches!(extract_bearer_token(&headers), Err(AppError::Auth(_)));

        headers.insert("authorization", HeaderValue::from_static("Token abc"));
        assert_matches!(extract_bearer_token(&headers), Err(AppError::Auth(_)));

        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc");
    }

    #[tokio::test]
    async fn admin_passes_both_gates() {
        let server = MockServer::start().await;
        let config = TestConfig::with_store(&server.uri()).to_arc();
        let admin = TestUser::admin("admin@hospital.com");
        mount_user(&server, &admin, true).await;

        let token = JwtTestUtils::create_test_token(&admin, &config.session_secret, Some(1));
        let response = gated_app(config).oneshot(req("/admin", Some(&token))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn wrong_role_is_forbidden() {
        let server = MockServer::start().await;
        let config = TestConfig::with_store(&server.uri()).to_arc();
        let patient = TestUser::patient("pat@hospital.com");
        mount_user(&server, &patient, true).await;

        let token = JwtTestUtils::create_test_token(&patient, &config.session_secret, Some(1));
        let response = gated_app(config).oneshot(req("/admin", Some(&token))).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "This page is for admins only.");
    }

    #[tokio::test]
    async fn deactivated_account_loses_session() {
        let server = MockServer::start().await;
        let config = TestConfig::with_store(&server.uri()).to_arc();
        let admin = TestUser::admin("admin@hospital.com");
        mount_user(&server, &admin, false).await;

        let token = JwtTestUtils::create_test_token(&admin, &config.session_secret, Some(1));
        let response = gated_app(config).oneshot(req("/admin", Some(&token))).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_and_forged_tokens_are_unauthorized() {
        let config = TestConfig::default().to_arc();
        let app = gated_app(config);

        let response = app.clone().oneshot(req("/admin", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let forged = JwtTestUtils::create_invalid_signature_token(&TestUser::admin("a@b.com"));
        let response = app.oneshot(req("/admin", Some(&forged))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[derive(serde::Deserialize)]
    struct Greeting {
        name: String,
    }

    #[tokio::test]
    async fn bad_bodies_are_json_bad_requests() {
        let app = Router::new().route(
            "/greet",
            axum::routing::post(|JsonBody(greeting): JsonBody<Greeting>| async move {
                greeting.name
            }),
        );

        let missing = Request::builder()
            .method("POST")
            .uri("/greet")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(missing).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].is_string());

        let wrong_shape = Request::builder()
            .method("POST")
            .uri("/greet")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"nickname": "Ada"}"#))
            .unwrap();
        let response = app.clone().oneshot(wrong_shape).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let good = Request::builder()
            .method("POST")
            .uri("/greet")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name": "Ada"}"#))
            .unwrap();
        let response = app.oneshot(good).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
