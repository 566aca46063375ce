use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::{auth_middleware, patient_required};

use crate::handlers::*;

/// Mounted under `/patient`.
pub fn patient_profile_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route_layer(middleware::from_fn(patient_required))
        .route_layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
