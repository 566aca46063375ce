use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{admin_required, auth_middleware};

use crate::handlers;

/// Mounted under `/admin`.
pub fn admin_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/dashboard", get(handlers::dashboard))
        .route("/manage_doctors", get(handlers::manage_doctors))
        .route("/add_doctor", get(handlers::add_doctor_form).post(handlers::add_doctor))
        .route(
            "/edit_doctor/{doctor_id}",
            get(handlers::edit_doctor_form).post(handlers::edit_doctor),
        )
        .route("/deactivate_doctor/{user_id}", post(handlers::deactivate_doctor))
        .route("/activate_doctor/{user_id}", post(handlers::activate_doctor))
        .route("/manage_patients", get(handlers::manage_patients))
        .route_layer(middleware::from_fn(admin_required))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
