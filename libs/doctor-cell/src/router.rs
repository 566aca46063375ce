use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{auth_middleware, doctor_required, patient_required};

use crate::handlers;

/// Mounted under `/doctor`.
pub fn availability_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route(
            "/availability",
            get(handlers::get_availability).post(handlers::update_availability),
        )
        .route_layer(middleware::from_fn(doctor_required))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Mounted under `/patient`.
pub fn patient_doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/view_doctors", get(handlers::patient_view_doctors))
        .route_layer(middleware::from_fn(patient_required))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Mounted under `/api/doctors`. Any signed-in user may read; writes check for admin.
pub fn api_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::api_list_doctors).post(handlers::api_create_doctor))
        .route(
            "/{doctor_id}",
            get(handlers::api_get_doctor)
                .put(handlers::api_update_doctor)
                .delete(handlers::api_delete_doctor),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
