// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{auth_middleware, doctor_required, patient_required};

use crate::handlers;

/// Mounted under `/doctor`.
pub fn doctor_appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/dashboard", get(handlers::doctor_dashboard))
        .route("/complete_appointment/{appointment_id}", post(handlers::complete_appointment))
        .route("/cancel_appointment/{appointment_id}", post(handlers::cancel_appointment))
        .route("/patient_history/{patient_id}", get(handlers::patient_history))
        .route_layer(middleware::from_fn(doctor_required))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Mounted under `/patient`.
pub fn patient_appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/dashboard", get(handlers::patient_dashboard))
        .route(
            "/book_appointment/{doctor_id}",
            get(handlers::booking_page).post(handlers::book_appointment),
        )
        .route("/view_treatment/{appointment_id}", get(handlers::view_treatment))
        .route_layer(middleware::from_fn(patient_required))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
