use std::sync::Arc;

use axum::{routing::get, Json, Router};
use chrono::{Datelike, Local};
use serde_json::{json, Value};

use admin_cell::admin_routes;
use appointment_cell::{doctor_appointment_routes, patient_appointment_routes};
use auth_cell::auth_routes;
use doctor_cell::{api_routes, availability_routes, patient_doctor_routes};
use patient_cell::patient_profile_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let doctor = doctor_appointment_routes(state.clone()).merge(availability_routes(state.clone()));

    let patient = patient_appointment_routes(state.clone())
        .merge(patient_doctor_routes(state.clone()))
        .merge(patient_profile_routes(state.clone()));

    Router::new()
        .route("/", get(index))
        .merge(auth_routes(state.clone()))
        .nest("/doctor", doctor)
        .nest("/patient", patient)
        .nest("/admin", admin_routes(state.clone()))
        .nest("/api/doctors", api_routes(state))
}

async fn index() -> Json<Value> {
    Json(json!({
        "name": "Hospital Management System",
        "status": "running",
        "current_year": Local::now().year()
    }))
}
