use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::JsonBody;

use crate::models::UpdatePatientProfileRequest;
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn get_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(&config).profile_for(&user).await?;

    Ok(Json(json!({
        "patient": patient.listing(),
        "age": patient.age()
    })))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    JsonBody(request): JsonBody<UpdatePatientProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);
    let patient = service.profile_for(&user).await?;
    let updated = service.update_profile(patient.id, request).await?;

    Ok(Json(json!({
        "message": "Your profile has been updated.",
        "patient": updated.listing()
    })))
}
