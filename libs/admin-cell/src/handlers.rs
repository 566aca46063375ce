use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use doctor_cell::{
    CreateDoctorRequest, DepartmentService, DoctorError, DoctorSearchFilters, DoctorService,
};
use patient_cell::PatientService;
use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::extractor::JsonBody;

use crate::models::{EditDoctorForm, SearchQuery};
use crate::services::AdminService;

#[axum::debug_handler]
pub async fn dashboard(State(state): State<Arc<AppConfig>>) -> Result<Json<Value>, AppError> {
    let stats = AdminService::new(&state).dashboard_stats().await?;

    Ok(Json(json!({
        "title": "Admin Dashboard",
        "doctor_count": stats.doctor_count,
        "patient_count": stats.patient_count,
        "appointment_count": stats.appointment_count
    })))
}

// ==============================================================================
// DOCTOR ROSTER
// ==============================================================================

#[axum::debug_handler]
pub async fn manage_doctors(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, AppError> {
    let filters = DoctorSearchFilters::search(query.q);
    let doctors = DoctorService::new(&state).list_doctors(&filters).await?;
    let doctors: Vec<_> = doctors.iter().map(|d| d.listing()).collect();

    Ok(Json(json!({
        "title": "Manage Doctors",
        "doctors": doctors,
        "search_query": filters.q
    })))
}

#[axum::debug_handler]
pub async fn add_doctor_form(State(state): State<Arc<AppConfig>>) -> Result<Json<Value>, AppError> {
    let departments = DepartmentService::new(&state).list_departments().await?;

    Ok(Json(json!({
        "title": "Add Doctor",
        "departments": departments
    })))
}

#[axum::debug_handler]
pub async fn add_doctor(
    State(state): State<Arc<AppConfig>>,
    JsonBody(request): JsonBody<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doctor = DoctorService::new(&state).create_doctor(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("Doctor {} has been added.", doctor.name()),
            "doctor": doctor.listing()
        })),
    ))
}

#[axum::debug_handler]
pub async fn edit_doctor_form(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state).get_doctor(doctor_id).await?;
    let departments = DepartmentService::new(&state).list_departments().await?;

    Ok(Json(json!({
        "title": "Edit Doctor",
        "doctor_id": doctor.id,
        "form": {
            "name": doctor.name(),
            "email": doctor.email(),
            "department_id": doctor.department_id
        },
        "departments": departments
    })))
}

#[axum::debug_handler]
pub async fn edit_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
    JsonBody(form): JsonBody<EditDoctorForm>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state)
        .update_doctor(doctor_id, form.into())
        .await
        .map_err(|e| match e {
            DoctorError::EmailInUse { .. } => {
                AppError::Conflict("That email is already in use by another user.".to_string())
            }
            other => other.into(),
        })?;

    Ok(Json(json!({
        "message": "Doctor profile has been updated.",
        "doctor": doctor.listing()
    })))
}

#[axum::debug_handler]
pub async fn deactivate_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let user = DoctorService::new(&state)
        .set_doctor_active(user_id, false)
        .await?;

    Ok(Json(json!({
        "message": format!("Doctor {} has been deactivated.", user.name),
        "user": user
    })))
}

#[axum::debug_handler]
pub async fn activate_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let user = DoctorService::new(&state)
        .set_doctor_active(user_id, true)
        .await?;

    Ok(Json(json!({
        "message": format!("Doctor {} has been reactivated.", user.name),
        "user": user
    })))
}

// ==============================================================================
// PATIENT ROSTER
// ==============================================================================

#[axum::debug_handler]
pub async fn manage_patients(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, AppError> {
    let patients = PatientService::new(&state).search(query.q.as_deref()).await?;
    let patients: Vec<_> = patients.iter().map(|p| p.listing()).collect();

    Ok(Json(json!({
        "title": "Manage Patients",
        "patients": patients,
        "search_query": query.q
    })))
}
