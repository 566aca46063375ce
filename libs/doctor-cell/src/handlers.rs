use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::JsonBody;

use crate::models::{
    ApiCreateDoctorRequest, DoctorError, DoctorSearchFilters, UpdateAvailabilityRequest,
    UpdateDoctorRequest,
};
use crate::services::{AvailabilityService, DepartmentService, DoctorService};

#[derive(Debug, Deserialize)]
pub struct ViewDoctorsQuery {
    pub dept_id: Option<String>,
    pub q: Option<String>,
}

impl ViewDoctorsQuery {
    /// A department id that is not a number is ignored rather than rejected.
    fn into_filters(self) -> DoctorSearchFilters {
        DoctorSearchFilters {
            department_id: self
                .dept_id
                .as_deref()
                .and_then(|raw| raw.trim().parse::<i64>().ok()),
            q: self.q,
        }
    }
}

// ==============================================================================
// DOCTOR: OWN AVAILABILITY
// ==============================================================================

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state).profile_for(&user).await?;
    let schedule = AvailabilityService::new(&state).get_schedule(doctor.id).await?;

    Ok(Json(json!({
        "doctor": doctor.summary(),
        "availability": schedule
    })))
}

#[axum::debug_handler]
pub async fn update_availability(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    JsonBody(request): JsonBody<UpdateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state).profile_for(&user).await?;
    let schedule = request.into_schedule()?;

    let updated = AvailabilityService::new(&state)
        .update_schedule(doctor.id, &schedule)
        .await?;

    Ok(Json(json!({
        "message": "Your availability has been updated.",
        "availability": updated.availability_view()
    })))
}

// ==============================================================================
// PATIENT: DOCTOR BROWSER
// ==============================================================================

#[axum::debug_handler]
pub async fn patient_view_doctors(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<ViewDoctorsQuery>,
) -> Result<Json<Value>, AppError> {
    let filters = query.into_filters();

    let departments = DepartmentService::new(&state).list_departments().await?;
    let doctors = DoctorService::new(&state).list_active_doctors(&filters).await?;
    let doctors: Vec<_> = doctors.iter().map(|d| d.listing()).collect();

    Ok(Json(json!({
        "departments": departments,
        "doctors": doctors,
        "selected_department": filters.department_id,
        "search_query": filters.q.unwrap_or_default(),
        "total": doctors.len()
    })))
}

// ==============================================================================
// JSON API: /api/doctors
// ==============================================================================

fn require_admin(user: &User) -> Result<(), AppError> {
    if user.role == Role::Admin {
        return Ok(());
    }
    warn!("User {} attempted an admin-only doctor API call", user.id);
    Err(AppError::Forbidden("Forbidden. Admin access required.".to_string()))
}

#[axum::debug_handler]
pub async fn api_list_doctors(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let doctors = DoctorService::new(&state)
        .list_active_doctors(&DoctorSearchFilters::default())
        .await?;

    let doctors: Vec<_> = doctors.iter().map(|d| d.summary()).collect();
    Ok(Json(json!({ "doctors": doctors })))
}

#[axum::debug_handler]
pub async fn api_create_doctor(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    JsonBody(request): JsonBody<ApiCreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_admin(&user)?;

    let request = request.into_complete().ok_or_else(|| {
        AppError::BadRequest(
            "Missing required fields: email, password, name, department_id".to_string(),
        )
    })?;

    let doctor = DoctorService::new(&state)
        .create_doctor(request)
        .await
        .map_err(|e| match e {
            DoctorError::EmailInUse { .. } => AppError::Conflict("Email already exists".to_string()),
            other => other.into(),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Doctor created successfully",
            "doctor": {
                "id": doctor.id,
                "name": doctor.name(),
                "email": doctor.email()
            }
        })),
    ))
}

#[axum::debug_handler]
pub async fn api_get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state).get_doctor(doctor_id).await?;
    if !doctor.is_active() {
        return Err(DoctorError::Inactive.into());
    }

    Ok(Json(json!({
        "doctor": {
            "id": doctor.id,
            "name": doctor.name(),
            "email": doctor.email(),
            "department": doctor.department.name,
            "availability": doctor.availability_view()
        }
    })))
}

#[axum::debug_handler]
pub async fn api_update_doctor(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<i64>,
    JsonBody(request): JsonBody<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let doctor = DoctorService::new(&state)
        .update_doctor(doctor_id, request)
        .await
        .map_err(|e| match e {
            DoctorError::EmailInUse { .. } => {
                AppError::Conflict("Email already in use by another user.".to_string())
            }
            other => other.into(),
        })?;

    Ok(Json(json!({
        "message": "Doctor updated successfully",
        "doctor": {
            "id": doctor.id,
            "name": doctor.name()
        }
    })))
}

#[axum::debug_handler]
pub async fn api_delete_doctor(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&user)?;

    DoctorService::new(&state).deactivate_doctor(doctor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
