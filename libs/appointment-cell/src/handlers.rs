// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Local;
use serde_json::{json, Value};

use doctor_cell::{DepartmentService, DoctorService};
use patient_cell::PatientService;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::JsonBody;

use crate::models::{BookAppointmentRequest, CompleteAppointmentRequest, TIME_STORE_FORMAT};
use crate::services::AppointmentService;

// ==============================================================================
// DOCTOR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn doctor_dashboard(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state).profile_for(&user).await?;
    let today = Local::now().date_naive();

    let dashboard = AppointmentService::new(&state)
        .doctor_dashboard(doctor.id, today)
        .await?;

    Ok(Json(json!({
        "title": "Doctor Dashboard",
        "doctor": doctor.summary(),
        "today": today,
        "todays_appointments": dashboard.todays_appointments,
        "upcoming_appointments": dashboard.upcoming_appointments,
        "completed_appointments": dashboard.completed_appointments
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
    JsonBody(request): JsonBody<CompleteAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state).profile_for(&user).await?;

    let appointment = AppointmentService::new(&state)
        .complete(doctor.id, appointment_id, request)
        .await?;

    Ok(Json(json!({
        "message": "Appointment marked as complete and treatment notes saved.",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state).profile_for(&user).await?;

    let appointment = AppointmentService::new(&state)
        .cancel(doctor.id, appointment_id)
        .await?;

    Ok(Json(json!({
        "message": "Appointment has been cancelled.",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn patient_history(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let (patient, appointments) = AppointmentService::new(&state)
        .patient_history(patient_id)
        .await?;

    Ok(Json(json!({
        "title": format!("History for {}", patient.name()),
        "patient": patient.listing(),
        "appointments": appointments
    })))
}

// ==============================================================================
// PATIENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn patient_dashboard(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let today = Local::now().date_naive();
    let departments = DepartmentService::new(&state).list_departments().await?;

    // A patient without a profile still gets a dashboard, just an empty one.
    let (upcoming, past) = match PatientService::new(&state).get_by_user_id(user.id).await? {
        Some(patient) => {
            let appointments = AppointmentService::new(&state)
                .patient_appointments(patient.id, today)
                .await?;
            (appointments.upcoming_appointments, appointments.past_appointments)
        }
        None => (Vec::new(), Vec::new()),
    };

    Ok(Json(json!({
        "title": "Patient Dashboard",
        "departments": departments,
        "upcoming_appointments": upcoming,
        "past_appointments": past
    })))
}

#[axum::debug_handler]
pub async fn booking_page(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let doctor = AppointmentService::new(&state)
        .bookable_doctor(doctor_id)
        .await?;

    Ok(Json(json!({
        "title": "Book Appointment",
        "doctor": doctor.summary(),
        "availability": doctor.availability_view()
    })))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<i64>,
    JsonBody(request): JsonBody<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let today = Local::now().date_naive();

    let (appointment, doctor) = AppointmentService::new(&state)
        .book(&user, doctor_id, request, today)
        .await?;

    let message = format!(
        "Appointment booked with Dr. {} on {} at {}.",
        doctor.name(),
        appointment.appointment_date.format("%Y-%m-%d"),
        appointment.appointment_time.format(TIME_STORE_FORMAT)
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": message,
            "appointment": appointment
        })),
    ))
}

#[axum::debug_handler]
pub async fn view_treatment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(&state).profile_for(&user).await?;

    let appointment = AppointmentService::new(&state)
        .treatment_for_patient(patient.id, appointment_id)
        .await?;

    Ok(Json(json!({
        "title": "View Treatment",
        "appointment": appointment
    })))
}
