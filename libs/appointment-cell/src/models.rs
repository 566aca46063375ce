use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use doctor_cell::DoctorError;
use patient_cell::PatientError;
use shared_models::error::AppError;
use shared_utils::validation;

/// Appointment rows as the doctor sees them: patient name plus any treatment.
pub const DOCTOR_VIEW_SELECT: &str =
    "*,patient:patients(id,user_id,user:users(name,email)),treatment:treatments(*)";

/// Appointment rows as the patient sees them: doctor, department plus any treatment.
pub const PATIENT_VIEW_SELECT: &str =
    "*,doctor:doctors(id,user_id,user:users(name,email),department:departments(name)),treatment:treatments(*)";

/// Only appointments that already have a treatment row.
pub const HISTORY_SELECT: &str =
    "*,doctor:doctors(id,user_id,user:users(name,email),department:departments(name)),treatment:treatments!inner(*)";

pub const TIME_STORE_FORMAT: &str = "%H:%M:%S";

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Booked,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Booked => "Booked",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DepartmentName {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRef {
    pub id: i64,
    pub user_id: i64,
    pub user: Contact,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorRef {
    pub id: i64,
    pub user_id: i64,
    pub user: Contact,
    #[serde(default)]
    pub department: Option<DepartmentName>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Treatment {
    pub id: i64,
    pub appointment_id: i64,
    pub diagnosis: String,
    pub prescription: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<DoctorRef>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub treatment: Option<Treatment>,
}

impl Appointment {
    pub fn is_booked(&self) -> bool {
        self.status == AppointmentStatus::Booked
    }

    pub fn patient_name(&self) -> Option<&str> {
        self.patient.as_ref().map(|p| p.user.name.as_str())
    }

    pub fn doctor_name(&self) -> Option<&str> {
        self.doctor.as_ref().map(|d| d.user.name.as_str())
    }
}

/// The treatment embed comes back as an object, null or a one-element array
/// depending on how the store resolves the relationship.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Treatment>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let value = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(rows)) => match rows.into_iter().next() {
            Some(first) => first,
            None => return Ok(None),
        },
        Some(other) => other,
    };
    serde_json::from_value(value)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

/// Split appointments into upcoming (on or after `today`) and past, keeping order.
pub fn partition_by_date(
    appointments: Vec<Appointment>,
    today: NaiveDate,
) -> (Vec<Appointment>, Vec<Appointment>) {
    appointments
        .into_iter()
        .partition(|a| a.appointment_date >= today)
}

// ==============================================================================
// REQUEST / RESPONSE MODELS
// ==============================================================================

/// Booking form: `date` as `YYYY-MM-DD`, `time` as `HH:MM`.
#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteAppointmentRequest {
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTreatment {
    pub diagnosis: String,
    pub prescription: Option<String>,
    pub notes: Option<String>,
}

impl CompleteAppointmentRequest {
    pub fn into_treatment(self) -> Result<NewTreatment, AppointmentError> {
        let diagnosis = validation::require_text(self.diagnosis.as_deref(), "diagnosis")
            .map_err(|_| AppointmentError::DiagnosisRequired)?;

        let optional = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(NewTreatment {
            diagnosis,
            prescription: optional(self.prescription),
            notes: optional(self.notes),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorDashboard {
    pub todays_appointments: Vec<Appointment>,
    pub upcoming_appointments: Vec<Appointment>,
    pub completed_appointments: Vec<Appointment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientAppointments {
    pub upcoming_appointments: Vec<Appointment>,
    pub past_appointments: Vec<Appointment>,
}

// ==============================================================================
// ERROR MODELS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found.")]
    NotFound,

    #[error("Doctor not found or is inactive.")]
    DoctorUnavailable,

    #[error("This time slot is already taken by another patient. Please choose another time.")]
    SlotTaken,

    #[error("You cannot book an appointment in the past.")]
    PastDate,

    #[error("You do not have permission to modify this appointment.")]
    NotYourAppointment,

    #[error("You do not have permission to view this page.")]
    ViewForbidden,

    #[error("Only booked appointments can be completed.")]
    NotBooked(AppointmentStatus),

    #[error("This appointment cannot be cancelled.")]
    CannotCancel(AppointmentStatus),

    #[error("Could not complete appointment. Diagnosis is required.")]
    DiagnosisRequired,

    #[error("Treatment details are not yet available for this appointment.")]
    TreatmentUnavailable,

    #[error(transparent)]
    Doctor(#[from] DoctorError),

    #[error(transparent)]
    Patient(#[from] PatientError),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AppointmentError {
    fn from(err: anyhow::Error) -> Self {
        AppointmentError::Database(err.to_string())
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound
            | AppointmentError::DoctorUnavailable
            | AppointmentError::TreatmentUnavailable => AppError::NotFound(err.to_string()),
            AppointmentError::SlotTaken
            | AppointmentError::NotBooked(_)
            | AppointmentError::CannotCancel(_) => AppError::Conflict(err.to_string()),
            AppointmentError::PastDate | AppointmentError::DiagnosisRequired => {
                AppError::BadRequest(err.to_string())
            }
            AppointmentError::NotYourAppointment | AppointmentError::ViewForbidden => {
                AppError::Forbidden(err.to_string())
            }
            AppointmentError::Doctor(inner) => inner.into(),
            AppointmentError::Patient(inner) => inner.into(),
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::Database(msg) => AppError::Database(msg),
        }
    }
}
