use serde::{Deserialize, Serialize};

use appointment_cell::AppointmentError;
use doctor_cell::{DoctorError, UpdateDoctorRequest};
use patient_cell::PatientError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub doctor_count: usize,
    pub patient_count: usize,
    pub appointment_count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Edit form: every field is submitted, the email may be left unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct EditDoctorForm {
    pub name: String,
    pub email: String,
    pub department_id: i64,
}

impl From<EditDoctorForm> for UpdateDoctorRequest {
    fn from(form: EditDoctorForm) -> Self {
        UpdateDoctorRequest {
            name: Some(form.name),
            email: Some(form.email),
            department_id: Some(form.department_id),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Doctor(#[from] DoctorError),

    #[error(transparent)]
    Patient(#[from] PatientError),

    #[error(transparent)]
    Appointment(#[from] AppointmentError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AdminError {
    fn from(err: anyhow::Error) -> Self {
        AdminError::Database(err.to_string())
    }
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Doctor(inner) => inner.into(),
            AdminError::Patient(inner) => inner.into(),
            AdminError::Appointment(inner) => inner.into(),
            AdminError::Database(msg) => AppError::Database(msg),
        }
    }
}
