use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use shared_models::auth::User;
use shared_models::error::AppError;

/// Patient rows are read with their account embedded.
pub const PATIENT_SELECT: &str = "*,user:users(id,email,name,role,is_active)";

pub const CONTACT_PHONE_MAX_CHARS: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub user_id: i64,
    pub contact_phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub user: User,
}

impl Patient {
    pub fn name(&self) -> &str {
        &self.user.name
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }

    /// Age in whole years on the server's local date.
    pub fn age(&self) -> Option<u32> {
        self.age_on(Local::now().date_naive())
    }

    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.dob.and_then(|dob| today.years_since(dob))
    }

    /// Case-insensitive substring match on name, email or contact phone.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.user.name.to_lowercase().contains(&needle)
            || self.user.email.to_lowercase().contains(&needle)
            || self
                .contact_phone
                .as_deref()
                .is_some_and(|phone| phone.to_lowercase().contains(&needle))
    }

    pub fn listing(&self) -> PatientListing {
        PatientListing {
            id: self.id,
            user_id: self.user_id,
            name: self.user.name.clone(),
            email: self.user.email.clone(),
            contact_phone: self.contact_phone.clone(),
            dob: self.dob,
            is_active: self.user.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientListing {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub contact_phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub is_active: bool,
}

/// `dob` arrives as `YYYY-MM-DD`; an empty string clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePatientProfileRequest {
    pub contact_phone: Option<String>,
    pub dob: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found.")]
    NotFound,

    #[error("Could not find your patient profile.")]
    ProfileMissing,

    #[error("Date of birth cannot be in the future.")]
    InvalidDateOfBirth,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for PatientError {
    fn from(err: anyhow::Error) -> Self {
        PatientError::Database(err.to_string())
    }
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound | PatientError::ProfileMissing => {
                AppError::NotFound(err.to_string())
            }
            PatientError::InvalidDateOfBirth => AppError::ValidationError(err.to_string()),
            PatientError::Validation(msg) => AppError::ValidationError(msg),
            PatientError::Database(msg) => AppError::Database(msg),
        }
    }
}
