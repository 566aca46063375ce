use serde::{Deserialize, Serialize};

use patient_cell::PatientError;
use shared_models::auth::User;
use shared_models::error::AppError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Longer-lived session when set.
    #[serde(default)]
    pub remember: bool,
}

/// A freshly issued session.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
    pub dashboard: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("That email is already taken. Please choose a different one.")]
    EmailTaken,

    #[error("Login unsuccessful. Please check email and password.")]
    InvalidCredentials,

    #[error("This account has been deactivated. Please contact an admin.")]
    Deactivated,

    #[error("{0}")]
    Validation(String),

    #[error("Could not issue session: {0}")]
    Token(String),

    #[error(transparent)]
    Patient(#[from] PatientError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Database(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailTaken => AppError::Conflict(err.to_string()),
            AuthError::InvalidCredentials => AppError::Auth(err.to_string()),
            AuthError::Deactivated => AppError::Forbidden(err.to_string()),
            AuthError::Validation(msg) => AppError::ValidationError(msg),
            AuthError::Token(msg) => AppError::Internal(msg),
            AuthError::Patient(inner) => inner.into(),
            AuthError::Database(msg) => AppError::Database(msg),
        }
    }
}
