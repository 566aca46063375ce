use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};

use patient_cell::PatientService;
use shared_config::{AppConfig, DEFAULT_REMEMBER_ME_TTL_DAYS, DEFAULT_SESSION_TTL_HOURS};
use shared_database::{NewUser, SupabaseClient, UserStore};
use shared_models::auth::{Role, User};
use shared_utils::{jwt, password, validation};

use crate::models::{AuthError, LoginRequest, RegisterRequest, Session};

pub struct AuthService {
    users: UserStore,
    patients: PatientService,
    session_secret: String,
    session_ttl: Duration,
    remember_ttl: Duration,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            users: UserStore::new(Arc::clone(&supabase)),
            patients: PatientService::with_client(supabase),
            session_secret: config.session_secret.clone(),
            session_ttl: Duration::try_hours(config.session_ttl_hours)
                .unwrap_or_else(|| Duration::hours(DEFAULT_SESSION_TTL_HOURS)),
            remember_ttl: Duration::try_days(config.remember_me_ttl_days)
                .unwrap_or_else(|| Duration::days(DEFAULT_REMEMBER_ME_TTL_DAYS)),
        }
    }

    /// Public sign-up always creates a patient. The account is removed again
    /// if its patient profile cannot be created.
    pub async fn register(&self, request: RegisterRequest) -> Result<Session, AuthError> {
        debug!("Registration attempt for {}", request.email);

        validation::validate_name(&request.name).map_err(AuthError::Validation)?;
        validation::validate_email(&request.email).map_err(AuthError::Validation)?;
        validation::validate_password(&request.password).map_err(AuthError::Validation)?;
        validation::validate_passwords_match(&request.password, &request.confirm_password)
            .map_err(AuthError::Validation)?;

        if self.users.email_in_use(&request.email, None).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = password::hash_password(&request.password)
            .map_err(|e| AuthError::Token(format!("Password hashing failed: {}", e)))?;

        let record = self
            .users
            .insert(NewUser {
                email: request.email,
                name: request.name,
                role: Role::Patient,
                password_hash,
            })
            .await?;

        if let Err(e) = self.patients.create_for_user(record.id).await {
            warn!("Patient profile for user {} failed, removing account: {}", record.id, e);
            if let Err(cleanup) = self.users.delete(record.id).await {
                warn!("Could not remove orphaned user {}: {}", record.id, cleanup);
            }
            return Err(e.into());
        }

        info!("New patient account {} registered", record.id);
        self.issue_session(record.into(), false)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<Session, AuthError> {
        debug!("Login attempt for {}", request.email);

        let record = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let verified = password::verify_password(&request.password, &record.password_hash)
            .unwrap_or_else(|e| {
                warn!("Stored password hash for user {} is unreadable: {}", record.id, e);
                false
            });
        if !verified {
            warn!("Failed login for user {}", record.id);
            return Err(AuthError::InvalidCredentials);
        }

        if !record.is_active {
            warn!("Login refused for deactivated user {}", record.id);
            return Err(AuthError::Deactivated);
        }

        info!("User {} logged in", record.id);
        self.issue_session(record.into(), request.remember)
    }

    fn issue_session(&self, user: User, remember: bool) -> Result<Session, AuthError> {
        let ttl = if remember { self.remember_ttl } else { self.session_ttl };
        let token = jwt::issue_token(&user, &self.session_secret, ttl).map_err(AuthError::Token)?;

        Ok(Session {
            token,
            token_type: "Bearer",
            expires_in: ttl.num_seconds(),
            dashboard: user.role.dashboard_path(),
            user,
        })
    }
}
