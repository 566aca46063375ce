use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::{NewUser, SupabaseClient, UserStore};
use shared_models::auth::{Role, User};
use shared_utils::{password, validation};

use crate::models::{
    CreateDoctorRequest, Doctor, DoctorError, DoctorSearchFilters, UpdateDoctorRequest,
    ACTIVE_DOCTOR_SELECT, DOCTOR_SELECT,
};
use crate::services::department::DepartmentService;

pub struct DoctorService {
    supabase: Arc<SupabaseClient>,
    users: UserStore,
    departments: DepartmentService,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self {
            users: UserStore::new(Arc::clone(&supabase)),
            departments: DepartmentService::with_client(Arc::clone(&supabase)),
            supabase,
        }
    }

    /// Create the doctor's account and profile. If the profile insert fails
    /// the freshly created account is removed again.
    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        debug!("Creating new doctor profile for: {}", request.email);

        validation::validate_name(&request.name).map_err(DoctorError::Validation)?;
        validation::validate_email(&request.email).map_err(DoctorError::Validation)?;
        validation::validate_password(&request.password).map_err(DoctorError::Validation)?;

        self.ensure_department(request.department_id).await?;

        if self.users.email_in_use(&request.email, None).await? {
            return Err(DoctorError::EmailInUse {
                email: request.email,
            });
        }

        let password_hash = password::hash_password(&request.password)
            .map_err(|e| DoctorError::Database(format!("Password hashing failed: {}", e)))?;

        let user = self
            .users
            .insert(NewUser {
                email: request.email.clone(),
                name: request.name.clone(),
                role: Role::Doctor,
                password_hash,
            })
            .await?;

        let inserted = self
            .supabase
            .insert::<Doctor>(
                &format!("doctors?select={}", DOCTOR_SELECT),
                json!({
                    "user_id": user.id,
                    "department_id": request.department_id
                }),
            )
            .await;

        match inserted {
            Ok(doctor) => {
                info!("Doctor {} created with ID {}", doctor.user.email, doctor.id);
                Ok(doctor)
            }
            Err(e) => {
                warn!("Doctor profile insert failed, removing user {}: {}", user.id, e);
                if let Err(cleanup) = self.users.delete(user.id).await {
                    warn!("Could not remove orphaned user {}: {}", user.id, cleanup);
                }
                Err(e.into())
            }
        }
    }

    pub async fn get_doctor(&self, doctor_id: i64) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor profile: {}", doctor_id);

        self.supabase
            .select_one(&format!("doctors?id=eq.{}&select={}", doctor_id, DOCTOR_SELECT))
            .await?
            .ok_or(DoctorError::NotFound)
    }

    pub async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Doctor>, DoctorError> {
        Ok(self
            .supabase
            .select_one(&format!("doctors?user_id=eq.{}&select={}", user_id, DOCTOR_SELECT))
            .await?)
    }

    /// The signed-in doctor's own profile.
    pub async fn profile_for(&self, user: &User) -> Result<Doctor, DoctorError> {
        self.find_by_user_id(user.id)
            .await?
            .ok_or(DoctorError::ProfileMissing)
    }

    /// Every doctor, active or not, for the admin roster.
    pub async fn list_doctors(&self, filters: &DoctorSearchFilters) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Listing doctors with filters: {:?}", filters);

        let doctors: Vec<Doctor> = self
            .supabase
            .select(&format!("doctors?select={}&order=id.asc", DOCTOR_SELECT))
            .await?;

        Ok(doctors.into_iter().filter(|d| filters.matches(d)).collect())
    }

    /// Doctors whose account is active, optionally narrowed by department and search text.
    pub async fn list_active_doctors(
        &self,
        filters: &DoctorSearchFilters,
    ) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Listing active doctors with filters: {:?}", filters);

        let mut path = format!(
            "doctors?select={}&user.is_active=eq.true&order=id.asc",
            ACTIVE_DOCTOR_SELECT
        );
        if let Some(department_id) = filters.department_id {
            path.push_str(&format!("&department_id=eq.{}", department_id));
        }

        let doctors: Vec<Doctor> = self.supabase.select(&path).await?;

        Ok(doctors
            .into_iter()
            .filter(|d| d.is_active() && filters.matches(d))
            .collect())
    }

    pub async fn update_doctor(
        &self,
        doctor_id: i64,
        request: UpdateDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        debug!("Updating doctor profile: {}", doctor_id);

        let doctor = self.get_doctor(doctor_id).await?;

        if let Some(ref name) = request.name {
            validation::validate_name(name).map_err(DoctorError::Validation)?;
        }
        if let Some(ref email) = request.email {
            validation::validate_email(email).map_err(DoctorError::Validation)?;
            if self.users.email_in_use(email, Some(doctor.user_id)).await? {
                return Err(DoctorError::EmailInUse {
                    email: email.clone(),
                });
            }
        }
        if let Some(department_id) = request.department_id {
            self.ensure_department(department_id).await?;
        }

        if request.name.is_some() || request.email.is_some() {
            self.users
                .update_profile(doctor.user_id, request.name.as_deref(), request.email.as_deref())
                .await?;
        }

        match request.department_id {
            Some(department_id) if department_id != doctor.department_id => {
                let mut rows: Vec<Doctor> = self
                    .supabase
                    .update(
                        &format!("doctors?id=eq.{}&select={}", doctor_id, DOCTOR_SELECT),
                        json!({ "department_id": department_id }),
                    )
                    .await?;
                if rows.is_empty() {
                    return Err(DoctorError::NotFound);
                }
                Ok(rows.swap_remove(0))
            }
            _ => self.get_doctor(doctor_id).await,
        }
    }

    /// Activate or deactivate a doctor's account by user id.
    pub async fn set_doctor_active(&self, user_id: i64, active: bool) -> Result<User, DoctorError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DoctorError::UserNotFound)?;

        if user.role != Role::Doctor {
            return Err(DoctorError::NotADoctor);
        }

        let updated = self.users.set_active(user_id, active).await?;
        info!("Doctor account {} active={}", user_id, active);
        Ok(updated.into())
    }

    /// Soft delete used by the JSON API: the account is deactivated, rows are kept.
    pub async fn deactivate_doctor(&self, doctor_id: i64) -> Result<User, DoctorError> {
        let doctor = self.get_doctor(doctor_id).await?;
        self.set_doctor_active(doctor.user_id, false).await
    }

    pub async fn count_doctors(&self) -> Result<usize, DoctorError> {
        Ok(self.supabase.count("doctors", None).await?)
    }

    async fn ensure_department(&self, department_id: i64) -> Result<(), DoctorError> {
        match self.departments.get_department(department_id).await? {
            Some(_) => Ok(()),
            None => Err(DoctorError::DepartmentNotFound(department_id)),
        }
    }
}
