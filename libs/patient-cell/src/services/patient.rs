use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::User;
use shared_utils::validation;

use crate::models::{
    Patient, PatientError, UpdatePatientProfileRequest, CONTACT_PHONE_MAX_CHARS, PATIENT_SELECT,
};

pub struct PatientService {
    supabase: Arc<SupabaseClient>,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Create the empty patient profile that goes with a new patient account.
    pub async fn create_for_user(&self, user_id: i64) -> Result<Patient, PatientError> {
        debug!("Creating patient profile for user {}", user_id);

        let patient: Patient = self
            .supabase
            .insert(
                &format!("patients?select={}", PATIENT_SELECT),
                json!({ "user_id": user_id }),
            )
            .await?;

        info!("Patient profile {} created for user {}", patient.id, user_id);
        Ok(patient)
    }

    pub async fn get_patient(&self, patient_id: i64) -> Result<Patient, PatientError> {
        debug!("Fetching patient profile: {}", patient_id);

        self.supabase
            .select_one(&format!("patients?id=eq.{}&select={}", patient_id, PATIENT_SELECT))
            .await?
            .ok_or(PatientError::NotFound)
    }

    pub async fn get_by_user_id(&self, user_id: i64) -> Result<Option<Patient>, PatientError> {
        Ok(self
            .supabase
            .select_one(&format!("patients?user_id=eq.{}&select={}", user_id, PATIENT_SELECT))
            .await?)
    }

    /// The signed-in patient's own profile.
    pub async fn profile_for(&self, user: &User) -> Result<Patient, PatientError> {
        self.get_by_user_id(user.id)
            .await?
            .ok_or(PatientError::ProfileMissing)
    }

    pub async fn list_patients(&self) -> Result<Vec<Patient>, PatientError> {
        debug!("Listing patients");
        Ok(self
            .supabase
            .select(&format!("patients?select={}&order=id.asc", PATIENT_SELECT))
            .await?)
    }

    /// Patients whose name, email or contact phone contains `q`; blank `q` returns everyone.
    pub async fn search(&self, q: Option<&str>) -> Result<Vec<Patient>, PatientError> {
        let patients = self.list_patients().await?;

        match q.map(str::trim).filter(|q| !q.is_empty()) {
            Some(needle) => {
                debug!("Filtering patients by '{}'", needle);
                Ok(patients.into_iter().filter(|p| p.matches(needle)).collect())
            }
            None => Ok(patients),
        }
    }

    pub async fn count_patients(&self) -> Result<usize, PatientError> {
        Ok(self.supabase.count("patients", None).await?)
    }

    pub async fn update_profile(
        &self,
        patient_id: i64,
        request: UpdatePatientProfileRequest,
    ) -> Result<Patient, PatientError> {
        debug!("Updating patient profile: {}", patient_id);

        let mut changes = Map::new();

        if let Some(phone) = request.contact_phone {
            let phone = phone.trim();
            if phone.chars().count() > CONTACT_PHONE_MAX_CHARS {
                return Err(PatientError::Validation(format!(
                    "Contact phone must be at most {} characters.",
                    CONTACT_PHONE_MAX_CHARS
                )));
            }
            let value = if phone.is_empty() { Value::Null } else { json!(phone) };
            changes.insert("contact_phone".to_string(), value);
        }

        if let Some(raw) = request.dob {
            let value = match raw.trim() {
                "" => Value::Null,
                raw => {
                    let dob = validation::parse_date(raw).map_err(PatientError::Validation)?;
                    check_dob(dob, Local::now().date_naive())?;
                    json!(dob.format("%Y-%m-%d").to_string())
                }
            };
            changes.insert("dob".to_string(), value);
        }

        if changes.is_empty() {
            return self.get_patient(patient_id).await;
        }

        let mut rows: Vec<Patient> = self
            .supabase
            .update(
                &format!("patients?id=eq.{}&select={}", patient_id, PATIENT_SELECT),
                Value::Object(changes),
            )
            .await?;

        if rows.is_empty() {
            return Err(PatientError::NotFound);
        }

        info!("Patient profile {} updated", patient_id);
        Ok(rows.swap_remove(0))
    }
}

fn check_dob(dob: NaiveDate, today: NaiveDate) -> Result<(), PatientError> {
    if dob > today {
        return Err(PatientError::InvalidDateOfBirth);
    }
    Ok(())
}
