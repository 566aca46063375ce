use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{Doctor, DoctorError, WeeklySchedule, DOCTOR_SELECT};

pub struct AvailabilityService {
    supabase: Arc<SupabaseClient>,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// The saved schedule as the edit form shows it.
    pub async fn get_schedule(&self, doctor_id: i64) -> Result<WeeklySchedule, DoctorError> {
        debug!("Loading availability for doctor {}", doctor_id);

        let doctor: Doctor = self
            .supabase
            .select_one(&format!("doctors?id=eq.{}&select={}", doctor_id, DOCTOR_SELECT))
            .await?
            .ok_or(DoctorError::NotFound)?;

        Ok(doctor.schedule_for_form())
    }

    /// Replace the doctor's weekly schedule blob.
    pub async fn update_schedule(
        &self,
        doctor_id: i64,
        schedule: &WeeklySchedule,
    ) -> Result<Doctor, DoctorError> {
        debug!("Updating availability for doctor {}", doctor_id);

        let blob = schedule
            .to_blob()
            .map_err(|e| DoctorError::Validation(e.to_string()))?;

        let mut rows: Vec<Doctor> = self
            .supabase
            .update(
                &format!("doctors?id=eq.{}&select={}", doctor_id, DOCTOR_SELECT),
                json!({ "availability": blob }),
            )
            .await?;

        if rows.is_empty() {
            return Err(DoctorError::NotFound);
        }

        info!("Availability updated for doctor {}", doctor_id);
        Ok(rows.swap_remove(0))
    }
}
