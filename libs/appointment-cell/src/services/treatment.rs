use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use tracing::debug;

use shared_database::SupabaseClient;

use crate::models::{NewTreatment, Treatment};

pub struct TreatmentService {
    supabase: Arc<SupabaseClient>,
}

impl TreatmentService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn create(&self, appointment_id: i64, treatment: &NewTreatment) -> Result<Treatment> {
        debug!("Saving treatment for appointment {}", appointment_id);
        self.supabase
            .insert(
                "treatments",
                json!({
                    "appointment_id": appointment_id,
                    "diagnosis": treatment.diagnosis,
                    "prescription": treatment.prescription,
                    "notes": treatment.notes
                }),
            )
            .await
    }

    pub async fn for_appointment(&self, appointment_id: i64) -> Result<Option<Treatment>> {
        self.supabase
            .select_one(&format!("treatments?appointment_id=eq.{}", appointment_id))
            .await
    }

    pub async fn delete(&self, treatment_id: i64) -> Result<()> {
        debug!("Deleting treatment {}", treatment_id);
        self.supabase
            .delete(&format!("treatments?id=eq.{}", treatment_id))
            .await?;
        Ok(())
    }
}
