use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;
use tracing::{debug, warn};

use shared_database::SupabaseClient;

use crate::models::{AppointmentError, AppointmentStatus, TIME_STORE_FORMAT};

/// Guards the one-live-appointment-per-slot rule for a doctor.
///
/// The check and the following insert are separate requests, so two patients
/// can still race for the same slot. Where the database carries a unique index on
/// `(doctor_id, appointment_date, appointment_time) WHERE status <> 'Cancelled'`,
/// its constraint error is reported as [`AppointmentError::SlotTaken`] too.
pub struct ConflictService {
    supabase: Arc<SupabaseClient>,
}

impl ConflictService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn is_slot_taken(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<bool, AppointmentError> {
        debug!("Checking slot for doctor {} on {} at {}", doctor_id, date, time);

        let path = format!(
            "appointments?select=id&doctor_id=eq.{}&appointment_date=eq.{}&appointment_time=eq.{}&status=neq.{}&limit=1",
            doctor_id,
            date.format("%Y-%m-%d"),
            time.format(TIME_STORE_FORMAT),
            AppointmentStatus::Cancelled
        );
        let existing: Vec<Value> = self.supabase.select(&path).await?;

        Ok(!existing.is_empty())
    }

    pub async fn ensure_slot_free(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<(), AppointmentError> {
        if self.is_slot_taken(doctor_id, date, time).await? {
            warn!("Slot conflict for doctor {} on {} at {}", doctor_id, date, time);
            return Err(AppointmentError::SlotTaken);
        }
        Ok(())
    }
}

/// True when a store error came from a uniqueness constraint.
pub fn is_constraint_violation(err: &anyhow::Error) -> bool {
    err.to_string().starts_with("Constraint violation")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_utils::test_utils::TestConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> ConflictService {
        let config = TestConfig::with_store(&server.uri()).to_app_config();
        ConflictService::new(Arc::new(SupabaseClient::new(&config)))
    }

    #[tokio::test]
    async fn cancelled_appointments_do_not_block_the_slot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/appointments"))
            .and(query_param("doctor_id", "eq.4"))
            .and(query_param("appointment_date", "eq.2030-01-15"))
            .and(query_param("appointment_time", "eq.10:30:00"))
            .and(query_param("status", "neq.Cancelled"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let date = NaiveDate::from_ymd_opt(2030, 1, 15).unwrap();
        let time = NaiveTime::from_hms_opt(10, 30, 0).unwrap();
        assert!(service(&server).ensure_slot_free(4, date, time).await.is_ok());
    }

    #[tokio::test]
    async fn live_appointment_blocks_the_slot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/appointments"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "id": 12 }])),
            )
            .mount(&server)
            .await;

        let date = NaiveDate::from_ymd_opt(2030, 1, 15).unwrap();
        let time = NaiveTime::from_hms_opt(10, 30, 0).unwrap();
        assert_matches!(
            service(&server).ensure_slot_free(4, date, time).await,
            Err(AppointmentError::SlotTaken)
        );
    }

    #[test]
    fn recognises_constraint_errors() {
        assert!(is_constraint_violation(&anyhow::anyhow!(
            "Constraint violation: duplicate key value"
        )));
        assert!(!is_constraint_violation(&anyhow::anyhow!("API error (500): boom")));
    }
}
