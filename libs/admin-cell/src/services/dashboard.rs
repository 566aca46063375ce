use std::sync::Arc;

use futures::TryFutureExt;
use tracing::debug;

use appointment_cell::AppointmentService;
use doctor_cell::DoctorService;
use patient_cell::PatientService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{AdminError, DashboardStats};

pub struct AdminService {
    doctors: DoctorService,
    patients: PatientService,
    appointments: AppointmentService,
}

impl AdminService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            doctors: DoctorService::with_client(Arc::clone(&supabase)),
            patients: PatientService::with_client(Arc::clone(&supabase)),
            appointments: AppointmentService::with_client(supabase),
        }
    }

    /// Row counts for the admin landing page, fetched concurrently.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AdminError> {
        debug!("Collecting admin dashboard counts");

        let (doctor_count, patient_count, appointment_count) = futures::try_join!(
            self.doctors.count_doctors().err_into::<AdminError>(),
            self.patients.count_patients().err_into::<AdminError>(),
            self.appointments.count_appointments().err_into::<AdminError>(),
        )?;

        Ok(DashboardStats {
            doctor_count,
            patient_count,
            appointment_count,
        })
    }
}
