use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tracing::{debug, info, warn};

use doctor_cell::{Doctor, DoctorService};
use patient_cell::{Patient, PatientService};
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::User;
use shared_utils::validation;

use crate::models::{
    partition_by_date, Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest,
    CompleteAppointmentRequest, DoctorDashboard, PatientAppointments, DOCTOR_VIEW_SELECT,
    HISTORY_SELECT, PATIENT_VIEW_SELECT, TIME_STORE_FORMAT,
};
use crate::services::conflict::{is_constraint_violation, ConflictService};
use crate::services::treatment::TreatmentService;

pub struct AppointmentService {
    supabase: Arc<SupabaseClient>,
    conflicts: ConflictService,
    treatments: TreatmentService,
    doctors: DoctorService,
    patients: PatientService,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self {
            conflicts: ConflictService::new(Arc::clone(&supabase)),
            treatments: TreatmentService::new(Arc::clone(&supabase)),
            doctors: DoctorService::with_client(Arc::clone(&supabase)),
            patients: PatientService::with_client(Arc::clone(&supabase)),
            supabase,
        }
    }

    // ==============================================================================
    // BOOKING
    // ==============================================================================

    /// Doctor shown on the booking page; inactive doctors cannot be booked.
    pub async fn bookable_doctor(&self, doctor_id: i64) -> Result<Doctor, AppointmentError> {
        let doctor = self
            .doctors
            .get_doctor(doctor_id)
            .await
            .map_err(|e| match e {
                doctor_cell::DoctorError::NotFound => AppointmentError::DoctorUnavailable,
                other => other.into(),
            })?;

        if !doctor.is_active() {
            return Err(AppointmentError::DoctorUnavailable);
        }
        Ok(doctor)
    }

    pub async fn book(
        &self,
        user: &User,
        doctor_id: i64,
        request: BookAppointmentRequest,
        today: NaiveDate,
    ) -> Result<(Appointment, Doctor), AppointmentError> {
        debug!("User {} booking doctor {}", user.id, doctor_id);

        let doctor = self.bookable_doctor(doctor_id).await?;

        let date = validation::parse_date(&request.date).map_err(AppointmentError::Validation)?;
        validation::validate_booking_date(date, today).map_err(|_| AppointmentError::PastDate)?;
        let time = validation::parse_time(&request.time).map_err(AppointmentError::Validation)?;

        self.conflicts.ensure_slot_free(doctor.id, date, time).await?;

        let patient = self.patients.profile_for(user).await?;

        let inserted = self
            .supabase
            .insert::<Appointment>(
                "appointments",
                json!({
                    "patient_id": patient.id,
                    "doctor_id": doctor.id,
                    "appointment_date": date.format("%Y-%m-%d").to_string(),
                    "appointment_time": time.format(TIME_STORE_FORMAT).to_string(),
                    "status": AppointmentStatus::Booked
                }),
            )
            .await;

        let appointment = match inserted {
            Ok(appointment) => appointment,
            Err(e) if is_constraint_violation(&e) => {
                warn!("Slot for doctor {} on {} at {} taken concurrently", doctor.id, date, time);
                return Err(AppointmentError::SlotTaken);
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "Appointment {} booked: patient {} with doctor {} on {} at {}",
            appointment.id, patient.id, doctor.id, date, time
        );
        Ok((appointment, doctor))
    }

    // ==============================================================================
    // DOCTOR SIDE
    // ==============================================================================

    pub async fn doctor_dashboard(
        &self,
        doctor_id: i64,
        today: NaiveDate,
    ) -> Result<DoctorDashboard, AppointmentError> {
        debug!("Loading dashboard for doctor {}", doctor_id);

        let day = today.format("%Y-%m-%d").to_string();
        let todays = format!(
            "appointments?select={}&doctor_id=eq.{}&appointment_date=eq.{}&status=eq.Booked&order=appointment_time.asc",
            DOCTOR_VIEW_SELECT, doctor_id, day
        );
        let upcoming = format!(
            "appointments?select={}&doctor_id=eq.{}&appointment_date=gt.{}&status=eq.Booked&order=appointment_date.asc,appointment_time.asc",
            DOCTOR_VIEW_SELECT, doctor_id, day
        );
        let completed = format!(
            "appointments?select={}&doctor_id=eq.{}&status=eq.Completed&order=appointment_date.desc",
            DOCTOR_VIEW_SELECT, doctor_id
        );

        let (todays_appointments, upcoming_appointments, completed_appointments) = futures::try_join!(
            self.supabase.select::<Appointment>(&todays),
            self.supabase.select::<Appointment>(&upcoming),
            self.supabase.select::<Appointment>(&completed),
        )?;

        Ok(DoctorDashboard {
            todays_appointments,
            upcoming_appointments,
            completed_appointments,
        })
    }

    /// Appointment that the given doctor is allowed to act on.
    async fn owned_by_doctor(
        &self,
        doctor_id: i64,
        appointment_id: i64,
    ) -> Result<Appointment, AppointmentError> {
        let appointment: Appointment = self
            .supabase
            .select_one(&format!(
                "appointments?id=eq.{}&select={}",
                appointment_id, DOCTOR_VIEW_SELECT
            ))
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if appointment.doctor_id != doctor_id {
            warn!(
                "Doctor {} tried to modify appointment {} of doctor {}",
                doctor_id, appointment_id, appointment.doctor_id
            );
            return Err(AppointmentError::NotYourAppointment);
        }
        Ok(appointment)
    }

    /// Moves a booked appointment to `status`. The status filter makes a
    /// concurrent change show up as an empty result.
    async fn transition_from_booked(
        &self,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> anyhow::Result<Option<Appointment>> {
        let mut rows: Vec<Appointment> = self
            .supabase
            .update(
                &format!(
                    "appointments?id=eq.{}&status=eq.{}&select={}",
                    appointment_id,
                    AppointmentStatus::Booked,
                    DOCTOR_VIEW_SELECT
                ),
                json!({ "status": status }),
            )
            .await?;

        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows.swap_remove(0)))
    }

    /// Save treatment notes and mark the appointment completed. The treatment
    /// row is removed again if the status change does not go through.
    pub async fn complete(
        &self,
        doctor_id: i64,
        appointment_id: i64,
        request: CompleteAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.owned_by_doctor(doctor_id, appointment_id).await?;
        if !appointment.is_booked() {
            return Err(AppointmentError::NotBooked(appointment.status));
        }

        let new_treatment = request.into_treatment()?;
        let treatment = self.treatments.create(appointment_id, &new_treatment).await?;

        let outcome = self
            .transition_from_booked(appointment_id, AppointmentStatus::Completed)
            .await;

        match outcome {
            Ok(Some(completed)) => {
                info!("Appointment {} completed by doctor {}", appointment_id, doctor_id);
                Ok(completed)
            }
            Ok(None) => {
                self.discard_treatment(treatment.id).await;
                Err(AppointmentError::NotBooked(appointment.status))
            }
            Err(e) => {
                self.discard_treatment(treatment.id).await;
                Err(e.into())
            }
        }
    }

    async fn discard_treatment(&self, treatment_id: i64) {
        if let Err(e) = self.treatments.delete(treatment_id).await {
            warn!("Could not remove treatment {}: {}", treatment_id, e);
        }
    }

    pub async fn cancel(
        &self,
        doctor_id: i64,
        appointment_id: i64,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.owned_by_doctor(doctor_id, appointment_id).await?;
        if !appointment.is_booked() {
            return Err(AppointmentError::CannotCancel(appointment.status));
        }

        let cancelled = self
            .transition_from_booked(appointment_id, AppointmentStatus::Cancelled)
            .await?
            .ok_or(AppointmentError::CannotCancel(appointment.status))?;

        info!("Appointment {} cancelled by doctor {}", appointment_id, doctor_id);
        Ok(cancelled)
    }

    /// Completed appointments with treatment notes, newest first.
    pub async fn patient_history(
        &self,
        patient_id: i64,
    ) -> Result<(Patient, Vec<Appointment>), AppointmentError> {
        let patient = self.patients.get_patient(patient_id).await?;

        let history = self
            .supabase
            .select::<Appointment>(&format!(
                "appointments?select={}&patient_id=eq.{}&status=eq.Completed&order=appointment_date.desc,appointment_time.desc",
                HISTORY_SELECT, patient_id
            ))
            .await?;

        Ok((patient, history))
    }

    // ==============================================================================
    // PATIENT SIDE
    // ==============================================================================

    pub async fn patient_appointments(
        &self,
        patient_id: i64,
        today: NaiveDate,
    ) -> Result<PatientAppointments, AppointmentError> {
        debug!("Loading appointments for patient {}", patient_id);

        let all = self
            .supabase
            .select::<Appointment>(&format!(
                "appointments?select={}&patient_id=eq.{}&order=appointment_date.desc,appointment_time.desc",
                PATIENT_VIEW_SELECT, patient_id
            ))
            .await?;

        let (upcoming_appointments, past_appointments) = partition_by_date(all, today);
        Ok(PatientAppointments {
            upcoming_appointments,
            past_appointments,
        })
    }

    /// A patient's own appointment together with its treatment notes.
    pub async fn treatment_for_patient(
        &self,
        patient_id: i64,
        appointment_id: i64,
    ) -> Result<Appointment, AppointmentError> {
        let appointment: Appointment = self
            .supabase
            .select_one(&format!(
                "appointments?id=eq.{}&select={}",
                appointment_id, PATIENT_VIEW_SELECT
            ))
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if appointment.patient_id != patient_id {
            warn!(
                "Patient {} tried to view appointment {} of patient {}",
                patient_id, appointment_id, appointment.patient_id
            );
            return Err(AppointmentError::ViewForbidden);
        }

        if appointment.treatment.is_some() {
            return Ok(appointment);
        }

        // Fall back to a direct lookup when the embed was not resolved.
        match self.treatments.for_appointment(appointment_id).await? {
            Some(treatment) => Ok(Appointment {
                treatment: Some(treatment),
                ..appointment
            }),
            None => Err(AppointmentError::TreatmentUnavailable),
        }
    }

    pub async fn count_appointments(&self) -> Result<usize, AppointmentError> {
        Ok(self.supabase.count("appointments", None).await?)
    }
}
