use chrono::Weekday;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use shared_models::auth::User;
use shared_models::error::AppError;

/// Doctor rows are always read with their account and department embedded.
pub const DOCTOR_SELECT: &str =
    "*,user:users(id,email,name,role,is_active),department:departments(*)";

/// Same as [`DOCTOR_SELECT`] but only keeps doctors whose account is active.
pub const ACTIVE_DOCTOR_SELECT: &str =
    "*,user:users!inner(id,email,name,role,is_active),department:departments(*)";

pub const NOT_SET: &str = "Not set";
pub const NOT_AVAILABLE: &str = "Not Available";
pub const UNREADABLE_AVAILABILITY: &str = "Could not read availability.";
pub const MAX_AVAILABILITY_TEXT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub user_id: i64,
    pub department_id: i64,
    pub availability: Option<String>,
    pub user: User,
    pub department: Department,
}

impl Doctor {
    pub fn name(&self) -> &str {
        &self.user.name
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }

    pub fn is_active(&self) -> bool {
        self.user.is_active
    }

    /// Schedule for display; an unreadable blob is reported, not hidden.
    pub fn availability_view(&self) -> AvailabilityView {
        AvailabilityView::from_blob(self.availability.as_deref())
    }

    /// Schedule used to pre-fill the edit form.
    pub fn schedule_for_form(&self) -> WeeklySchedule {
        match self.availability_view() {
            AvailabilityView::Schedule(schedule) => schedule,
            AvailabilityView::Unreadable => WeeklySchedule::not_available(),
        }
    }

    pub fn summary(&self) -> DoctorSummary {
        DoctorSummary {
            id: self.id,
            name: self.user.name.clone(),
            email: self.user.email.clone(),
            department: self.department.name.clone(),
        }
    }

    pub fn listing(&self) -> DoctorListing {
        DoctorListing {
            id: self.id,
            user_id: self.user_id,
            name: self.user.name.clone(),
            email: self.user.email.clone(),
            department_id: self.department_id,
            department: self.department.name.clone(),
            is_active: self.user.is_active,
            availability: self.availability_view(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub department: String,
}

/// Row shown in the admin roster and the patient's doctor browser.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorListing {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub department_id: i64,
    pub department: String,
    pub is_active: bool,
    pub availability: AvailabilityView,
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// A doctor's free-text weekly schedule, stored as a JSON object keyed by day name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    #[serde(rename = "Monday", default = "not_available")]
    pub monday: String,
    #[serde(rename = "Tuesday", default = "not_available")]
    pub tuesday: String,
    #[serde(rename = "Wednesday", default = "not_available")]
    pub wednesday: String,
    #[serde(rename = "Thursday", default = "not_available")]
    pub thursday: String,
    #[serde(rename = "Friday", default = "not_available")]
    pub friday: String,
    #[serde(rename = "Saturday", default = "not_available")]
    pub saturday: String,
    #[serde(rename = "Sunday", default = "not_available")]
    pub sunday: String,
}

impl WeeklySchedule {
    pub fn uniform(text: &str) -> Self {
        Self {
            monday: text.to_string(),
            tuesday: text.to_string(),
            wednesday: text.to_string(),
            thursday: text.to_string(),
            friday: text.to_string(),
            saturday: text.to_string(),
            sunday: text.to_string(),
        }
    }

    pub fn unset() -> Self {
        Self::uniform(NOT_SET)
    }

    pub fn not_available() -> Self {
        Self::uniform(NOT_AVAILABLE)
    }

    pub fn from_blob(blob: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(blob)
    }

    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn for_weekday(&self, day: Weekday) -> &str {
        match day {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AvailabilityView {
    Schedule(WeeklySchedule),
    Unreadable,
}

impl AvailabilityView {
    pub fn from_blob(blob: Option<&str>) -> Self {
        match blob.map(str::trim) {
            None | Some("") => AvailabilityView::Schedule(WeeklySchedule::unset()),
            Some(raw) => match WeeklySchedule::from_blob(raw) {
                Ok(schedule) => AvailabilityView::Schedule(schedule),
                Err(e) => {
                    tracing::warn!("Unreadable availability blob: {}", e);
                    AvailabilityView::Unreadable
                }
            },
        }
    }
}

impl Serialize for AvailabilityView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AvailabilityView::Schedule(schedule) => schedule.serialize(serializer),
            AvailabilityView::Unreadable => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Error", UNREADABLE_AVAILABILITY)?;
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub monday: Option<String>,
    pub tuesday: Option<String>,
    pub wednesday: Option<String>,
    pub thursday: Option<String>,
    pub friday: Option<String>,
    pub saturday: Option<String>,
    pub sunday: Option<String>,
}

impl UpdateAvailabilityRequest {
    /// Blank or missing days become "Not Available".
    pub fn into_schedule(self) -> Result<WeeklySchedule, DoctorError> {
        fn day(value: Option<String>, label: &str) -> Result<String, DoctorError> {
            let text = value.as_deref().map(str::trim).unwrap_or_default();
            if text.is_empty() {
                return Ok(NOT_AVAILABLE.to_string());
            }
            if text.chars().count() > MAX_AVAILABILITY_TEXT {
                return Err(DoctorError::Validation(format!(
                    "{} availability must be at most {} characters.",
                    label, MAX_AVAILABILITY_TEXT
                )));
            }
            Ok(text.to_string())
        }

        Ok(WeeklySchedule {
            monday: day(self.monday, "Monday")?,
            tuesday: day(self.tuesday, "Tuesday")?,
            wednesday: day(self.wednesday, "Wednesday")?,
            thursday: day(self.thursday, "Thursday")?,
            friday: day(self.friday, "Friday")?,
            saturday: day(self.saturday, "Saturday")?,
            sunday: day(self.sunday, "Sunday")?,
        })
    }
}

/// Roster filter: `q` matches doctor or department name, case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct DoctorSearchFilters {
    pub q: Option<String>,
    pub department_id: Option<i64>,
}

impl DoctorSearchFilters {
    pub fn search(q: Option<String>) -> Self {
        Self {
            q,
            department_id: None,
        }
    }

    pub fn needle(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, doctor: &Doctor) -> bool {
        if let Some(department_id) = self.department_id {
            if doctor.department_id != department_id {
                return false;
            }
        }

        match self.needle() {
            Some(needle) => {
                doctor.user.name.to_lowercase().contains(&needle)
                    || doctor.department.name.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub department_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department_id: Option<i64>,
}

/// Body of `POST /api/doctors`; fields are optional so that a missing one is
/// a 400 with a clear message rather than an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiCreateDoctorRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub department_id: Option<i64>,
}

impl ApiCreateDoctorRequest {
    pub fn into_complete(self) -> Option<CreateDoctorRequest> {
        Some(CreateDoctorRequest {
            name: self.name?,
            email: self.email?,
            password: self.password?,
            department_id: self.department_id?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Doctor not found or is inactive.")]
    Inactive,

    #[error("User not found")]
    UserNotFound,

    #[error("This user is not a doctor.")]
    NotADoctor,

    #[error("Could not find your doctor profile.")]
    ProfileMissing,

    #[error("Email {email} is already in use")]
    EmailInUse { email: String },

    #[error("Department {0} does not exist.")]
    DepartmentNotFound(i64),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for DoctorError {
    fn from(err: anyhow::Error) -> Self {
        DoctorError::Database(err.to_string())
    }
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound
            | DoctorError::Inactive
            | DoctorError::UserNotFound
            | DoctorError::ProfileMissing => AppError::NotFound(err.to_string()),
            DoctorError::NotADoctor | DoctorError::DepartmentNotFound(_) => {
                AppError::BadRequest(err.to_string())
            }
            DoctorError::EmailInUse { .. } => AppError::Conflict(
                "That email is already in use. Please choose a different one.".to_string(),
            ),
            DoctorError::Validation(msg) => AppError::ValidationError(msg),
            DoctorError::Database(msg) => AppError::Database(msg),
        }
    }
}
