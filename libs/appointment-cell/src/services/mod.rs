pub mod appointment;
pub mod conflict;
pub mod treatment;

pub use appointment::AppointmentService;
pub use conflict::ConflictService;
pub use treatment::TreatmentService;
