pub mod availability;
pub mod department;
pub mod doctor;

pub use availability::AvailabilityService;
pub use department::DepartmentService;
pub use doctor::DoctorService;
