pub mod dashboard;
pub mod seed;

pub use dashboard::AdminService;
pub use seed::{SeedReport, SeedService};
