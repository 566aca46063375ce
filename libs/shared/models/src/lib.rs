pub mod auth;
pub mod error;

pub use auth::{Role, User, UserRecord};
pub use error::AppError;
