pub mod error_log;
pub mod society;
pub mod super_admin;
pub mod user;

pub use error_log::ErrorLog;
pub use society::{AdminStatus, Engagement, Gate, Society, SocietyAdmin, SocietyStatus, Unit, Wing};
pub use super_admin::SuperAdmin;
pub use user::{User, UserRole, UserStatus};
