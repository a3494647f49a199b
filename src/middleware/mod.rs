pub mod auth;
pub mod error_capture;

pub use auth::{require_admin, require_society_admin, require_user, AuthPrincipal, Principal};
pub use error_capture::capture_errors;
