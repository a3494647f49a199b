pub mod auth;
pub mod registration;
pub mod society;
pub mod society_admin;
pub mod system;
pub mod user_auth;
