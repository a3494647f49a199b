pub mod otp;
pub mod password;
pub mod redact;
pub mod reset;

pub use otp::{generate_numeric_otp, sha256_hex, OTP_LENGTH};
pub use password::{hash_password, verify_password, Password};
pub use redact::redact_sensitive;
pub use reset::{build_reset_url, generate_reset_token};
