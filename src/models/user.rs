//! End-user principal (member/visitor/guard) with the phone+OTP
//! registration lifecycle.
//!
//! A user owns at most one live OTP challenge; issuing a new code
//! overwrites the previous one, and only a successful verification clears
//! the stored digest. A failed or expired attempt leaves the state exactly
//! as it was, so a still-valid code survives wrong guesses and an expired
//! one lingers until the next issuance overwrites it.

use chrono::{DateTime, Duration, Utc};
use mongodb::bson;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::sha256_hex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Member,
    Visitor,
    Guard,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Member => "member",
            UserRole::Visitor => "visitor",
            UserRole::Guard => "guard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "member" => Some(UserRole::Member),
            "visitor" => Some(UserRole::Visitor),
            "guard" => Some(UserRole::Guard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    PendingOtp,
    Active,
    Blocked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::PendingOtp => "pending_otp",
            UserStatus::Active => "active",
            UserStatus::Blocked => "blocked",
        }
    }
}

/// User entity. `(phone_number, role)` is unique: the same phone may
/// register under different roles as distinct principals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub country_code: String,
    pub phone_number: String,
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub otp_hash: Option<String>,
    pub otp_expires_at: Option<bson::DateTime>,
    pub otp_verified_at: Option<bson::DateTime>,
    pub terms_accepted_at: Option<bson::DateTime>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        country_code: String,
        phone_number: String,
        password_hash: String,
        role: UserRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            country_code,
            phone_number,
            password_hash,
            role,
            status: UserStatus::PendingOtp,
            otp_hash: None,
            otp_expires_at: None,
            otp_verified_at: None,
            terms_accepted_at: Some(bson::DateTime::from_chrono(now)),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Re-run of an abandoned registration: replace the credentials and
    /// restamp the terms acceptance for the new attempt.
    pub fn refresh_pending_registration(&mut self, country_code: String, password_hash: String) {
        let now = Utc::now();
        self.country_code = country_code;
        self.password_hash = password_hash;
        self.terms_accepted_at = Some(bson::DateTime::from_chrono(now));
        self.updated_at = now;
    }

    /// Redeem a recent OTP verification for a follow-up credential change.
    /// The stamp is cleared on success so one verification authorizes at
    /// most one change; a stamp older than the window is refused and left
    /// in place as history.
    pub fn consume_otp_verification(&mut self, window_seconds: i64) -> bool {
        let Some(verified_at) = self.otp_verified_at else {
            return false;
        };

        let now = Utc::now();
        let within = now < verified_at.to_chrono() + Duration::seconds(window_seconds);
        if within {
            self.otp_verified_at = None;
            self.updated_at = now;
        }
        within
    }

    /// Store a fresh OTP challenge, overwriting any prior one. Only the
    /// digest is kept; the plaintext is the caller's to deliver.
    pub fn set_otp(&mut self, code: &str, ttl_seconds: i64) {
        let now = Utc::now();
        self.otp_hash = Some(sha256_hex(code));
        self.otp_expires_at = Some(bson::DateTime::from_chrono(now + Duration::seconds(ttl_seconds)));
        self.status = UserStatus::PendingOtp;
        self.updated_at = now;
    }

    /// Verify a candidate code against the stored challenge. Success clears
    /// the challenge (at-most-once redemption) and activates the user;
    /// failure leaves the stored state untouched.
    pub fn verify_otp(&mut self, candidate: &str) -> bool {
        let (Some(stored_hash), Some(expires_at)) = (&self.otp_hash, self.otp_expires_at) else {
            return false;
        };

        let now = Utc::now();
        let valid = sha256_hex(candidate) == *stored_hash && now < expires_at.to_chrono();

        if valid {
            self.otp_hash = None;
            self.otp_expires_at = None;
            self.otp_verified_at = Some(bson::DateTime::from_chrono(now));
            self.status = UserStatus::Active;
            self.updated_at = now;
        }

        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::generate_numeric_otp;

    fn pending_user() -> User {
        User::new(
            "+91".to_string(),
            "9998887776".to_string(),
            "$argon2id$fake".to_string(),
            UserRole::Member,
        )
    }

    #[test]
    fn fresh_user_starts_pending_with_no_challenge() {
        let user = pending_user();
        assert_eq!(user.status, UserStatus::PendingOtp);
        assert!(user.otp_hash.is_none());
        assert!(user.terms_accepted_at.is_some());
    }

    #[test]
    fn verify_without_challenge_fails_fast() {
        let mut user = pending_user();
        assert!(!user.verify_otp("1234"));
    }

    #[test]
    fn correct_code_activates_and_clears_challenge() {
        let mut user = pending_user();
        let code = generate_numeric_otp(4);
        user.set_otp(&code, 300);

        assert!(user.verify_otp(&code));
        assert_eq!(user.status, UserStatus::Active);
        assert!(user.otp_hash.is_none());
        assert!(user.otp_expires_at.is_none());
        assert!(user.otp_verified_at.is_some());

        // Replay of the consumed code fails.
        assert!(!user.verify_otp(&code));
    }

    #[test]
    fn wrong_code_leaves_challenge_intact_for_retry() {
        let mut user = pending_user();
        user.set_otp("4321", 300);

        assert!(!user.verify_otp("0000"));
        assert_eq!(user.status, UserStatus::PendingOtp);
        assert!(user.otp_hash.is_some());

        // The legitimate code still works after the wrong guess.
        assert!(user.verify_otp("4321"));
    }

    #[test]
    fn reissue_invalidates_previous_code() {
        let mut user = pending_user();
        user.set_otp("1111", 300);
        user.set_otp("2222", 300);

        assert!(!user.verify_otp("1111"));
        assert!(user.verify_otp("2222"));
    }

    #[test]
    fn refreshing_a_pending_registration_restamps_terms() {
        let mut user = pending_user();
        let stale = mongodb::bson::DateTime::from_chrono(Utc::now() - Duration::days(30));
        user.terms_accepted_at = Some(stale);

        user.refresh_pending_registration("+1".to_string(), "$argon2id$new".to_string());

        assert_eq!(user.country_code, "+1");
        assert_eq!(user.password_hash, "$argon2id$new");
        let restamped = user.terms_accepted_at.unwrap();
        assert!(restamped.to_chrono() > stale.to_chrono());
    }

    #[test]
    fn otp_verification_authorizes_one_change_within_the_window() {
        let mut user = pending_user();
        user.set_otp("1234", 300);
        assert!(user.verify_otp("1234"));

        assert!(user.consume_otp_verification(600));
        // The stamp was consumed; a second change needs a fresh code.
        assert!(!user.consume_otp_verification(600));
    }

    #[test]
    fn stale_otp_verification_is_refused_but_kept() {
        let mut user = pending_user();
        user.otp_verified_at = Some(mongodb::bson::DateTime::from_chrono(
            Utc::now() - Duration::seconds(601),
        ));

        assert!(!user.consume_otp_verification(600));
        assert!(user.otp_verified_at.is_some());
    }

    #[test]
    fn expiry_boundary_is_strict() {
        let mut user = pending_user();
        user.set_otp("5678", 300);

        // Just inside the window.
        user.otp_expires_at = Some(mongodb::bson::DateTime::from_chrono(
            Utc::now() + Duration::milliseconds(50),
        ));
        let mut clone = user.clone();
        assert!(clone.verify_otp("5678"));

        // Just past the window: correct code, but too late, and the stale
        // challenge is not cleared by the failed check.
        user.otp_expires_at = Some(mongodb::bson::DateTime::from_chrono(
            Utc::now() - Duration::milliseconds(1),
        ));
        assert!(!user.verify_otp("5678"));
        assert!(user.otp_hash.is_some());
    }
}
