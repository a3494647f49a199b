//! Super-admin principal: email+password sign-in with a single-use
//! password-reset token.

use chrono::{DateTime, Duration, Utc};
use mongodb::bson;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperAdmin {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: String,
    /// Stored lowercased; lookups normalize the same way.
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub reset_token_hash: Option<String>,
    pub reset_token_expires_at: Option<bson::DateTime>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl SuperAdmin {
    pub fn new(full_name: String, email: String, password_hash: String, phone_number: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            full_name,
            email: email.trim().to_lowercase(),
            password_hash,
            phone_number,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Store a reset-token digest, overwriting any outstanding one.
    pub fn set_reset_token(&mut self, token_digest: String, ttl_seconds: i64) {
        let now = Utc::now();
        self.reset_token_hash = Some(token_digest);
        self.reset_token_expires_at =
            Some(bson::DateTime::from_chrono(now + Duration::seconds(ttl_seconds)));
        self.updated_at = now;
    }

    /// Whether a presented token digest redeems the outstanding reset
    /// token. A missing token, a digest mismatch, and an elapsed expiry
    /// are all the same miss.
    pub fn reset_token_matches(&self, token_digest: &str) -> bool {
        let (Some(stored), Some(expires_at)) = (&self.reset_token_hash, self.reset_token_expires_at)
        else {
            return false;
        };
        stored == token_digest && Utc::now() < expires_at.to_chrono()
    }

    /// Consume the reset token and install the new password hash. Called
    /// only after `reset_token_matches` has accepted the digest.
    pub fn complete_password_reset(&mut self, new_password_hash: String) {
        self.password_hash = new_password_hash;
        self.reset_token_hash = None;
        self.reset_token_expires_at = None;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized_on_creation() {
        let admin = SuperAdmin::new(
            "Asha Rao".to_string(),
            "  Asha.Rao@Example.COM ".to_string(),
            "hash".to_string(),
            "9990001111".to_string(),
        );
        assert_eq!(admin.email, "asha.rao@example.com");
    }

    #[test]
    fn reset_completion_clears_token_state() {
        let mut admin = SuperAdmin::new(
            "Asha Rao".to_string(),
            "asha@example.com".to_string(),
            "old-hash".to_string(),
            "9990001111".to_string(),
        );
        admin.set_reset_token("digest".to_string(), 3600);
        assert!(admin.reset_token_hash.is_some());
        assert!(admin.reset_token_expires_at.is_some());

        admin.complete_password_reset("new-hash".to_string());
        assert_eq!(admin.password_hash, "new-hash");
        assert!(admin.reset_token_hash.is_none());
        assert!(admin.reset_token_expires_at.is_none());
    }

    #[test]
    fn redeemed_token_cannot_be_replayed() {
        let mut admin = SuperAdmin::new(
            "Asha Rao".to_string(),
            "asha@example.com".to_string(),
            "old-hash".to_string(),
            "9990001111".to_string(),
        );
        admin.set_reset_token("digest".to_string(), 3600);
        assert!(admin.reset_token_matches("digest"));
        assert!(!admin.reset_token_matches("other-digest"));

        admin.complete_password_reset("new-hash".to_string());
        // A retry with the same token now fails: the digest is cleared.
        assert!(!admin.reset_token_matches("digest"));
    }

    #[test]
    fn expired_token_no_longer_matches() {
        let mut admin = SuperAdmin::new(
            "Asha Rao".to_string(),
            "asha@example.com".to_string(),
            "hash".to_string(),
            "9990001111".to_string(),
        );
        admin.set_reset_token("digest".to_string(), 3600);
        admin.reset_token_expires_at = Some(bson::DateTime::from_chrono(
            Utc::now() - Duration::seconds(1),
        ));
        assert!(!admin.reset_token_matches("digest"));
    }
}
