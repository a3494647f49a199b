//! Society aggregate: the tenant document, with society admins embedded as
//! an array of subdocuments (their lifecycle is tied to the parent).

use chrono::{DateTime, Duration, Utc};
use mongodb::bson;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::sha256_hex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocietyStatus {
    Active,
    Inactive,
    Trial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminStatus {
    Active,
    Inactive,
}

impl AdminStatus {
    pub fn toggled(self) -> Self {
        match self {
            AdminStatus::Active => AdminStatus::Inactive,
            AdminStatus::Inactive => AdminStatus::Active,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminStatus::Active => "Active",
            AdminStatus::Inactive => "Inactive",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub unit_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wing {
    pub wing_name: String,
    pub total_units: i32,
    #[serde(default)]
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gate {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engagement {
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub end_date: DateTime<Utc>,
    pub base_rate: f64,
    pub gst: f64,
    pub total: f64,
}

/// Society admin, embedded in its parent society. Email and mobile are
/// globally unique across all societies; the store-level uniqueness check
/// runs before any insert or update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocietyAdmin {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub status: AdminStatus,
    pub password_hash: Option<String>,
    pub reset_token_hash: Option<String>,
    pub reset_token_expires_at: Option<bson::DateTime>,
    pub otp_hash: Option<String>,
    pub otp_expires_at: Option<bson::DateTime>,
    pub otp_verified_at: Option<bson::DateTime>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl SocietyAdmin {
    pub fn new(name: String, email: String, mobile: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email: email.trim().to_lowercase(),
            mobile,
            status: AdminStatus::Active,
            password_hash: None,
            reset_token_hash: None,
            reset_token_expires_at: None,
            otp_hash: None,
            otp_expires_at: None,
            otp_verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AdminStatus::Active
    }

    pub fn set_reset_token(&mut self, token_digest: String, ttl_seconds: i64) {
        let now = Utc::now();
        self.reset_token_hash = Some(token_digest);
        self.reset_token_expires_at =
            Some(bson::DateTime::from_chrono(now + Duration::seconds(ttl_seconds)));
        self.updated_at = now;
    }

    /// Same redemption predicate as the super-admin token: missing,
    /// mismatched, and expired digests are one undifferentiated miss.
    pub fn reset_token_matches(&self, token_digest: &str) -> bool {
        let (Some(stored), Some(expires_at)) = (&self.reset_token_hash, self.reset_token_expires_at)
        else {
            return false;
        };
        stored == token_digest && Utc::now() < expires_at.to_chrono()
    }

    pub fn complete_password_reset(&mut self, new_password_hash: String) {
        self.password_hash = Some(new_password_hash);
        self.reset_token_hash = None;
        self.reset_token_expires_at = None;
        self.updated_at = Utc::now();
    }

    /// Same overwrite-and-clear OTP lifecycle as end users; used for admin
    /// verification flows.
    pub fn set_otp(&mut self, code: &str, ttl_seconds: i64) {
        let now = Utc::now();
        self.otp_hash = Some(sha256_hex(code));
        self.otp_expires_at = Some(bson::DateTime::from_chrono(now + Duration::seconds(ttl_seconds)));
        self.updated_at = now;
    }

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
            self.updated_at = now;
        }

        valid
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Society {
    #[serde(rename = "_id")]
    pub id: String,
    pub society_name: String,
    pub society_pin: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: SocietyStatus,
    /// Day of month the maintenance payment falls due.
    pub maintenance_due_date: i32,
    pub notes: Option<String>,
    #[serde(default)]
    pub structure: Vec<Wing>,
    #[serde(default)]
    pub entry_gates: Vec<Gate>,
    #[serde(default)]
    pub exit_gates: Vec<Gate>,
    #[serde(default)]
    pub society_admins: Vec<SocietyAdmin>,
    pub engagement: Option<Engagement>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Society {
    pub fn admin(&self, admin_id: &str) -> Option<&SocietyAdmin> {
        self.society_admins.iter().find(|a| a.id == admin_id)
    }

    pub fn admin_mut(&mut self, admin_id: &str) -> Option<&mut SocietyAdmin> {
        self.society_admins.iter_mut().find(|a| a.id == admin_id)
    }

    pub fn admin_by_email(&self, email: &str) -> Option<&SocietyAdmin> {
        let email = email.trim().to_lowercase();
        self.society_admins.iter().find(|a| a.email == email)
    }

    pub fn admin_by_email_mut(&mut self, email: &str) -> Option<&mut SocietyAdmin> {
        let email = email.trim().to_lowercase();
        self.society_admins.iter_mut().find(|a| a.email == email)
    }

    pub fn toggle_status(&mut self) {
        self.status = match self.status {
            SocietyStatus::Active => SocietyStatus::Inactive,
            SocietyStatus::Inactive | SocietyStatus::Trial => SocietyStatus::Active,
        };
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_status_toggles_both_ways() {
        assert_eq!(AdminStatus::Active.toggled(), AdminStatus::Inactive);
        assert_eq!(AdminStatus::Inactive.toggled(), AdminStatus::Active);
    }

    #[test]
    fn admin_otp_is_single_use() {
        let mut admin = SocietyAdmin::new(
            "Ravi".to_string(),
            "ravi@example.com".to_string(),
            "9991112222".to_string(),
        );
        admin.set_otp("1234", 300);
        assert!(admin.verify_otp("1234"));
        assert!(!admin.verify_otp("1234"));
        assert!(admin.otp_verified_at.is_some());
    }

    #[test]
    fn admin_reset_token_is_single_use() {
        let mut admin = SocietyAdmin::new(
            "Ravi".to_string(),
            "ravi@example.com".to_string(),
            "9991112222".to_string(),
        );
        admin.set_reset_token("digest".to_string(), 3600);
        assert!(admin.reset_token_matches("digest"));

        admin.complete_password_reset("new-hash".to_string());
        assert!(!admin.reset_token_matches("digest"));
        assert_eq!(admin.password_hash.as_deref(), Some("new-hash"));
    }

    #[test]
    fn admin_email_lookup_is_case_insensitive() {
        let mut society_admins = vec![SocietyAdmin::new(
            "Ravi".to_string(),
            "Ravi@Example.com".to_string(),
            "9991112222".to_string(),
        )];
        society_admins[0].status = AdminStatus::Active;
        let now = Utc::now();
        let society = Society {
            id: "s1".to_string(),
            society_name: "Green Acres".to_string(),
            society_pin: "411001".to_string(),
            address: "MG Road".to_string(),
            city: "Pune".to_string(),
            country: "India".to_string(),
            latitude: None,
            longitude: None,
            status: SocietyStatus::Active,
            maintenance_due_date: 5,
            notes: None,
            structure: vec![],
            entry_gates: vec![],
            exit_gates: vec![],
            society_admins,
            engagement: None,
            created_at: now,
            updated_at: now,
        };

        assert!(society.admin_by_email("RAVI@example.COM").is_some());
        assert!(society.admin_by_email("other@example.com").is_none());
    }
}
