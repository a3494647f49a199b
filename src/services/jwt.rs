//! Stateless bearer-token minting and checking.
//!
//! Tokens are HS256-signed with the server-side secret and carry identity
//! plus a role claim; every validation failure collapses into the single
//! public error "Invalid or expired token" so callers can never tell which
//! check rejected them.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::error::AppError;
use crate::models::UserRole;

pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";

/// Closed set of principal roles. Dispatch on this enum decides how a
/// validated claim is re-resolved: `Fixed` is matched against configuration
/// alone, every other variant is re-fetched from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Fixed administrative account (single configured principal).
    #[serde(rename = "admin")]
    Fixed,
    SuperAdmin,
    SocietyAdmin,
    Member,
    Visitor,
    Guard,
}

impl Role {
    pub fn is_admin_tier(self) -> bool {
        matches!(self, Role::Fixed | Role::SuperAdmin)
    }

    pub fn is_user_tier(self) -> bool {
        matches!(self, Role::Member | Role::Visitor | Role::Guard)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Fixed => "admin",
            Role::SuperAdmin => "super_admin",
            Role::SocietyAdmin => "society_admin",
            Role::Member => "member",
            Role::Visitor => "visitor",
            Role::Guard => "guard",
        }
    }
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Member => Role::Member,
            UserRole::Visitor => Role::Visitor,
            UserRole::Guard => Role::Guard,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject id. Absent for the fixed principal, which has no store
    /// identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_days: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            token_expiry_days: config.token_expiry_days,
        }
    }

    /// Mint a token for the given identity with the fixed validity window.
    pub fn issue(&self, sub: Option<&str>, email: &str, role: Role) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.map(str::to_string),
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + Duration::days(self.token_expiry_days)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode token: {e}")))
    }

    /// Verify signature and expiry. Signature mismatch, malformed input,
    /// and expiry all yield the same authentication error.
    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Authentication(INVALID_TOKEN_MESSAGE.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: secret.to_string(),
            token_expiry_days: 7,
        })
    }

    #[test]
    fn round_trip_preserves_identity_and_role() {
        let jwt = service("test-secret");
        let token = jwt
            .issue(Some("sa-1"), "root@example.com", Role::SuperAdmin)
            .unwrap();

        let claims = jwt.validate(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("sa-1"));
        assert_eq!(claims.email, "root@example.com");
        assert_eq!(claims.role, Role::SuperAdmin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn fixed_principal_token_has_no_subject() {
        let jwt = service("test-secret");
        let token = jwt.issue(None, "admin@society.com", Role::Fixed).unwrap();
        let claims = jwt.validate(&token).unwrap();
        assert!(claims.sub.is_none());
        assert_eq!(claims.role, Role::Fixed);
    }

    #[test]
    fn rejections_are_undifferentiated() {
        let jwt = service("test-secret");
        let other = service("another-secret");
        let token = jwt
            .issue(Some("sa-1"), "root@example.com", Role::SuperAdmin)
            .unwrap();

        let wrong_secret = other.validate(&token).unwrap_err();
        let malformed = jwt.validate("not.a.jwt").unwrap_err();

        for err in [wrong_secret, malformed] {
            match err {
                AppError::Authentication(msg) => assert_eq!(msg, INVALID_TOKEN_MESSAGE),
                other => panic!("expected authentication error, got {other:?}"),
            }
        }
    }

    #[test]
    fn expired_token_is_rejected_with_the_same_message() {
        let jwt = service("test-secret");
        let now = Utc::now();
        let claims = Claims {
            sub: Some("sa-1".to_string()),
            email: "root@example.com".to_string(),
            role: Role::SuperAdmin,
            iat: (now - Duration::days(8)).timestamp(),
            exp: (now - Duration::days(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        match jwt.validate(&token).unwrap_err() {
            AppError::Authentication(msg) => assert_eq!(msg, INVALID_TOKEN_MESSAGE),
            other => panic!("expected authentication error, got {other:?}"),
        }
    }

    #[test]
    fn role_claim_serializes_to_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Fixed).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::to_string(&Role::SuperAdmin).unwrap(),
            "\"super_admin\""
        );
        assert_eq!(serde_json::to_string(&Role::Member).unwrap(), "\"member\"");
    }
}
