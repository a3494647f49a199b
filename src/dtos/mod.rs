//! Wire DTOs: inbound request shapes with declarative validation, outbound
//! views that hide credential state, and the success envelope.
//!
//! The JSON surface is camelCase; storage stays snake_case. Views exist so
//! password hashes, OTP digests, and reset-token digests can never leak
//! through a response, and so timestamps go out as RFC 3339 strings.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::models::{
    Engagement, Gate, Society, SocietyAdmin, SocietyStatus, SuperAdmin, Unit, User, Wing,
};

// ==================== Envelope ====================

#[derive(Debug, Serialize)]
pub struct ApiSuccess<T: Serialize> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            token: None,
        }
    }

    pub fn with_data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }
}

// ==================== Validating extractor ====================

/// `Json<T>` that funnels both deserialization failures and declarative
/// validation failures into the uniform error envelope.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: serde::de::DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

// ==================== /api/auth requests ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 7, max = 15, message = "A valid phone number is required"))]
    pub phone_number: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

// ==================== /api/registration requests ====================

fn default_country_code() -> String {
    "+91".to_string()
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStartRequest {
    #[serde(default = "default_country_code")]
    pub country_code: String,
    #[validate(length(min = 7, max = 15, message = "A valid phone number is required"))]
    pub phone_number: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub terms_accepted: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[validate(length(min = 1, message = "User id is required"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "OTP is required"))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResendOtpRequest {
    #[validate(length(min = 1, message = "User id is required"))]
    pub user_id: String,
}

// ==================== /api/user-auth requests ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserLoginRequest {
    #[serde(default = "default_country_code")]
    pub country_code: String,
    #[validate(length(min = 7, max = 15, message = "A valid phone number is required"))]
    pub phone_number: String,
    pub role: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserForgotPasswordRequest {
    #[serde(default = "default_country_code")]
    pub country_code: String,
    #[validate(length(min = 7, max = 15, message = "A valid phone number is required"))]
    pub phone_number: String,
    pub role: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserResetPasswordRequest {
    #[validate(length(min = 1, message = "User id is required"))]
    pub user_id: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

// ==================== /api/society requests ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UnitInput {
    #[validate(length(min = 1, message = "Unit number is required"))]
    pub unit_number: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WingInput {
    #[validate(length(min = 1, message = "Wing name is required"))]
    pub wing_name: String,
    pub total_units: i32,
    #[serde(default)]
    #[validate(nested)]
    pub units: Vec<UnitInput>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GateInput {
    #[validate(length(min = 1, message = "Gate name is required"))]
    pub name: String,
}

/// Engagement terms as submitted. GST and total are derivable: a missing
/// `gst` defaults to 18% of the base rate, a missing `total` to base + GST.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EngagementInput {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[validate(range(min = 0.0, message = "Base rate must not be negative"))]
    pub base_rate: f64,
    pub gst: Option<f64>,
    pub total: Option<f64>,
}

impl EngagementInput {
    pub fn resolve(self) -> Engagement {
        let gst = self.gst.unwrap_or(self.base_rate * 0.18);
        let total = self.total.unwrap_or(self.base_rate + gst);
        Engagement {
            start_date: self.start_date,
            end_date: self.end_date,
            base_rate: self.base_rate,
            gst,
            total,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSocietyRequest {
    #[validate(length(min = 1, message = "Society name is required"))]
    pub society_name: String,
    #[validate(length(min = 1, message = "Society pin is required"))]
    pub society_pin: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: Option<SocietyStatus>,
    #[serde(default = "default_maintenance_due_date")]
    #[validate(range(min = 1, max = 28, message = "Maintenance due date must be a day of month"))]
    pub maintenance_due_date: i32,
    pub notes: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub structure: Vec<WingInput>,
    #[serde(default)]
    #[validate(nested)]
    pub entry_gates: Vec<GateInput>,
    #[serde(default)]
    #[validate(nested)]
    pub exit_gates: Vec<GateInput>,
    #[validate(nested)]
    pub engagement: Option<EngagementInput>,
}

fn default_maintenance_due_date() -> i32 {
    5
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSocietyRequest {
    pub society_name: Option<String>,
    pub society_pin: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: Option<SocietyStatus>,
    #[validate(range(min = 1, max = 28, message = "Maintenance due date must be a day of month"))]
    pub maintenance_due_date: Option<i32>,
    pub notes: Option<String>,
    #[validate(nested)]
    pub structure: Option<Vec<WingInput>>,
    #[validate(nested)]
    pub entry_gates: Option<Vec<GateInput>>,
    #[validate(nested)]
    pub exit_gates: Option<Vec<GateInput>>,
    #[validate(nested)]
    pub engagement: Option<EngagementInput>,
}

// ==================== /api/society-admin requests ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSocietyAdminRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 7, max = 15, message = "A valid mobile number is required"))]
    pub mobile: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSocietyAdminRequest {
    pub name: Option<String>,
    #[validate(email(message = "A valid email is required"))]
    pub email: Option<String>,
    #[validate(length(min = 7, max = 15, message = "A valid mobile number is required"))]
    pub mobile: Option<String>,
}

// ==================== /api/system requests ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AlertRequest {
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticErrorRequest {
    pub message: Option<String>,
    pub tags: Option<Vec<String>>,
}

// ==================== Views ====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperAdminView {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub role: &'static str,
}

impl From<&SuperAdmin> for SuperAdminView {
    fn from(admin: &SuperAdmin) -> Self {
        Self {
            id: admin.id.clone(),
            full_name: admin.full_name.clone(),
            email: admin.email.clone(),
            phone_number: admin.phone_number.clone(),
            role: "super_admin",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub country_code: String,
    pub phone_number: String,
    pub role: &'static str,
    pub status: &'static str,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            country_code: user.country_code.clone(),
            phone_number: user.phone_number.clone(),
            role: user.role.as_str(),
            status: user.status.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocietyAdminView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub status: &'static str,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&SocietyAdmin> for SocietyAdminView {
    fn from(admin: &SocietyAdmin) -> Self {
        Self {
            id: admin.id.clone(),
            name: admin.name.clone(),
            email: admin.email.clone(),
            mobile: admin.mobile.clone(),
            status: admin.status.as_str(),
            created_at: admin.created_at.to_rfc3339(),
            updated_at: admin.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitView {
    pub unit_number: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WingView {
    pub wing_name: String,
    pub total_units: i32,
    pub units: Vec<UnitView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateView {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementView {
    pub start_date: String,
    pub end_date: String,
    pub base_rate: f64,
    pub gst: f64,
    pub total: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocietyView {
    pub id: String,
    pub society_name: String,
    pub society_pin: String,
    pub address: String,
    pub city: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub status: SocietyStatus,
    pub maintenance_due_date: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub structure: Vec<WingView>,
    pub entry_gates: Vec<GateView>,
    pub exit_gates: Vec<GateView>,
    pub society_admins: Vec<SocietyAdminView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement: Option<EngagementView>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Society> for SocietyView {
    fn from(society: &Society) -> Self {
        Self {
            id: society.id.clone(),
            society_name: society.society_name.clone(),
            society_pin: society.society_pin.clone(),
            address: society.address.clone(),
            city: society.city.clone(),
            country: society.country.clone(),
            latitude: society.latitude,
            longitude: society.longitude,
            status: society.status,
            maintenance_due_date: society.maintenance_due_date,
            notes: society.notes.clone(),
            structure: society.structure.iter().map(wing_view).collect(),
            entry_gates: society.entry_gates.iter().map(gate_view).collect(),
            exit_gates: society.exit_gates.iter().map(gate_view).collect(),
            society_admins: society.society_admins.iter().map(SocietyAdminView::from).collect(),
            engagement: society.engagement.as_ref().map(engagement_view),
            created_at: society.created_at.to_rfc3339(),
            updated_at: society.updated_at.to_rfc3339(),
        }
    }
}

fn wing_view(wing: &Wing) -> WingView {
    WingView {
        wing_name: wing.wing_name.clone(),
        total_units: wing.total_units,
        units: wing
            .units
            .iter()
            .map(|u| UnitView {
                unit_number: u.unit_number.clone(),
            })
            .collect(),
    }
}

fn gate_view(gate: &Gate) -> GateView {
    GateView { name: gate.name.clone() }
}

fn engagement_view(engagement: &Engagement) -> EngagementView {
    EngagementView {
        start_date: engagement.start_date.to_rfc3339(),
        end_date: engagement.end_date.to_rfc3339(),
        base_rate: engagement.base_rate,
        gst: engagement.gst,
        total: engagement.total,
    }
}

// ==================== Input -> model conversions ====================

impl WingInput {
    pub fn into_model(self) -> Wing {
        Wing {
            wing_name: self.wing_name,
            total_units: self.total_units,
            units: self
                .units
                .into_iter()
                .map(|u| Unit {
                    unit_number: u.unit_number,
                })
                .collect(),
        }
    }
}

impl GateInput {
    pub fn into_model(self) -> Gate {
        Gate { name: self.name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engagement_defaults_gst_to_eighteen_percent() {
        let input = EngagementInput {
            start_date: Utc::now(),
            end_date: Utc::now(),
            base_rate: 1000.0,
            gst: None,
            total: None,
        };
        let resolved = input.resolve();
        assert!((resolved.gst - 180.0).abs() < f64::EPSILON);
        assert!((resolved.total - 1180.0).abs() < f64::EPSILON);
    }

    #[test]
    fn engagement_keeps_explicit_gst_and_total() {
        let input = EngagementInput {
            start_date: Utc::now(),
            end_date: Utc::now(),
            base_rate: 1000.0,
            gst: Some(120.0),
            total: Some(1100.0),
        };
        let resolved = input.resolve();
        assert!((resolved.gst - 120.0).abs() < f64::EPSILON);
        assert!((resolved.total - 1100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn explicit_gst_feeds_defaulted_total() {
        let input = EngagementInput {
            start_date: Utc::now(),
            end_date: Utc::now(),
            base_rate: 1000.0,
            gst: Some(50.0),
            total: None,
        };
        let resolved = input.resolve();
        assert!((resolved.total - 1050.0).abs() < f64::EPSILON);
    }

    #[test]
    fn views_never_expose_credential_fields() {
        let admin = SuperAdmin::new(
            "Asha".to_string(),
            "asha@example.com".to_string(),
            "$argon2id$secret".to_string(),
            "9990001111".to_string(),
        );
        let json = serde_json::to_value(SuperAdminView::from(&admin)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "asha@example.com");
    }

    #[test]
    fn society_admin_view_omits_otp_and_reset_state() {
        let admin = SocietyAdmin::new(
            "Ravi".to_string(),
            "ravi@example.com".to_string(),
            "9991112222".to_string(),
        );
        let json = serde_json::to_value(SocietyAdminView::from(&admin)).unwrap();
        assert!(json.get("otpHash").is_none());
        assert!(json.get("resetTokenHash").is_none());
        assert_eq!(json["status"], "Active");
    }

    #[test]
    fn success_envelope_skips_absent_fields() {
        let envelope: ApiSuccess<()> = ApiSuccess::new("ok");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["message"], "ok");
        assert!(json.get("data").is_none());
        assert!(json.get("token").is_none());
    }
}
