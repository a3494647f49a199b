//! End-user login, profile lookup, and the OTP-backed password reset.
//!
//! Users have no email, so their reset flow rides the same OTP engine as
//! registration: request a code, verify it, then change the password
//! within a short window of the verification. One verification authorizes
//! at most one password change.

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::dtos::{
    ApiSuccess, UserForgotPasswordRequest, UserLoginRequest, UserResetPasswordRequest, UserView,
    ValidatedJson, VerifyOtpRequest,
};
use crate::error::AppError;
use crate::handlers::registration::{parse_role, sanitize_phone};
use crate::middleware::{AuthPrincipal, Principal};
use crate::services::Role;
use crate::utils::{generate_numeric_otp, hash_password, verify_password, Password, OTP_LENGTH};
use crate::AppState;

/// How long a verified OTP stays redeemable for the password change.
const RESET_WINDOW_SECONDS: i64 = 600;

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UserLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invalid = || AppError::Authentication("Invalid phone number or password".to_string());

    let role = parse_role(&req.role)?;
    let phone_number = sanitize_phone(&req.phone_number);

    let user = state
        .db
        .find_user_by_phone_and_role(&phone_number, role)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&Password::new(req.password), &user.password_hash) {
        return Err(invalid());
    }

    if !user.is_active() {
        return Err(AppError::Authorization(
            "Account is not active. Complete verification first.".to_string(),
        ));
    }

    let token = state
        .jwt
        .issue(Some(&user.id), &user.phone_number, Role::from(user.role))?;

    Ok(Json(
        ApiSuccess::new("Login successful")
            .with_data(UserView::from(&user))
            .with_token(token),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordData {
    pub user_id: String,
    pub phone_number: String,
    /// Plaintext code, present only when the debug exposure gate is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

/// Issue a password-reset OTP over SMS. The challenge overwrites any
/// outstanding one, registration codes included.
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UserForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = parse_role(&req.role)?;
    let phone_number = sanitize_phone(&req.phone_number);

    let mut user = state
        .db
        .find_user_by_phone_and_role(&phone_number, role)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("No account found with this phone number and role".to_string())
        })?;

    if !user.is_active() {
        return Err(AppError::Authorization(
            "Account is not active. Complete verification first.".to_string(),
        ));
    }

    let code = generate_numeric_otp(OTP_LENGTH);
    user.set_otp(&code, state.config.otp.ttl_seconds);
    // Issuing a reset code must not demote the account.
    user.status = crate::models::UserStatus::Active;
    state.db.save_user(&user).await?;

    if let Err(e) = state
        .sms
        .send_otp(&user.country_code, &user.phone_number, &code)
        .await
    {
        tracing::error!(error = %e, user_id = %user.id, "Failed to dispatch reset OTP SMS");
    }

    Ok(Json(
        ApiSuccess::new("OTP sent for password reset").with_data(ForgotPasswordData {
            user_id: user.id.clone(),
            phone_number: user.phone_number.clone(),
            otp: state.config.otp.expose_in_response.then_some(code),
        }),
    ))
}

/// Redeem the reset OTP. Success stamps the verification the follow-up
/// password change consumes.
pub async fn verify_otp(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VerifyOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut user = state
        .db
        .find_user_by_id(&req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !user.verify_otp(&req.otp) {
        return Err(AppError::Validation("Invalid or expired OTP".to_string()));
    }

    state.db.save_user(&user).await?;

    Ok(Json(ApiSuccess::<()>::new("OTP verified successfully")))
}

/// Change the password on the strength of a recent OTP verification.
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UserResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut user = state
        .db
        .find_user_by_id(&req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !user.consume_otp_verification(RESET_WINDOW_SECONDS) {
        return Err(AppError::Validation(
            "OTP verification required or expired".to_string(),
        ));
    }

    user.password_hash = hash_password(&Password::new(req.password)).map_err(AppError::Internal)?;
    user.updated_at = chrono::Utc::now();
    state.db.save_user(&user).await?;

    tracing::info!(user_id = %user.id, "User password reset completed");

    Ok(Json(ApiSuccess::<()>::new("Password reset successful")))
}

/// Profile of the calling user. Sits behind the user-tier guard, so the
/// principal is always the `User` variant here.
pub async fn me(Principal(principal): Principal) -> Result<impl IntoResponse, AppError> {
    match principal {
        AuthPrincipal::User(user) => Ok(Json(
            ApiSuccess::new("User profile").with_data(UserView::from(&user)),
        )),
        _ => Err(AppError::Authorization(
            "Access denied: user account required".to_string(),
        )),
    }
}
