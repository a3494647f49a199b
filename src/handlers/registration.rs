//! Phone + OTP registration for end users (member, visitor, guard).
//!
//! `(phone_number, role)` identifies a principal: an active pair conflicts,
//! a pending pair is refreshed in place so an abandoned registration can be
//! restarted. Each issue overwrites the previous challenge.

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::dtos::{
    ApiSuccess, RegistrationStartRequest, ResendOtpRequest, ValidatedJson, VerifyOtpRequest,
};
use crate::error::AppError;
use crate::models::{User, UserRole};
use crate::services::Role;
use crate::utils::{generate_numeric_otp, hash_password, Password, OTP_LENGTH};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStartData {
    pub user_id: String,
    pub role: &'static str,
    pub phone_number: String,
    /// Plaintext code, present only when the debug exposure gate is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

/// Strip everything but digits; the country code is carried separately.
pub(crate) fn sanitize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub(crate) fn parse_role(raw: &str) -> Result<UserRole, AppError> {
    UserRole::parse(&raw.trim().to_lowercase()).ok_or_else(|| {
        AppError::Validation("Role must be one of: member, visitor, guard".to_string())
    })
}

async fn dispatch_otp(state: &AppState, user: &User, code: &str) {
    // Delivery failure is logged but never fails the registration; the
    // challenge is already durable and resend is available.
    if let Err(e) = state
        .sms
        .send_otp(&user.country_code, &user.phone_number, code)
        .await
    {
        tracing::error!(error = %e, user_id = %user.id, "Failed to dispatch OTP SMS");
    }
}

fn exposed_otp(state: &AppState, code: String) -> Option<String> {
    state.config.otp.expose_in_response.then_some(code)
}

pub async fn start(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegistrationStartRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = parse_role(&req.role)?;

    if !req.terms_accepted {
        return Err(AppError::Validation(
            "You must accept the terms and conditions".to_string(),
        ));
    }

    let phone_number = sanitize_phone(&req.phone_number);
    if phone_number.len() < 7 {
        return Err(AppError::Validation(
            "A valid phone number is required".to_string(),
        ));
    }

    let password_hash =
        hash_password(&Password::new(req.password)).map_err(AppError::Internal)?;
    let code = generate_numeric_otp(OTP_LENGTH);

    let existing = state.db.find_user_by_phone_and_role(&phone_number, role).await?;
    let user = match existing {
        Some(user) if user.is_active() => {
            return Err(AppError::Conflict(
                "An account with this phone number and role already exists".to_string(),
            ));
        }
        Some(mut user) => {
            // Abandoned registration: refresh credentials, restamp terms,
            // and reissue.
            user.refresh_pending_registration(req.country_code, password_hash);
            user.set_otp(&code, state.config.otp.ttl_seconds);
            state.db.save_user(&user).await?;
            user
        }
        None => {
            let mut user = User::new(req.country_code, phone_number, password_hash, role);
            user.set_otp(&code, state.config.otp.ttl_seconds);
            state.db.insert_user(&user).await?;
            user
        }
    };

    dispatch_otp(&state, &user, &code).await;

    tracing::info!(user_id = %user.id, role = role.as_str(), "Registration started");

    Ok(Json(
        ApiSuccess::new("OTP sent for verification").with_data(RegistrationStartData {
            user_id: user.id.clone(),
            role: role.as_str(),
            phone_number: user.phone_number.clone(),
            otp: exposed_otp(&state, code),
        }),
    ))
}

pub async fn verify(
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

    let token = state
        .jwt
        .issue(Some(&user.id), &user.phone_number, Role::from(user.role))?;

    tracing::info!(user_id = %user.id, "Registration verified");

    Ok(Json(
        ApiSuccess::new("Account verified successfully")
            .with_data(crate::dtos::UserView::from(&user))
            .with_token(token),
    ))
}

pub async fn resend(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ResendOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut user = state
        .db
        .find_user_by_id(&req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.is_active() {
        return Err(AppError::Validation(
            "Account is already verified".to_string(),
        ));
    }

    let code = generate_numeric_otp(OTP_LENGTH);
    user.set_otp(&code, state.config.otp.ttl_seconds);
    state.db.save_user(&user).await?;

    dispatch_otp(&state, &user, &code).await;

    Ok(Json(
        ApiSuccess::new("A new OTP has been sent").with_data(RegistrationStartData {
            user_id: user.id.clone(),
            role: user.role.as_str(),
            phone_number: user.phone_number.clone(),
            otp: exposed_otp(&state, code),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_sanitization_keeps_digits_only() {
        assert_eq!(sanitize_phone(" (999) 888-7776 "), "9998887776");
        assert_eq!(sanitize_phone("+91 99988 87776"), "919998887776");
        assert_eq!(sanitize_phone("abc"), "");
    }

    #[test]
    fn role_parsing_is_case_insensitive_and_closed() {
        assert_eq!(parse_role(" Member ").unwrap(), UserRole::Member);
        assert_eq!(parse_role("GUARD").unwrap(), UserRole::Guard);
        assert!(parse_role("admin").is_err());
        assert!(parse_role("").is_err());
    }
}
