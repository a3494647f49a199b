//! Super-admin authentication: signup, login, and the password-reset flow.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::dtos::{
    ApiSuccess, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest,
    SuperAdminView, ValidatedJson,
};
use crate::error::AppError;
use crate::models::SuperAdmin;
use crate::services::Role;
use crate::utils::{
    build_reset_url, generate_reset_token, hash_password, sha256_hex, verify_password, Password,
};
use crate::AppState;

pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if state.db.find_super_admin_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let password_hash =
        hash_password(&Password::new(req.password)).map_err(AppError::Internal)?;
    let admin = SuperAdmin::new(req.full_name, req.email, password_hash, req.phone_number);
    state.db.insert_super_admin(&admin).await?;

    let token = state
        .jwt
        .issue(Some(&admin.id), &admin.email, Role::SuperAdmin)?;

    tracing::info!(admin_id = %admin.id, "Super admin account created");

    Ok((
        StatusCode::CREATED,
        Json(
            ApiSuccess::new("Account created successfully")
                .with_data(SuperAdminView::from(&admin))
                .with_token(token),
        ),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Unknown email and wrong password are indistinguishable to the caller.
    let invalid = || AppError::Authentication("Invalid email or password".to_string());

    let admin = state
        .db
        .find_super_admin_by_email(&req.email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&Password::new(req.password), &admin.password_hash) {
        return Err(invalid());
    }

    let token = state
        .jwt
        .issue(Some(&admin.id), &admin.email, Role::SuperAdmin)?;

    Ok(Json(
        ApiSuccess::new("Login successful")
            .with_data(SuperAdminView::from(&admin))
            .with_token(token),
    ))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut admin = state
        .db
        .find_super_admin_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::NotFound("No account found with this email".to_string()))?;

    let token = generate_reset_token();
    admin.set_reset_token(sha256_hex(&token), state.config.reset.token_expiry_seconds);
    state.db.save_super_admin(&admin).await?;

    // The token write above is durable; a delivery failure is logged but
    // does not fail the request.
    let reset_url = build_reset_url(&state.config.reset, &token, &admin.email);
    if let Err(e) = state.email.send_password_reset(&admin.email, &reset_url).await {
        tracing::error!(error = %e, admin_id = %admin.id, "Failed to send reset email");
    }

    Ok(Json(ApiSuccess::<()>::new(
        "Password reset link sent to your email",
    )))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Unknown email, wrong token, and expired token are the same miss.
    let invalid = || AppError::Validation("Invalid or expired reset token".to_string());

    let mut admin = state
        .db
        .find_super_admin_by_email(&req.email)
        .await?
        .ok_or_else(invalid)?;

    if !admin.reset_token_matches(&sha256_hex(&req.token)) {
        return Err(invalid());
    }

    let password_hash =
        hash_password(&Password::new(req.password)).map_err(AppError::Internal)?;
    admin.complete_password_reset(password_hash);
    state.db.save_super_admin(&admin).await?;

    let token = state
        .jwt
        .issue(Some(&admin.id), &admin.email, Role::SuperAdmin)?;

    tracing::info!(admin_id = %admin.id, "Super admin password reset completed");

    Ok(Json(
        ApiSuccess::new("Password reset successful")
            .with_data(SuperAdminView::from(&admin))
            .with_token(token),
    ))
}
