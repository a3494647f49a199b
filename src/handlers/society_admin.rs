//! Society-admin management (guarded) plus the admins' own public login
//! and password-reset endpoints.
//!
//! Admin email and mobile are unique across every society, not just within
//! one; the conflict message names the society already holding the value so
//! an operator can find the collision.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::dtos::{
    ApiSuccess, CreateSocietyAdminRequest, LoginRequest, ResetPasswordRequest, SocietyAdminView,
    UpdateSocietyAdminRequest, ValidatedJson,
};
use crate::error::AppError;
use crate::models::SocietyAdmin;
use crate::services::Role;
use crate::utils::{
    build_reset_url, generate_reset_token, hash_password, sha256_hex, verify_password, Password,
};
use crate::AppState;

fn society_not_found() -> AppError {
    AppError::NotFound("Society not found".to_string())
}

fn admin_not_found() -> AppError {
    AppError::NotFound("Society admin not found".to_string())
}

/// Decide whether a society already holding this email blocks the write.
/// The one permitted holder is the admin being edited; any other admin is
/// a conflict named after the holding society.
fn email_conflict(
    holder: &crate::models::Society,
    email: &str,
    exclude_admin_id: Option<&str>,
) -> Result<(), AppError> {
    let same_admin = exclude_admin_id
        .and_then(|id| holder.admin_by_email(email).map(|a| a.id == id))
        .unwrap_or(false);
    if same_admin {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "An admin with this email already exists in society '{}'",
            holder.society_name
        )))
    }
}

fn mobile_conflict(
    holder: &crate::models::Society,
    mobile: &str,
    exclude_admin_id: Option<&str>,
) -> Result<(), AppError> {
    let same_admin = exclude_admin_id
        .and_then(|id| {
            holder
                .society_admins
                .iter()
                .find(|a| a.mobile == mobile)
                .map(|a| a.id == id)
        })
        .unwrap_or(false);
    if same_admin {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "An admin with this mobile number already exists in society '{}'",
            holder.society_name
        )))
    }
}

/// Reject an email already held by any admin anywhere, except the admin
/// being edited. Read-then-write; the race window is a known limitation.
async fn ensure_email_available(
    state: &AppState,
    email: &str,
    exclude_admin_id: Option<&str>,
) -> Result<(), AppError> {
    match state.db.find_society_holding_admin_email(email).await? {
        Some(holder) => email_conflict(&holder, email, exclude_admin_id),
        None => Ok(()),
    }
}

async fn ensure_mobile_available(
    state: &AppState,
    mobile: &str,
    exclude_admin_id: Option<&str>,
) -> Result<(), AppError> {
    match state.db.find_society_holding_admin_mobile(mobile).await? {
        Some(holder) => mobile_conflict(&holder, mobile, exclude_admin_id),
        None => Ok(()),
    }
}

pub async fn create_admin(
    State(state): State<AppState>,
    Path(society_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateSocietyAdminRequest>,
) -> Result<impl IntoResponse, AppError> {
    ensure_email_available(&state, &req.email, None).await?;
    ensure_mobile_available(&state, &req.mobile, None).await?;

    let mut society = state
        .db
        .find_society_by_id(&society_id)
        .await?
        .ok_or_else(society_not_found)?;

    let admin = SocietyAdmin::new(req.name, req.email, req.mobile);
    let view = SocietyAdminView::from(&admin);
    society.society_admins.push(admin);
    society.updated_at = Utc::now();
    state.db.save_society(&society).await?;

    tracing::info!(society_id = %society.id, "Society admin created");

    Ok((
        StatusCode::CREATED,
        Json(ApiSuccess::new("Society admin created successfully").with_data(view)),
    ))
}

pub async fn list_admins(
    State(state): State<AppState>,
    Path(society_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let society = state
        .db
        .find_society_by_id(&society_id)
        .await?
        .ok_or_else(society_not_found)?;

    let views: Vec<SocietyAdminView> = society
        .society_admins
        .iter()
        .map(SocietyAdminView::from)
        .collect();

    Ok(Json(ApiSuccess::new("Society admins fetched").with_data(views)))
}

pub async fn get_admin(
    State(state): State<AppState>,
    Path((society_id, admin_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let society = state
        .db
        .find_society_by_id(&society_id)
        .await?
        .ok_or_else(society_not_found)?;

    let admin = society.admin(&admin_id).ok_or_else(admin_not_found)?;

    Ok(Json(
        ApiSuccess::new("Society admin fetched").with_data(SocietyAdminView::from(admin)),
    ))
}

pub async fn update_admin(
    State(state): State<AppState>,
    Path((society_id, admin_id)): Path<(String, String)>,
    ValidatedJson(req): ValidatedJson<UpdateSocietyAdminRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Uniqueness is re-checked only for values that actually change.
    if let Some(email) = &req.email {
        ensure_email_available(&state, email, Some(&admin_id)).await?;
    }
    if let Some(mobile) = &req.mobile {
        ensure_mobile_available(&state, mobile, Some(&admin_id)).await?;
    }

    let mut society = state
        .db
        .find_society_by_id(&society_id)
        .await?
        .ok_or_else(society_not_found)?;

    let admin = society.admin_mut(&admin_id).ok_or_else(admin_not_found)?;

    if let Some(name) = req.name {
        admin.name = name;
    }
    if let Some(email) = req.email {
        admin.email = email.trim().to_lowercase();
    }
    if let Some(mobile) = req.mobile {
        admin.mobile = mobile;
    }
    admin.updated_at = Utc::now();
    let view = SocietyAdminView::from(&*admin);

    society.updated_at = Utc::now();
    state.db.save_society(&society).await?;

    Ok(Json(
        ApiSuccess::new("Society admin updated successfully").with_data(view),
    ))
}

pub async fn toggle_admin_status(
    State(state): State<AppState>,
    Path((society_id, admin_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let mut society = state
        .db
        .find_society_by_id(&society_id)
        .await?
        .ok_or_else(society_not_found)?;

    let admin = society.admin_mut(&admin_id).ok_or_else(admin_not_found)?;
    admin.status = admin.status.toggled();
    admin.updated_at = Utc::now();
    let view = SocietyAdminView::from(&*admin);

    society.updated_at = Utc::now();
    state.db.save_society(&society).await?;

    Ok(Json(
        ApiSuccess::new("Society admin status updated").with_data(view),
    ))
}

pub async fn delete_admin(
    State(state): State<AppState>,
    Path((society_id, admin_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let mut society = state
        .db
        .find_society_by_id(&society_id)
        .await?
        .ok_or_else(society_not_found)?;

    let before = society.society_admins.len();
    society.society_admins.retain(|a| a.id != admin_id);
    if society.society_admins.len() == before {
        return Err(admin_not_found());
    }

    society.updated_at = Utc::now();
    state.db.save_society(&society).await?;

    tracing::info!(society_id = %society.id, admin_id = %admin_id, "Society admin deleted");

    Ok(Json(ApiSuccess::<()>::new(
        "Society admin deleted successfully",
    )))
}

pub async fn send_reset_link(
    State(state): State<AppState>,
    Path((society_id, admin_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let mut society = state
        .db
        .find_society_by_id(&society_id)
        .await?
        .ok_or_else(society_not_found)?;

    let token = generate_reset_token();
    let token_digest = sha256_hex(&token);
    let ttl = state.config.reset.token_expiry_seconds;

    let admin = society.admin_mut(&admin_id).ok_or_else(admin_not_found)?;
    admin.set_reset_token(token_digest, ttl);
    let email = admin.email.clone();

    society.updated_at = Utc::now();
    state.db.save_society(&society).await?;

    // Token write is durable; delivery failure is logged only.
    let reset_url = build_reset_url(&state.config.reset, &token, &email);
    if let Err(e) = state.email.send_password_reset(&email, &reset_url).await {
        tracing::error!(error = %e, admin_id = %admin_id, "Failed to send reset email");
    }

    Ok(Json(ApiSuccess::<()>::new(
        "Password reset link sent to the admin's email",
    )))
}

// Public endpoints below: no guard, credentials are the proof.

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invalid = || AppError::Authentication("Invalid email or password".to_string());

    let society = state
        .db
        .find_society_holding_admin_email(&req.email)
        .await?
        .ok_or_else(invalid)?;

    let admin = society.admin_by_email(&req.email).ok_or_else(invalid)?;

    let password_hash = admin.password_hash.as_deref().ok_or_else(invalid)?;
    if !verify_password(&Password::new(req.password), password_hash) {
        return Err(invalid());
    }

    if !admin.is_active() {
        return Err(AppError::Authorization("Account is inactive".to_string()));
    }

    let token = state
        .jwt
        .issue(Some(&admin.id), &admin.email, Role::SocietyAdmin)?;

    Ok(Json(
        ApiSuccess::new("Login successful")
            .with_data(SocietyAdminView::from(admin))
            .with_token(token),
    ))
}

/// Profile of the calling society admin. Sits behind the society-admin
/// guard, so the principal is always that variant here.
pub async fn me(
    crate::middleware::Principal(principal): crate::middleware::Principal,
) -> Result<impl IntoResponse, AppError> {
    match principal {
        crate::middleware::AuthPrincipal::SocietyAdmin { admin, .. } => Ok(Json(
            ApiSuccess::new("Society admin profile").with_data(SocietyAdminView::from(&admin)),
        )),
        _ => Err(AppError::Authorization(
            "Access denied: society admin account required".to_string(),
        )),
    }
}

pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invalid = || AppError::Validation("Invalid or expired reset token".to_string());
    let token_digest = sha256_hex(&req.token);

    let mut society = state
        .db
        .find_society_admin_for_reset(&req.email, &token_digest)
        .await?
        .ok_or_else(invalid)?;

    let password_hash =
        hash_password(&Password::new(req.password)).map_err(AppError::Internal)?;

    let admin = society
        .admin_by_email_mut(&req.email)
        .ok_or_else(invalid)?;
    if !admin.reset_token_matches(&token_digest) {
        return Err(invalid());
    }
    admin.complete_password_reset(password_hash);
    let view = SocietyAdminView::from(&*admin);

    society.updated_at = Utc::now();
    state.db.save_society(&society).await?;

    tracing::info!(society_id = %society.id, "Society admin password reset completed");

    Ok(Json(
        ApiSuccess::new("Password reset successful").with_data(view),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Society, SocietyStatus};

    fn society_with_admin(name: &str, email: &str, mobile: &str) -> Society {
        let now = Utc::now();
        Society {
            id: "s1".to_string(),
            society_name: name.to_string(),
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
            society_admins: vec![SocietyAdmin::new(
                "Ravi".to_string(),
                email.to_string(),
                mobile.to_string(),
            )],
            engagement: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn deleting_unknown_admin_leaves_list_untouched() {
        let mut society = society_with_admin("Green Acres", "ravi@example.com", "9991112222");
        let before = society.society_admins.len();
        society.society_admins.retain(|a| a.id != "missing");
        assert_eq!(society.society_admins.len(), before);
    }

    #[test]
    fn email_conflict_names_the_holding_society() {
        let holder = society_with_admin("Green Acres", "ravi@example.com", "9991112222");

        let err = email_conflict(&holder, "ravi@example.com", None).unwrap_err();
        match err {
            AppError::Conflict(message) => {
                assert!(message.contains("Green Acres"), "got: {message}");
                assert!(message.contains("email"));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn email_conflict_excludes_the_admin_being_edited() {
        let holder = society_with_admin("Green Acres", "ravi@example.com", "9991112222");
        let own_id = holder.society_admins[0].id.clone();

        // Keeping your own email on update is not a conflict.
        assert!(email_conflict(&holder, "ravi@example.com", Some(&own_id)).is_ok());

        // A different admin taking the same email still is.
        assert!(email_conflict(&holder, "ravi@example.com", Some("someone-else")).is_err());
    }

    #[test]
    fn mobile_conflict_mirrors_the_email_rules() {
        let holder = society_with_admin("Green Acres", "ravi@example.com", "9991112222");
        let own_id = holder.society_admins[0].id.clone();

        match mobile_conflict(&holder, "9991112222", None).unwrap_err() {
            AppError::Conflict(message) => assert!(message.contains("Green Acres")),
            other => panic!("expected conflict, got {other:?}"),
        }
        assert!(mobile_conflict(&holder, "9991112222", Some(&own_id)).is_ok());
    }
}
