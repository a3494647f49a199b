//! Bearer-token access guards.
//!
//! Checks run in a fixed order: header present and well formed (401),
//! token valid (401), role admitted for the route tier (403), principal
//! still resolvable (401). The fixed administrative principal is matched
//! against configuration alone; every other role is re-fetched from the
//! store so deleted or deactivated accounts lose access immediately.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::models::{SocietyAdmin, SuperAdmin, User};
use crate::services::{Claims, Role, INVALID_TOKEN_MESSAGE};
use crate::AppState;

/// Resolved caller identity, attached to request extensions by the guards.
#[derive(Debug, Clone)]
pub enum AuthPrincipal {
    Fixed { email: String },
    SuperAdmin(SuperAdmin),
    SocietyAdmin { society_id: String, admin: SocietyAdmin },
    User(User),
}

impl AuthPrincipal {
    pub fn email(&self) -> &str {
        match self {
            AuthPrincipal::Fixed { email } => email,
            AuthPrincipal::SuperAdmin(admin) => &admin.email,
            AuthPrincipal::SocietyAdmin { admin, .. } => &admin.email,
            AuthPrincipal::User(user) => &user.phone_number,
        }
    }
}

fn bearer_token(req: &Request) -> Result<&str, AppError> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Authentication("Missing or invalid Authorization header".to_string()))
}

async fn resolve_principal(state: &AppState, claims: &Claims) -> Result<AuthPrincipal, AppError> {
    let unresolved = || AppError::Authentication(INVALID_TOKEN_MESSAGE.to_string());

    match claims.role {
        Role::Fixed => {
            let configured = state
                .config
                .fixed_admin_email
                .as_deref()
                .ok_or_else(unresolved)?;
            if !claims.email.eq_ignore_ascii_case(configured) {
                return Err(unresolved());
            }
            Ok(AuthPrincipal::Fixed {
                email: claims.email.clone(),
            })
        }
        Role::SuperAdmin => {
            let id = claims.sub.as_deref().ok_or_else(unresolved)?;
            let admin = state
                .db
                .find_super_admin_by_id(id)
                .await?
                .ok_or_else(unresolved)?;
            Ok(AuthPrincipal::SuperAdmin(admin))
        }
        Role::SocietyAdmin => {
            let society = state
                .db
                .find_society_holding_admin_email(&claims.email)
                .await?
                .ok_or_else(unresolved)?;
            let admin = society
                .admin_by_email(&claims.email)
                .cloned()
                .ok_or_else(unresolved)?;
            if !admin.is_active() {
                return Err(unresolved());
            }
            Ok(AuthPrincipal::SocietyAdmin {
                society_id: society.id,
                admin,
            })
        }
        Role::Member | Role::Visitor | Role::Guard => {
            let id = claims.sub.as_deref().ok_or_else(unresolved)?;
            let user = state.db.find_user_by_id(id).await?.ok_or_else(unresolved)?;
            if !user.is_active() {
                return Err(unresolved());
            }
            Ok(AuthPrincipal::User(user))
        }
    }
}

async fn guard(
    state: AppState,
    mut req: Request,
    next: Next,
    admitted: fn(Role) -> bool,
    forbidden_message: &str,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)?;
    let claims = state.jwt.validate(token)?;

    if !admitted(claims.role) {
        return Err(AppError::Authorization(forbidden_message.to_string()));
    }

    let principal = resolve_principal(&state, &claims).await?;
    req.extensions_mut().insert(principal.clone());
    req.extensions_mut().insert(claims);

    let mut response = next.run(req).await;
    // Mirror the principal onto the response so the error-capture layer
    // can record who made the failing request.
    response.extensions_mut().insert(principal);
    Ok(response)
}

/// Admits the fixed principal and super-admins only.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(
        state,
        req,
        next,
        Role::is_admin_tier,
        "Access denied: admin privileges required",
    )
    .await
}

/// Admits society-admin tokens only. The principal is re-resolved from the
/// society holding the claimed email, so a deleted or deactivated admin is
/// rejected even with a live token.
pub async fn require_society_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(
        state,
        req,
        next,
        |role| matches!(role, Role::SocietyAdmin),
        "Access denied: society admin account required",
    )
    .await
}

/// Admits member, visitor, and guard tokens.
pub async fn require_user(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(
        state,
        req,
        next,
        Role::is_user_tier,
        "Access denied: user account required",
    )
    .await
}

/// Extractor handing the resolved principal to handlers behind a guard.
pub struct Principal(pub AuthPrincipal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts
            .extensions
            .get::<AuthPrincipal>()
            .cloned()
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("Auth principal missing from request extensions"))
            })?;
        Ok(Principal(principal))
    }
}
