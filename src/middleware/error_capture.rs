//! Error-capture layer.
//!
//! Buffers the request body up front so it is still available after the
//! inner service consumed it, then inspects the response for the
//! `ErrorDiagnostic` extension. When present, a redacted error-log document
//! is persisted in the background. Capture failures never alter the
//! response.

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http_body_util::BodyExt;

use crate::error::ErrorDiagnostic;
use crate::middleware::auth::AuthPrincipal;
use crate::models::ErrorLog;
use crate::utils::redact_sensitive;
use crate::AppState;

const MAX_CAPTURED_BODY_BYTES: usize = 64 * 1024;

pub async fn capture_errors(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let (parts, body) = req.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to buffer request body for error capture");
            axum::body::Bytes::new()
        }
    };

    // Only JSON bodies of reasonable size are kept for diagnostics.
    let captured_body = if bytes.is_empty() || bytes.len() > MAX_CAPTURED_BODY_BYTES {
        None
    } else {
        serde_json::from_slice::<serde_json::Value>(&bytes).ok()
    };

    let req = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(req).await;

    if let Some(diag) = response.extensions().get::<ErrorDiagnostic>().cloned() {
        let user_context = response
            .extensions()
            .get::<AuthPrincipal>()
            .map(principal_context);

        let mut entry = ErrorLog::new(
            path,
            method,
            i32::from(diag.status),
            diag.public_message,
            diag.diagnostic,
        );
        if let Some(body) = captured_body {
            entry = entry.with_request_body(redact_sensitive(&body));
        }
        if let Some(ctx) = user_context {
            entry = entry.with_user_context(ctx);
        }

        let logger = state.error_logger.clone();
        tokio::spawn(async move {
            logger.record(entry).await;
        });
    }

    response
}

fn principal_context(principal: &AuthPrincipal) -> serde_json::Value {
    match principal {
        AuthPrincipal::Fixed { email } => serde_json::json!({
            "role": "admin",
            "email": email,
        }),
        AuthPrincipal::SuperAdmin(admin) => serde_json::json!({
            "role": "super_admin",
            "id": admin.id,
            "email": admin.email,
        }),
        AuthPrincipal::SocietyAdmin { society_id, admin } => serde_json::json!({
            "role": "society_admin",
            "societyId": society_id,
            "email": admin.email,
        }),
        AuthPrincipal::User(user) => serde_json::json!({
            "role": user.role.as_str(),
            "id": user.id,
            "phoneNumber": user.phone_number,
        }),
    }
}
