//! Liveness, readiness, and operator diagnostics.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use crate::dtos::{AlertRequest, ApiSuccess, DiagnosticErrorRequest, ValidatedJson};
use crate::error::AppError;
use crate::models::ErrorLog;
use crate::AppState;

/// Health report: process liveness plus the connectivity state maintained
/// by the background monitor. A confirmed-disconnected store degrades the
/// report to 503.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.db_health.state_label();
    let healthy = database != "disconnected";

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if healthy { "ok" } else { "degraded" },
            "service": state.config.service_name,
            "database": database,
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// Write a synthetic entry through the real error-log pipeline so the
/// persistence path can be exercised end to end.
pub async fn diagnostics_error(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DiagnosticErrorRequest>,
) -> Result<impl IntoResponse, AppError> {
    let message = req
        .message
        .unwrap_or_else(|| "Synthetic diagnostic error".to_string());

    let mut entry = ErrorLog::new(
        "/api/system/diagnostics/error".to_string(),
        "POST".to_string(),
        500,
        message.clone(),
        format!("Synthetic diagnostic entry: {message}"),
    );
    if let Some(tags) = req.tags {
        entry = entry.with_tags(tags);
    }

    state.error_logger.record(entry).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiSuccess::<()>::new("Diagnostic error recorded")),
    ))
}

/// Fire an operator alert email on demand. Unlike the automatic database
/// alerts this path is not debounced.
pub async fn diagnostics_alert(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AlertRequest>,
) -> Result<impl IntoResponse, AppError> {
    let message = req
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Alert message is required".to_string()))?;
    let subject = req
        .subject
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "System alert".to_string());

    let html = format!("<p>{message}</p>");
    state.alerts.send_alert(&subject, &message, &html).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiSuccess::<()>::new("Alert dispatched")),
    ))
}
