//! Application error taxonomy and the wire-envelope boundary.
//!
//! Every failure leaving the service is translated exactly once, here, into
//! the uniform envelope `{success: false, message, timestamp}`. Each variant
//! carries a public message (what the client sees) and a diagnostic
//! (`anyhow::Error`) that is stashed in a response extension for the
//! error-capture layer to persist; diagnostics never reach the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Database error: {0}")]
    Database(anyhow::Error),

    #[error("Email error: {0}")]
    Email(anyhow::Error),

    #[error("Sms error: {0}")]
    Sms(anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(anyhow::Error),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::Database(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

/// Diagnostic detail attached to error responses as an extension so the
/// error-capture middleware can persist it. Never serialized to the client.
#[derive(Debug, Clone)]
pub struct ErrorDiagnostic {
    pub status: u16,
    pub public_message: String,
    pub diagnostic: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::Database(_)
            | AppError::Email(_)
            | AppError::Sms(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. 5xx variants collapse to a generic message;
    /// their detail lives only in the diagnostic.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::NotFound(msg)
            | AppError::Authentication(msg)
            | AppError::Authorization(msg) => msg.clone(),
            AppError::Database(_) => "Internal server error".to_string(),
            AppError::Email(_) => "Failed to send notification".to_string(),
            AppError::Sms(_) => "Failed to send notification".to_string(),
            AppError::Config(_) => "Internal server error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    fn diagnostic_message(&self) -> String {
        match self {
            AppError::Database(err)
            | AppError::Email(err)
            | AppError::Sms(err)
            | AppError::Config(err)
            | AppError::Internal(err) => format!("{err:#}"),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let public = self.public_message();
        let diagnostic = self.diagnostic_message();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %diagnostic, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %diagnostic, "request rejected");
        }

        let body = Json(serde_json::json!({
            "success": false,
            "message": public,
            "timestamp": Utc::now().to_rfc3339(),
        }));

        let mut response = (status, body).into_response();
        response.extensions_mut().insert(ErrorDiagnostic {
            status: status.as_u16(),
            public_message: public,
            diagnostic,
        });
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Conflict("x".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Authentication("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Authorization("x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_errors_hide_diagnostics_from_clients() {
        let err = AppError::Database(anyhow::anyhow!("connection refused to mongodb://secret-host"));
        assert_eq!(err.public_message(), "Internal server error");
        assert!(err.diagnostic_message().contains("connection refused"));
    }

    #[test]
    fn response_carries_diagnostic_extension() {
        let response = AppError::Authentication("Invalid or expired token".into()).into_response();
        let diag = response
            .extensions()
            .get::<ErrorDiagnostic>()
            .expect("diagnostic extension");
        assert_eq!(diag.status, 401);
        assert_eq!(diag.public_message, "Invalid or expired token");
    }
}
