//! Operational error-log document. Request bodies are redacted before this
//! struct is ever built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorLog {
    #[serde(rename = "_id")]
    pub id: String,
    pub api_endpoint: String,
    pub method: String,
    pub status_code: i32,
    /// Public-facing message as sent to the client.
    pub error_message: String,
    /// Internal diagnostic detail; never returned in a response body.
    pub diagnostic: String,
    pub request_body: Option<serde_json::Value>,
    pub user_context: Option<serde_json::Value>,
    pub tags: Option<Vec<String>>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub occurred_at: DateTime<Utc>,
}

impl ErrorLog {
    pub fn new(
        api_endpoint: String,
        method: String,
        status_code: i32,
        error_message: String,
        diagnostic: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            api_endpoint,
            method,
            status_code,
            error_message,
            diagnostic,
            request_body: None,
            user_context: None,
            tags: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_request_body(mut self, body: serde_json::Value) -> Self {
        self.request_body = Some(body);
        self
    }

    pub fn with_user_context(mut self, context: serde_json::Value) -> Self {
        self.user_context = Some(context);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }
}
