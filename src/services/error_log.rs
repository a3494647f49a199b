//! Durable error-log persistence.
//!
//! Persistence failures are logged and swallowed so diagnostics can never
//! turn a failing request into a second failure.

use crate::models::ErrorLog;
use crate::services::database::MongoDb;

#[derive(Clone)]
pub struct ErrorLogger {
    db: MongoDb,
}

impl ErrorLogger {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }

    pub async fn record(&self, entry: ErrorLog) {
        if let Err(e) = self.db.insert_error_log(&entry).await {
            tracing::error!(
                error = %e,
                endpoint = %entry.api_endpoint,
                "Failed to persist error log"
            );
        }
    }
}
