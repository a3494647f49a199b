//! Operator alerting and database connectivity monitoring.
//!
//! Manual alerts go out unconditionally; automatic connectivity alerts are
//! debounced through `AlertThrottle` so a flapping database produces at
//! most one email per window. Alert delivery failures are logged and
//! swallowed, they never propagate into request handling or the monitor.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::AlertConfig;
use crate::services::database::MongoDb;
use crate::services::email::EmailProvider;

/// Debounce gate: at most one pass per window.
pub struct AlertThrottle {
    last_fired: Mutex<Option<Instant>>,
    window: Duration,
}

impl AlertThrottle {
    pub fn new(window: Duration) -> Self {
        Self {
            last_fired: Mutex::new(None),
            window,
        }
    }

    /// Returns true and records the firing if the window has elapsed since
    /// the previous pass (or nothing has fired yet).
    pub fn should_fire(&self) -> bool {
        let mut last = match self.last_fired.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();
        match *last {
            Some(prev) if now.duration_since(prev) < self.window => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

/// Connectivity as last observed by the monitor. `/health` reads this
/// instead of pinging inline.
const DB_STATE_UNKNOWN: u8 = 0;
const DB_STATE_UP: u8 = 1;
const DB_STATE_DOWN: u8 = 2;

#[derive(Clone, Default)]
pub struct DbHealth {
    state: Arc<AtomicU8>,
}

impl DbHealth {
    pub fn is_connected(&self) -> bool {
        self.state.load(Ordering::Relaxed) == DB_STATE_UP
    }

    pub fn state_label(&self) -> &'static str {
        match self.state.load(Ordering::Relaxed) {
            DB_STATE_UP => "connected",
            DB_STATE_DOWN => "disconnected",
            _ => "unknown",
        }
    }

    fn mark_up(&self) -> bool {
        self.state.swap(DB_STATE_UP, Ordering::Relaxed) == DB_STATE_DOWN
    }

    fn mark_down(&self) -> bool {
        self.state.swap(DB_STATE_DOWN, Ordering::Relaxed) != DB_STATE_DOWN
    }
}

pub struct SystemAlerts {
    email: Arc<dyn EmailProvider>,
    recipients: Vec<String>,
    throttle: AlertThrottle,
}

impl SystemAlerts {
    pub fn new(email: Arc<dyn EmailProvider>, config: &AlertConfig) -> Self {
        Self {
            email,
            recipients: config.recipients.clone(),
            throttle: AlertThrottle::new(Duration::from_secs(config.debounce_seconds)),
        }
    }

    /// Manual alert, always sent. The caller sees the delivery result.
    pub async fn send_alert(
        &self,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), crate::error::AppError> {
        self.email
            .send_system_alert(&self.recipients, subject, text_body, html_body)
            .await
    }

    /// Automatic connectivity event, debounced. Never fails.
    pub async fn notify_db_event(&self, subject: &str, detail: &str) {
        if self.recipients.is_empty() {
            tracing::warn!("Database alert suppressed: no recipients configured");
            return;
        }
        if !self.throttle.should_fire() {
            tracing::debug!(subject = %subject, "Database alert suppressed by debounce window");
            return;
        }

        let text = format!("{detail}\n\nService: society-service");
        let html = format!("<p>{detail}</p><p>Service: society-service</p>");
        if let Err(e) = self
            .email
            .send_system_alert(&self.recipients, subject, &text, &html)
            .await
        {
            tracing::error!(error = %e, "Failed to deliver database alert");
        }
    }
}

static MONITOR_RUNNING: AtomicBool = AtomicBool::new(false);

/// Spawn the periodic connectivity probe. A second call is a no-op so the
/// monitor can never be duplicated by re-entrant startup paths.
pub fn spawn_connectivity_monitor(
    db: MongoDb,
    health: DbHealth,
    alerts: Arc<SystemAlerts>,
    interval_seconds: u64,
) {
    if MONITOR_RUNNING.swap(true, Ordering::SeqCst) {
        tracing::warn!("Connectivity monitor already running; skipping duplicate spawn");
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(interval_seconds, "Database connectivity monitor started");

        loop {
            ticker.tick().await;
            match db.health_check().await {
                Ok(()) => {
                    if health.mark_up() {
                        tracing::info!("Database connection restored");
                        alerts
                            .notify_db_event(
                                "Database connection restored",
                                "MongoDB connectivity has been restored.",
                            )
                            .await;
                    }
                }
                Err(e) => {
                    if health.mark_down() {
                        tracing::error!(error = %e, "Database connection lost");
                        alerts
                            .notify_db_event(
                                "Database connection lost",
                                "MongoDB is unreachable. The service is degraded until connectivity returns.",
                            )
                            .await;
                    } else {
                        tracing::debug!(error = %e, "Database still unreachable");
                    }
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email::MockMailer;

    #[test]
    fn throttle_first_pass_fires() {
        let throttle = AlertThrottle::new(Duration::from_secs(900));
        assert!(throttle.should_fire());
    }

    #[test]
    fn throttle_suppresses_within_window() {
        let throttle = AlertThrottle::new(Duration::from_secs(900));
        assert!(throttle.should_fire());
        assert!(!throttle.should_fire());
        assert!(!throttle.should_fire());
    }

    #[test]
    fn throttle_reopens_after_window() {
        let throttle = AlertThrottle::new(Duration::from_millis(0));
        assert!(throttle.should_fire());
        assert!(throttle.should_fire());
    }

    #[test]
    fn db_health_reports_transitions() {
        let health = DbHealth::default();
        assert_eq!(health.state_label(), "unknown");
        assert!(!health.is_connected());

        // unknown -> up is not a restoration
        assert!(!health.mark_up());
        assert!(health.is_connected());

        // up -> down is a loss
        assert!(health.mark_down());
        assert_eq!(health.state_label(), "disconnected");

        // down -> up is a restoration
        assert!(health.mark_up());
        assert_eq!(health.state_label(), "connected");
    }

    #[tokio::test]
    async fn db_event_is_debounced() {
        let mailer = MockMailer::default();
        let alerts = SystemAlerts::new(
            Arc::new(mailer.clone()),
            &crate::config::AlertConfig {
                recipients: vec!["ops@example.com".to_string()],
                debounce_seconds: 900,
                db_ping_interval_seconds: 30,
            },
        );

        alerts.notify_db_event("Database connection lost", "down").await;
        alerts.notify_db_event("Database connection lost", "down").await;

        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn manual_alert_bypasses_debounce() {
        let mailer = MockMailer::default();
        let alerts = SystemAlerts::new(
            Arc::new(mailer.clone()),
            &crate::config::AlertConfig {
                recipients: vec!["ops@example.com".to_string()],
                debounce_seconds: 900,
                db_ping_interval_seconds: 30,
            },
        );

        alerts.send_alert("a", "t", "<p>t</p>").await.unwrap();
        alerts.send_alert("b", "t", "<p>t</p>").await.unwrap();

        assert_eq!(mailer.sent.lock().unwrap().len(), 2);
    }
}
