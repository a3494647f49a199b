use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use society_service::{
    build_router,
    config::AppConfig,
    services::{
        alerts::spawn_connectivity_monitor, sms::LoggingSms, DbHealth, EmailProvider, ErrorLogger,
        JwtService, MongoDb, SmsProvider, SmtpMailer, SystemAlerts, TwilioSms,
    },
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), society_service::error::AppError> {
    // Load configuration, fail fast if invalid
    let config = AppConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        environment = ?config.environment,
        "Starting society service"
    );

    let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;
    db.initialize_indexes().await?;
    tracing::info!("Database initialized successfully");

    let jwt = JwtService::new(&config.jwt);

    let email: Arc<dyn EmailProvider> = Arc::new(SmtpMailer::new(&config.smtp)?);

    let sms: Arc<dyn SmsProvider> = match TwilioSms::from_config(&config.twilio) {
        Some(twilio) => Arc::new(twilio),
        None => {
            tracing::warn!("Twilio credentials not configured; falling back to logging SMS transport");
            Arc::new(LoggingSms)
        }
    };

    let alerts = Arc::new(SystemAlerts::new(email.clone(), &config.alerts));
    let error_logger = ErrorLogger::new(db.clone());
    let db_health = DbHealth::default();

    spawn_connectivity_monitor(
        db.clone(),
        db_health.clone(),
        alerts.clone(),
        config.alerts.db_ping_interval_seconds,
    );

    let port = config.port;
    let state = AppState {
        config: Arc::new(config),
        db,
        jwt,
        email,
        sms,
        alerts,
        error_logger,
        db_health,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

fn init_tracing(service_name: &str, log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true),
        )
        .init();

    tracing::debug!(service = service_name, "Tracing initialized");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
