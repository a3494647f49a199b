pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use chrono::Utc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::services::{DbHealth, EmailProvider, ErrorLogger, JwtService, MongoDb, SmsProvider, SystemAlerts};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: MongoDb,
    pub jwt: JwtService,
    pub email: Arc<dyn EmailProvider>,
    pub sms: Arc<dyn SmsProvider>,
    pub alerts: Arc<SystemAlerts>,
    pub error_logger: ErrorLogger,
    pub db_health: DbHealth,
}

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/reset-password", post(handlers::auth::reset_password));

    let registration_routes = Router::new()
        .route("/start", post(handlers::registration::start))
        .route("/verify", post(handlers::registration::verify))
        .route("/resend", post(handlers::registration::resend));

    let user_auth_routes = Router::new()
        .route("/login", post(handlers::user_auth::login))
        .route(
            "/forgot-password",
            post(handlers::user_auth::forgot_password),
        )
        .route("/verify-otp", post(handlers::user_auth::verify_otp))
        .route(
            "/reset-password",
            post(handlers::user_auth::reset_password),
        )
        .merge(
            Router::new()
                .route("/me", get(handlers::user_auth::me))
                .layer(from_fn_with_state(state.clone(), middleware::require_user)),
        );

    let society_routes = Router::new()
        .route("/create-society", post(handlers::society::create_society))
        .route(
            "/get-all-societies",
            get(handlers::society::get_all_societies),
        )
        .route("/:id", get(handlers::society::get_society))
        .route("/:id", put(handlers::society::update_society))
        .route(
            "/:id/toggle-status",
            patch(handlers::society::toggle_society_status),
        )
        .layer(from_fn_with_state(state.clone(), middleware::require_admin));

    // Login and reset-password stay public; everything else is guarded.
    let society_admin_routes = Router::new()
        .route("/login", post(handlers::society_admin::login))
        .route(
            "/reset-password",
            post(handlers::society_admin::reset_password),
        )
        .merge(
            Router::new()
                .route("/me", get(handlers::society_admin::me))
                .layer(from_fn_with_state(
                    state.clone(),
                    middleware::require_society_admin,
                )),
        )
        .merge(
            Router::new()
                .route("/:society_id", post(handlers::society_admin::create_admin))
                .route("/:society_id", get(handlers::society_admin::list_admins))
                .route(
                    "/:society_id/:admin_id",
                    get(handlers::society_admin::get_admin),
                )
                .route(
                    "/:society_id/:admin_id",
                    put(handlers::society_admin::update_admin),
                )
                .route(
                    "/:society_id/:admin_id/toggle-status",
                    patch(handlers::society_admin::toggle_admin_status),
                )
                .route(
                    "/:society_id/:admin_id",
                    delete(handlers::society_admin::delete_admin),
                )
                .route(
                    "/:society_id/:admin_id/send-reset-link",
                    post(handlers::society_admin::send_reset_link),
                )
                .layer(from_fn_with_state(state.clone(), middleware::require_admin)),
        );

    let system_routes = Router::new()
        .route("/health", get(handlers::system::health))
        .merge(
            Router::new()
                .route(
                    "/diagnostics/error",
                    post(handlers::system::diagnostics_error),
                )
                .route(
                    "/diagnostics/alert",
                    post(handlers::system::diagnostics_alert),
                )
                .layer(from_fn_with_state(state.clone(), middleware::require_admin)),
        );

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/registration", registration_routes)
        .nest("/user-auth", user_auth_routes)
        .nest("/society", society_routes)
        .nest("/society-admin", society_admin_routes)
        .nest("/system", system_routes);

    Router::new()
        .route("/", get(root))
        .nest("/api", api)
        .fallback(not_found)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::capture_errors,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(origin = %origin, error = %e, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "service": state.config.service_name,
        "status": "running",
    }))
}

/// Unmatched routes get the same failure envelope as every other error.
async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "success": false,
            "message": format!("Route {} not found", uri.path()),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}
