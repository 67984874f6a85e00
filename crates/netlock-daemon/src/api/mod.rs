//! HTTP API
//!
//! All device, session and admin operations over JSON. Handlers hold no
//! state of their own; everything goes through the shared [`Registry`].

use std::path::Path;
use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{DaemonError, Result};
use crate::registry::Registry;

pub mod admin;
pub mod auth;
pub mod device;
pub mod login;
pub mod response;
pub mod status;

pub use response::StatusBody;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

/// Routes without transport layers
pub fn router(registry: Arc<Registry>) -> Router {
    let state = AppState { registry };

    Router::new()
        // Health check
        .route("/health", get(health))
        // Lock status
        .route("/api/status", get(status::overview).post(status::force_time_info))
        .route(
            "/api/status/:address",
            get(status::device_status).post(status::set_lock),
        )
        .route("/api/status/set/:address", post(status::set_commands))
        // Sessions
        .route("/api/login", get(login::check_token).put(login::change_password))
        .route("/api/login/token", get(login::issue_token))
        // Devices
        .route("/api/device", get(device::list).post(device::add))
        .route(
            "/api/device/:address",
            get(device::get).put(device::update).delete(device::remove),
        )
        // Admin
        .route("/api/admin", get(admin::settings).put(admin::update_settings))
        .route(
            "/api/admin/address",
            get(admin::addresses).post(admin::add_address),
        )
        .route("/api/admin/address/:address", delete(admin::remove_address))
        .with_state(state)
}

/// Full application: routes, CORS, request tracing and the optional front-end
pub fn app(registry: Arc<Registry>, origins: &[String], static_dir: Option<&Path>) -> Result<Router> {
    let mut app = router(registry);

    if let Some(dir) = static_dir {
        info!("Serving static files from {:?}", dir);
        app = app.fallback_service(ServeDir::new(dir));
    }

    Ok(app.layer(cors(origins)?).layer(TraceLayer::new_for_http()))
}

fn cors(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|_| DaemonError::Config(format!("Invalid CORS origin: {}", o)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(auth::TOKEN_HEADER),
            HeaderName::from_static(auth::PASSWORD_HEADER),
            HeaderName::from_static(auth::ADDRESS_HEADER),
        ]))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
