//! Device lock status endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};

use netlock_core::{Address, Device, DeviceCommands, LockOverview, LockStatus, TimeRequest};

use super::auth::Admin;
use super::response::{json_body, status};
use super::AppState;
use crate::Result;

/// Status of one device; polling also marks it online
pub async fn device_status(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<LockStatus>> {
    let address = Address::parse(&raw)?;
    Ok(Json(state.registry.device_status(&address).await?))
}

pub async fn overview(State(state): State<AppState>) -> Json<LockOverview> {
    Json(state.registry.overview().await)
}

/// Set, extend, shorten or clear a device's lock timer
pub async fn set_lock(
    _admin: Admin,
    State(state): State<AppState>,
    Path(raw): Path<String>,
    payload: std::result::Result<Json<TimeRequest>, JsonRejection>,
) -> Result<Response> {
    let address = Address::parse(&raw)?;
    let change = json_body(payload)?.parse()?;
    let result = state.registry.set_lock(&address, change).await?;
    Ok(status(StatusCode::CREATED, result.kind.to_string()))
}

/// Show the remaining time on every device for a while
pub async fn force_time_info(_admin: Admin, State(state): State<AppState>) -> Result<Response> {
    state.registry.force_time_info().await?;
    Ok(status(StatusCode::OK, "Time info shown"))
}

pub async fn set_commands(
    _admin: Admin,
    State(state): State<AppState>,
    Path(raw): Path<String>,
    payload: std::result::Result<Json<DeviceCommands>, JsonRejection>,
) -> Result<Json<Device>> {
    let address = Address::parse(&raw)?;
    let commands = json_body(payload)?;
    Ok(Json(state.registry.set_commands(&address, commands).await?))
}
