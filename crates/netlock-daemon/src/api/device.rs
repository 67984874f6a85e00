//! Device registry endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};

use netlock_core::{Address, Device, DeviceUpdate, NewDevice};

use super::auth::Admin;
use super::response::{json_body, status};
use super::AppState;
use crate::Result;

pub async fn list(State(state): State<AppState>) -> Json<Vec<Device>> {
    Json(state.registry.devices().await)
}

pub async fn get(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Json<Device>> {
    let address = Address::parse(&raw)?;
    Ok(Json(state.registry.device(&address).await?))
}

pub async fn add(
    _admin: Admin,
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewDevice>, JsonRejection>,
) -> Result<(StatusCode, Json<Device>)> {
    let request = json_body(payload)?;
    let device = state.registry.add_device(request).await?;
    Ok((StatusCode::CREATED, Json(device)))
}

pub async fn update(
    _admin: Admin,
    State(state): State<AppState>,
    Path(raw): Path<String>,
    payload: std::result::Result<Json<DeviceUpdate>, JsonRejection>,
) -> Result<Json<Device>> {
    let address = Address::parse(&raw)?;
    let update = json_body(payload)?;
    Ok(Json(state.registry.update_device(&address, update).await?))
}

pub async fn remove(
    _admin: Admin,
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response> {
    let address = Address::parse(&raw)?;
    state.registry.remove_device(&address).await?;
    Ok(status(StatusCode::OK, "Device removed"))
}
