//! Admin settings and admin address endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};

use netlock_core::{Address, AdminSettings, AdminSettingsUpdate};

use super::auth::Admin;
use super::response::{json_body, status};
use super::AppState;
use crate::Result;

#[derive(Debug, Serialize, Deserialize)]
pub struct AddressRequest {
    #[serde(default)]
    pub address: String,
}

pub async fn settings(State(state): State<AppState>) -> Json<AdminSettings> {
    Json(state.registry.admin_settings().await)
}

pub async fn update_settings(
    _admin: Admin,
    State(state): State<AppState>,
    payload: std::result::Result<Json<AdminSettingsUpdate>, JsonRejection>,
) -> Result<Json<AdminSettings>> {
    let update = json_body(payload)?;
    Ok(Json(state.registry.update_admin_settings(update).await?))
}

pub async fn addresses(_admin: Admin, State(state): State<AppState>) -> Json<Vec<Address>> {
    Json(state.registry.admin_addresses().await)
}

pub async fn add_address(
    _admin: Admin,
    State(state): State<AppState>,
    payload: std::result::Result<Json<AddressRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddressRequest>)> {
    let request = json_body(payload)?;
    let address = state.registry.add_admin_address(&request.address).await?;
    Ok((
        StatusCode::CREATED,
        Json(AddressRequest {
            address: address.to_string(),
        }),
    ))
}

pub async fn remove_address(
    _admin: Admin,
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response> {
    let address = Address::parse(&raw)?;
    state.registry.remove_admin_address(&address).await?;
    Ok(status(StatusCode::OK, "Admin address removed"))
}
