//! Admin session endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use netlock_core::{Error as CoreError, LoginOutcome, Token};

use super::auth::{header, Admin, PASSWORD_HEADER, TOKEN_HEADER};
use super::response::{json_body, status};
use super::AppState;
use crate::Result;

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: Token,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityResponse {
    pub is_valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    #[serde(default)]
    password: String,
}

/// Exchange the `password` header for a token
pub async fn issue_token(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let password = header(&headers, PASSWORD_HEADER).ok_or(CoreError::NoPasswordProvided)?;

    match state.registry.login(password).await? {
        LoginOutcome::Issued { token, .. } => Ok(Json(TokenResponse { token }).into_response()),
        LoginOutcome::Rejected => {
            warn!("Login rejected: wrong password");
            Ok((
                StatusCode::UNAUTHORIZED,
                Json(ValidityResponse { is_valid: false }),
            )
                .into_response())
        }
    }
}

/// Check the `token` header
pub async fn check_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ValidityResponse>> {
    let token = header(&headers, TOKEN_HEADER).ok_or(CoreError::NoTokenProvided)?;
    let is_valid = state.registry.check_token(token).await?;
    Ok(Json(ValidityResponse { is_valid }))
}

pub async fn change_password(
    _admin: Admin,
    State(state): State<AppState>,
    payload: std::result::Result<Json<PasswordRequest>, JsonRejection>,
) -> Result<Response> {
    let request = json_body(payload)?;
    state.registry.change_password(&request.password).await?;
    Ok(status(StatusCode::OK, "Password changed"))
}
