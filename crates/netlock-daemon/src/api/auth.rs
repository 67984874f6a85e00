//! Admin privilege checks
//!
//! A caller is an admin when it presents a valid `token` header, or a
//! `mac_address` header naming at least one address in the admin set.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use tracing::debug;

use netlock_core::{parse_address_list, Error as CoreError};

use super::AppState;
use crate::error::{DaemonError, Result};

pub const TOKEN_HEADER: &str = "token";
pub const PASSWORD_HEADER: &str = "password";
pub const ADDRESS_HEADER: &str = "mac_address";

/// Non-empty string value of a header
pub fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Extractor that only succeeds for admin callers
#[derive(Debug, Clone, Copy)]
pub struct Admin;

#[async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = DaemonError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        authorize(state, &parts.headers).await?;
        Ok(Admin)
    }
}

async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<()> {
    let token = header(headers, TOKEN_HEADER);
    let addresses = header(headers, ADDRESS_HEADER);
    if token.is_none() && addresses.is_none() {
        return Err(CoreError::NoTokenProvided.into());
    }

    if let Some(Ok(addresses)) = addresses.map(parse_address_list) {
        if state.registry.is_admin_any(&addresses).await {
            debug!("Admin by address {:?}", addresses);
            return Ok(());
        }
    }

    if let Some(token) = token {
        if matches!(state.registry.check_token(token).await, Ok(true)) {
            return Ok(());
        }
    }

    Err(DaemonError::Unauthorized("Invalid token".to_string()))
}
