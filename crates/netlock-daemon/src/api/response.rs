//! Response bodies and error mapping

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use netlock_core::Error as CoreError;

use crate::error::DaemonError;

/// `{code, message}` body used for status-only responses and errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBody {
    pub code: u16,
    pub message: String,
}

pub fn status(code: StatusCode, message: impl Into<String>) -> Response {
    let body = StatusBody {
        code: code.as_u16(),
        message: message.into(),
    };
    (code, Json(body)).into_response()
}

/// HTTP status for a daemon error
pub fn status_code(err: &DaemonError) -> StatusCode {
    match err {
        DaemonError::Core(CoreError::Crypto(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        DaemonError::Core(e) if e.is_not_found() => StatusCode::NOT_FOUND,
        DaemonError::Core(_) | DaemonError::BadRequest(_) => StatusCode::BAD_REQUEST,
        DaemonError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DaemonError::Io(_)
        | DaemonError::Serialization(_)
        | DaemonError::Store(_)
        | DaemonError::Crypto(_)
        | DaemonError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for DaemonError {
    fn into_response(self) -> Response {
        let code = status_code(&self);
        if code.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        status(code, self.to_string())
    }
}

impl From<JsonRejection> for DaemonError {
    fn from(rejection: JsonRejection) -> Self {
        DaemonError::BadRequest(rejection.body_text())
    }
}

/// Unwrap a JSON body, turning extractor rejections into a `{code, message}` 400
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> crate::Result<T> {
    let Json(value) = payload?;
    Ok(value)
}
