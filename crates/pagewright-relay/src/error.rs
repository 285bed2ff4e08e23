//! Relay error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pagewright_engine::ErrorBody;

/// Used when the upstream failed without saying why.
pub const GENERIC_DETAIL: &str = "Failed to get a response from the backend";

/// A request the relay could not complete. Every variant renders as
/// `{ "error": <detail> }`.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The client's body is not a chat request.
    #[error("invalid request body: {0}")]
    BadRequest(String),

    /// The upstream answered with a failure status.
    #[error("{detail}")]
    Upstream {
        /// Status to relay to the client.
        status: StatusCode,
        /// Detail taken from the upstream body.
        detail: String,
    },

    /// The upstream answered with success but its body is not JSON.
    #[error("backend sent an invalid reply: {0}")]
    InvalidReply(String),

    /// The upstream could not be reached, or its body could not be read.
    #[error("backend unavailable: {0}")]
    Unreachable(#[from] reqwest::Error),
}

impl RelayError {
    /// Build an upstream failure from its status and raw body.
    pub fn upstream(status: u16, body: &str) -> Self {
        let status = StatusCode::from_u16(status)
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        Self::Upstream {
            status,
            detail: upstream_detail(body),
        }
    }

    /// Status code sent to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => *status,
            Self::InvalidReply(_) | Self::Unreachable(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Pick the most useful message out of an upstream error body: its `detail`
/// field, then its `error` field, then the raw text.
pub fn upstream_detail(body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(body) {
        for key in ["detail", "error"] {
            match map.get(key) {
                Some(serde_json::Value::String(s)) if !s.trim().is_empty() => return s.clone(),
                Some(serde_json::Value::Null) | None => {}
                Some(serde_json::Value::String(_)) => {}
                Some(other) => return other.to_string(),
            }
        }
    }
    let raw = body.trim();
    if raw.is_empty() {
        GENERIC_DETAIL.to_string()
    } else {
        raw.to_string()
    }
}
