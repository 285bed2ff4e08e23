//! HTTP handlers.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use pagewright_engine::ChatRequest;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::RelayError;
use crate::RelayState;

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /api/chat`: forward a chat request and relay the reply.
///
/// The body is checked against [`ChatRequest`] and then sent upstream as the
/// original bytes. Streamed replies are passed through chunk by chunk.
pub async fn chat(State(state): State<RelayState>, body: Bytes) -> Result<Response, RelayError> {
    let request: ChatRequest =
        serde_json::from_slice(&body).map_err(|e| RelayError::BadRequest(e.to_string()))?;
    debug!(
        messages = request.messages.len(),
        stream = request.stream,
        "forwarding chat request"
    );

    let response = state
        .client()
        .post(state.upstream_url("/api/chat"))
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .inspect_err(|e| warn!(error = %e, "backend unreachable"))?;
    let response = ensure_success(response).await?;

    if request.stream {
        let headers = [
            (CONTENT_TYPE, "text/event-stream"),
            (CACHE_CONTROL, "no-cache"),
            (CONNECTION, "keep-alive"),
        ];
        return Ok((headers, Body::from_stream(response.bytes_stream())).into_response());
    }

    let text = response.text().await?;
    let reply: Value = serde_json::from_str(&text).map_err(|e| {
        warn!(error = %e, "backend reply is not JSON");
        RelayError::InvalidReply(e.to_string())
    })?;
    Ok(Json(reply).into_response())
}

/// `POST /api/chat/clear`: ask the backend to forget the conversation.
pub async fn clear(State(state): State<RelayState>) -> Result<Json<Value>, RelayError> {
    let response = state
        .client()
        .post(state.upstream_url("/api/chat/clear"))
        .send()
        .await
        .inspect_err(|e| warn!(error = %e, "backend unreachable"))?;
    let response = ensure_success(response).await?;

    let text = response.text().await?;
    Ok(Json(
        serde_json::from_str(&text).unwrap_or_else(|_| json!({ "status": "ok" })),
    ))
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RelayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let err = RelayError::upstream(status.as_u16(), &body);
    warn!(upstream_status = status.as_u16(), error = %err, "backend returned an error");
    Err(err)
}
