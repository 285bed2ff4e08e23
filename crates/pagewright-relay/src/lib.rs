//! pagewright-relay: pass-through relay to the generation backend
//!
//! The relay exposes the chat API to clients and forwards each request to the
//! upstream backend. Buffered replies are returned as JSON; streamed replies
//! are forwarded byte for byte so event framing is never altered.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use pagewright_engine::{Config, ConfigError};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::RelayError;

/// Shared handler state. Holds no per-request data.
#[derive(Debug, Clone)]
pub struct RelayState {
    client: reqwest::Client,
    upstream: Arc<str>,
}

impl RelayState {
    /// State forwarding to the backend at `upstream`.
    pub fn new(upstream: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            upstream: upstream.trim_end_matches('/').into(),
        }
    }

    /// Upstream base address.
    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub(crate) fn upstream_url(&self, path: &str) -> String {
        format!("{}{path}", self.upstream)
    }
}

/// Build the relay router.
pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/chat", post(handlers::chat))
        .route("/api/chat/clear", post(handlers::clear))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Errors starting the relay.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// Bad listen address.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Could not bind or serve.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bind to `config.bind` and serve until Ctrl+C.
pub async fn run(config: &Config) -> Result<(), ServeError> {
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(
        addr = %listener.local_addr()?,
        upstream = %config.backend_url,
        "relay listening"
    );
    serve(listener, RelayState::new(&config.backend_url)).await?;
    Ok(())
}

/// Serve on an already bound listener until Ctrl+C.
pub async fn serve(listener: TcpListener, state: RelayState) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down relay"),
        Err(e) => {
            tracing::warn!(error = %e, "cannot listen for Ctrl+C; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_url() {
        let state = RelayState::new("http://localhost:8000/");
        assert_eq!(state.upstream(), "http://localhost:8000");
        assert_eq!(
            state.upstream_url("/api/chat/clear"),
            "http://localhost:8000/api/chat/clear"
        );
    }
}
