//! HTTP client for the relay's chat API.
//!
//! [`ChatBackend`] is the seam the session talks through; [`RelayClient`] is
//! the production implementation on top of `reqwest`.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use crate::chat::{ChatMessage, ChatReply, ChatRequest, ErrorBody};

/// Raw event-stream bytes of one streamed reply.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// The generation service as seen from a chat session.
pub trait ChatBackend: Send + Sync {
    /// Start a streamed reply for `messages`.
    ///
    /// `Ok(None)` means the backend reported success but gave nothing to read.
    fn open_stream(
        &self,
        messages: &[ChatMessage],
    ) -> impl Future<Output = Result<Option<ByteStream>, ClientError>> + Send;

    /// Request a single buffered reply for `messages`.
    fn complete(
        &self,
        messages: &[ChatMessage],
    ) -> impl Future<Output = Result<ChatReply, ClientError>> + Send;

    /// Ask the backend to forget its conversation memory.
    fn clear_memory(&self) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// Errors talking to the relay.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection, TLS, or body read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The relay answered with a failure status.
    #[error("relay returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error detail from the `{ error }` body, or the raw body.
        message: String,
    },
}

/// Client for a running relay.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    /// Create a client for the relay at `base_url` (e.g. `http://localhost:3000`).
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Relay base address.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Check that the relay is up.
    pub async fn health(&self) -> Result<(), ClientError> {
        let response = self.client.get(self.url("/health")).send().await?;
        check_status(response).await.map(|_| ())
    }
}

/// Turn a failure status into [`ClientError::Status`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body);
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

impl ChatBackend for RelayClient {
    async fn open_stream(
        &self,
        messages: &[ChatMessage],
    ) -> Result<Option<ByteStream>, ClientError> {
        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&ChatRequest::streamed(messages))
            .send()
            .await?;
        let response = check_status(response).await?;

        if response.content_length() == Some(0) {
            return Ok(None);
        }
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::from));
        Ok(Some(Box::pin(stream)))
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatReply, ClientError> {
        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&ChatRequest::buffered(messages))
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn clear_memory(&self) -> Result<(), ClientError> {
        let response = self.client.post(self.url("/api/chat/clear")).send().await?;
        check_status(response).await.map(|_| ())
    }
}
