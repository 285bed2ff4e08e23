//! pagewright-engine: Headless stream-to-preview engine
//!
//! This crate provides the core of pagewright, including:
//! - Event-stream ingestion of streamed assistant replies
//! - HTML document extraction from partial replies
//! - Preview rendering onto an isolated surface
//! - Split-pane drag state
//! - Chat sessions and the relay client

pub mod chat;
pub mod client;
pub mod config;
pub mod extract;
pub mod ingest;
pub mod layout;
pub mod preview;
pub mod session;

// Re-export commonly used types
pub use chat::{ChatMessage, ChatReply, ChatRequest, ErrorBody, Role, FALLBACK_REPLY, GREETING};
pub use client::{ByteStream, ChatBackend, ClientError, RelayClient};
pub use config::{Config, ConfigError};
pub use extract::{extract, Confidence, ContentExtractor, ExtractionResult};
pub use ingest::{IngestError, StreamEvent, StreamIngestor};
pub use layout::{
    CaptureGuard, ContainerBounds, PaneLayout, PointerCapture, SplitPaneController,
    MAX_LEFT_PERCENT, MIN_LEFT_PERCENT,
};
pub use preview::{
    FileSurface, InteractionBlocked, MemorySurface, PreviewRenderer, RenderSurface, SurfaceError,
    PLACEHOLDER_HTML,
};
pub use session::{ChatSession, SessionError, TurnError, TurnOutcome};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
