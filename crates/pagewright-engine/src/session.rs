//! Chat session orchestration.
//!
//! A [`ChatSession`] owns the message log and the busy flag, runs one turn
//! at a time against a [`ChatBackend`], and pushes every document found in
//! the streaming reply to its [`PreviewRenderer`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::StreamExt;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::chat::{ChatMessage, FALLBACK_REPLY};
use crate::client::{ChatBackend, ClientError};
use crate::extract::{ContentExtractor, ExtractionResult};
use crate::ingest::{IngestError, StreamEvent, StreamIngestor};
use crate::preview::{PreviewRenderer, RenderSurface};

/// Why a turn could not be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// A previous turn is still streaming.
    #[error("a reply is still being generated")]
    Busy,
    /// The message was empty or whitespace.
    #[error("message is empty")]
    EmptyMessage,
}

/// Why a started turn failed. The session recovers from all of these.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// Network failure or failure status.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// Success was reported but there was no body to read.
    #[error("backend returned no response stream")]
    MissingStream,
    /// The stream broke mid-reply.
    #[error(transparent)]
    Stream(#[from] IngestError),
}

/// Result of a turn that was started.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The stream ended normally; `reply` was appended.
    Completed {
        /// Full assistant text.
        reply: String,
        /// Extraction result for the full text.
        extraction: ExtractionResult,
    },
    /// The turn failed; the fallback reply was appended.
    Failed(TurnError),
}

#[derive(Debug)]
struct Store {
    messages: Vec<ChatMessage>,
    busy: bool,
    /// Text of the in-flight turn.
    pending: Option<String>,
    /// Bumped on every clear so late turns cannot write into a new conversation.
    epoch: u64,
}

struct Inner<B, S> {
    backend: B,
    renderer: Arc<PreviewRenderer<S>>,
    store: Mutex<Store>,
}

impl<B, S> Inner<B, S> {
    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the busy flag however the turn ends, including the turn future
/// being dropped half-way.
struct BusyGuard<'a, B, S: RenderSurface> {
    inner: &'a Inner<B, S>,
}

impl<B, S: RenderSurface> Drop for BusyGuard<'_, B, S> {
    fn drop(&mut self) {
        {
            let mut store = self.inner.lock();
            store.busy = false;
            store.pending = None;
        }
        self.inner.renderer.set_turn_in_flight(false);
    }
}

/// Handle to a conversation. Clones share the same conversation.
pub struct ChatSession<B, S> {
    inner: Arc<Inner<B, S>>,
}

impl<B, S> Clone for ChatSession<B, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: ChatBackend, S: RenderSurface> ChatSession<B, S> {
    /// Start a conversation with the greeting and a renderer over `surface`.
    pub fn new(backend: B, surface: S) -> Self {
        Self::with_renderer(backend, Arc::new(PreviewRenderer::new(surface)))
    }

    /// Start a conversation that drives an existing renderer.
    pub fn with_renderer(backend: B, renderer: Arc<PreviewRenderer<S>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                renderer,
                store: Mutex::new(Store {
                    messages: vec![ChatMessage::greeting()],
                    busy: false,
                    pending: None,
                    epoch: 0,
                }),
            }),
        }
    }

    /// Messages so far, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner.lock().messages.clone()
    }

    /// Whether a turn is in flight.
    pub fn is_busy(&self) -> bool {
        self.inner.lock().busy
    }

    /// Text received so far for the in-flight turn.
    pub fn pending_text(&self) -> Option<String> {
        self.inner.lock().pending.clone()
    }

    /// Renderer this session feeds.
    pub fn renderer(&self) -> &Arc<PreviewRenderer<S>> {
        &self.inner.renderer
    }

    /// Backend this session talks to.
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Run one turn for `text`.
    ///
    /// Rejected without touching the log while another turn is in flight
    /// or when `text` is blank. Once started, the turn always ends with an
    /// assistant message: the streamed reply, or [`FALLBACK_REPLY`].
    pub async fn send(&self, text: &str) -> Result<TurnOutcome, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let (history, epoch) = {
            let mut store = self.inner.lock();
            if store.busy {
                return Err(SessionError::Busy);
            }
            store.messages.push(ChatMessage::user(text));
            store.busy = true;
            store.pending = Some(String::new());
            (store.messages.clone(), store.epoch)
        };
        let _busy = BusyGuard { inner: &self.inner };
        self.inner.renderer.set_turn_in_flight(true);

        let turn_id = Uuid::new_v4();
        let result = self
            .run_turn(&history, epoch)
            .instrument(info_span!("turn", %turn_id, history = history.len()))
            .await;

        let (content, outcome) = match result {
            Ok((reply, extraction)) => {
                info!(%turn_id, chars = reply.len(), confidence = ?extraction.confidence, "turn completed");
                (reply.clone(), TurnOutcome::Completed { reply, extraction })
            }
            Err(e) => {
                warn!(%turn_id, error = %e, "turn failed");
                (FALLBACK_REPLY.to_string(), TurnOutcome::Failed(e))
            }
        };

        let mut store = self.inner.lock();
        if store.epoch == epoch {
            store.messages.push(ChatMessage::assistant(content));
        } else {
            debug!(%turn_id, "conversation was cleared during the turn; reply dropped");
        }
        Ok(outcome)
    }

    async fn run_turn(
        &self,
        history: &[ChatMessage],
        epoch: u64,
    ) -> Result<(String, ExtractionResult), TurnError> {
        let stream = self
            .inner
            .backend
            .open_stream(history)
            .await?
            .ok_or(TurnError::MissingStream)?;

        let mut ingestor = StreamIngestor::new(stream);
        let mut extractor = ContentExtractor::new();

        while let Some(event) = ingestor.next().await {
            match event {
                StreamEvent::Delta(delta) => {
                    let result = extractor.push(&delta);
                    let current = {
                        let mut store = self.inner.lock();
                        let current = store.epoch == epoch;
                        if current {
                            store.pending.get_or_insert_with(String::new).push_str(&delta);
                        }
                        current
                    };
                    if let (true, Some(html)) = (current, result.html.as_deref()) {
                        if let Err(e) = self.inner.renderer.update(html) {
                            warn!(error = %e, "failed to update preview");
                        }
                    }
                }
                StreamEvent::End => break,
                StreamEvent::Error(e) => return Err(e.into()),
            }
        }

        if ingestor.malformed_lines() > 0 {
            debug!(skipped = ingestor.malformed_lines(), "malformed lines skipped");
        }
        let extraction = extractor.current().clone();
        Ok((extractor.into_buffer(), extraction))
    }

    /// Reset to a fresh conversation.
    ///
    /// The log and the preview are reset immediately; the backend is then
    /// asked to drop its memory, and a refusal is only logged.
    pub async fn clear(&self) {
        {
            let mut store = self.inner.lock();
            store.messages = vec![ChatMessage::greeting()];
            store.pending = None;
            store.epoch += 1;
        }
        if let Err(e) = self.inner.renderer.reset() {
            warn!(error = %e, "failed to reset preview");
        }
        if let Err(e) = self.inner.backend.clear_memory().await {
            warn!(error = %e, "backend did not clear conversation memory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatReply, Role, GREETING};
    use crate::client::ByteStream;
    use crate::preview::{MemorySurface, PLACEHOLDER_HTML};
    use bytes::Bytes;
    use futures_util::stream;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// What the scripted backend does for the next turn.
    enum Script {
        Chunks(Vec<&'static str>),
        Status(u16, &'static str),
        NoStream,
        BrokenStream,
        Stall,
        /// Sends one chunk once the gate is opened.
        Gated(Arc<Notify>, &'static str),
    }

    #[derive(Default)]
    struct ScriptedBackend {
        turns: Mutex<VecDeque<Script>>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
        clears: AtomicUsize,
        refuse_clear: bool,
    }

    impl ScriptedBackend {
        fn with(turns: Vec<Script>) -> Self {
            Self {
                turns: Mutex::new(turns.into()),
                ..Self::default()
            }
        }
    }

    impl ChatBackend for ScriptedBackend {
        async fn open_stream(
            &self,
            messages: &[ChatMessage],
        ) -> Result<Option<ByteStream>, ClientError> {
            self.requests.lock().unwrap().push(messages.to_vec());
            let script = self.turns.lock().unwrap().pop_front().expect("no scripted turn");
            match script {
                Script::Chunks(chunks) => {
                    let items: Vec<Result<Bytes, ClientError>> = chunks
                        .into_iter()
                        .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                        .collect();
                    Ok(Some(Box::pin(stream::iter(items))))
                }
                Script::Status(status, message) => Err(ClientError::Status {
                    status,
                    message: message.into(),
                }),
                Script::NoStream => Ok(None),
                Script::BrokenStream => {
                    let items: Vec<Result<Bytes, ClientError>> = vec![
                        Ok(Bytes::from_static(b"data: {\"content\":\"partial\"}\n")),
                        Err(ClientError::Status {
                            status: 0,
                            message: "connection reset".into(),
                        }),
                    ];
                    Ok(Some(Box::pin(stream::iter(items))))
                }
                Script::Stall => Ok(Some(Box::pin(stream::pending::<Result<Bytes, ClientError>>()))),
                Script::Gated(gate, chunk) => Ok(Some(Box::pin(stream::once(async move {
                    gate.notified().await;
                    Ok::<_, ClientError>(Bytes::from_static(chunk.as_bytes()))
                })))),
            }
        }

        async fn complete(&self, _messages: &[ChatMessage]) -> Result<ChatReply, ClientError> {
            Ok(ChatReply {
                role: Role::Assistant,
                content: "buffered".into(),
            })
        }

        async fn clear_memory(&self) -> Result<(), ClientError> {
            self.clears.fetch_add(1, Ordering::SeqCst);
            if self.refuse_clear {
                Err(ClientError::Status {
                    status: 500,
                    message: "no memory to clear".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn session(turns: Vec<Script>) -> ChatSession<ScriptedBackend, MemorySurface> {
        ChatSession::new(ScriptedBackend::with(turns), MemorySurface::new())
    }

    async fn wait_until_busy(session: &ChatSession<ScriptedBackend, MemorySurface>) {
        for _ in 0..200 {
            if session.is_busy() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("turn never started");
    }

    #[tokio::test]
    async fn test_streamed_turn_updates_preview_and_log() {
        let session = session(vec![Script::Chunks(vec![
            "data: {\"content\":\"Here:\\n```html\\n<html><bo\"}\n",
            "data: {\"content\":\"dy>Hi</body></html>\\n```\"}\n",
            "data: [DONE]\n",
        ])]);

        let outcome = session.send("Make me a page").await.unwrap();
        let TurnOutcome::Completed { reply, extraction } = outcome else {
            panic!("turn failed");
        };
        assert_eq!(reply, "Here:\n```html\n<html><body>Hi</body></html>\n```");
        assert_eq!(extraction.html.as_deref(), Some("<html><body>Hi</body></html>"));

        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[2].content, reply);
        assert!(!session.is_busy());
        assert_eq!(session.pending_text(), None);

        // Placeholder, then the raw partial, then the fenced document.
        session.renderer().with_surface(|s| {
            assert_eq!(
                s.history(),
                &[
                    PLACEHOLDER_HTML.to_string(),
                    "<html><bo".to_string(),
                    "<html><body>Hi</body></html>".to_string(),
                ]
            );
        });
    }

    #[tokio::test]
    async fn test_request_carries_full_history() {
        let session = session(vec![
            Script::Chunks(vec!["data: {\"content\":\"one\"}\n", "data: [DONE]\n"]),
            Script::Chunks(vec!["data: {\"content\":\"two\"}\n", "data: [DONE]\n"]),
        ]);
        session.send("first").await.unwrap();
        session.send("second").await.unwrap();

        let requests = session.backend().requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].len(), 4);
        assert_eq!(requests[1][0].content, GREETING);
        assert_eq!(requests[1][3].content, "second");
    }

    #[tokio::test]
    async fn test_malformed_line_between_deltas() {
        let session = session(vec![Script::Chunks(vec![
            "data: {\"content\":\"<html>\"}\n",
            "data: {not json}\n",
            "data: {\"content\":\"</html>\"}\n",
            "data: [DONE]\n",
        ])]);
        session.send("go").await.unwrap();
        assert_eq!(session.messages()[2].content, "<html></html>");
        assert_eq!(session.renderer().snapshot(), "<html></html>");
    }

    #[tokio::test]
    async fn test_failures_append_fallback_and_clear_busy() {
        let session = session(vec![
            Script::Status(429, "rate limited"),
            Script::NoStream,
            Script::BrokenStream,
        ]);

        let first = session.send("a").await.unwrap();
        assert!(matches!(first, TurnOutcome::Failed(TurnError::Client(_))));
        let second = session.send("b").await.unwrap();
        assert!(matches!(second, TurnOutcome::Failed(TurnError::MissingStream)));
        let third = session.send("c").await.unwrap();
        assert!(matches!(third, TurnOutcome::Failed(TurnError::Stream(_))));

        let messages = session.messages();
        assert_eq!(messages.len(), 7);
        for reply in [&messages[2], &messages[4], &messages[6]] {
            assert_eq!(reply.role, Role::Assistant);
            assert_eq!(reply.content, FALLBACK_REPLY);
        }
        assert!(!session.is_busy());
        assert!(session.renderer().interact().is_ok());
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let session = session(vec![]);
        assert_eq!(session.send("   ").await.unwrap_err(), SessionError::EmptyMessage);
        assert_eq!(session.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_busy_rejects_new_turn_without_mutation() {
        let session = session(vec![Script::Stall]);
        let running = tokio::spawn({
            let session = session.clone();
            async move { session.send("slow one").await }
        });
        wait_until_busy(&session).await;

        let before = session.messages();
        assert_eq!(session.send("impatient").await.unwrap_err(), SessionError::Busy);
        assert_eq!(session.messages(), before);
        assert_eq!(before.len(), 2);

        running.abort();
        let _ = running.await;
    }

    #[tokio::test]
    async fn test_stalled_stream_keeps_session_busy() {
        // No read timeout: a backend that never sends keeps the turn open.
        let session = session(vec![Script::Stall]);
        let running = tokio::spawn({
            let session = session.clone();
            async move { session.send("hello?").await }
        });
        wait_until_busy(&session).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(session.is_busy());
        assert_eq!(
            session.renderer().interact(),
            Err(crate::preview::InteractionBlocked::TurnInFlight)
        );

        // Dropping the turn future still releases the busy flag.
        running.abort();
        let _ = running.await;
        assert!(!session.is_busy());
        assert!(session.renderer().interact().is_ok());
    }

    #[tokio::test]
    async fn test_clear_resets_log_and_preview() {
        let session = session(vec![
            Script::Chunks(vec!["data: {\"content\":\"<html>a</html>\"}\n", "data: [DONE]\n"]),
            Script::Chunks(vec!["data: {\"content\":\"more\"}\n", "data: [DONE]\n"]),
        ]);
        session.send("one").await.unwrap();
        session.send("two").await.unwrap();
        assert_eq!(session.messages().len(), 5);
        assert!(!session.renderer().is_placeholder());

        session.clear().await;

        let messages = session.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, GREETING);
        assert!(session.renderer().is_placeholder());
        assert_eq!(session.backend().clears.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clear_survives_backend_refusal() {
        let backend = ScriptedBackend {
            refuse_clear: true,
            ..ScriptedBackend::default()
        };
        let session = ChatSession::new(backend, MemorySurface::new());
        session.clear().await;
        assert_eq!(session.messages().len(), 1);
        assert!(session.renderer().is_placeholder());
    }

    #[tokio::test]
    async fn test_clear_during_turn_drops_late_reply() {
        let gate = Arc::new(Notify::new());
        let session = session(vec![Script::Gated(
            Arc::clone(&gate),
            "data: {\"content\":\"```html\\n<p>late</p>\\n```\"}\ndata: [DONE]\n",
        )]);
        let running = tokio::spawn({
            let session = session.clone();
            async move { session.send("slow").await }
        });
        wait_until_busy(&session).await;

        session.clear().await;
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.pending_text(), None);

        gate.notify_one();
        let outcome = running.await.unwrap().unwrap();
        assert!(matches!(outcome, TurnOutcome::Completed { .. }));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].content, GREETING);
        assert_eq!(session.pending_text(), None);
        assert!(session.renderer().is_placeholder());
        assert!(!session.is_busy());
    }
}
