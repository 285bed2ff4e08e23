//! Preview rendering.
//!
//! [`PreviewRenderer`] is the only writer of the rendering surface. It keeps
//! the current snapshot, skips identical updates, and refuses direct
//! interaction while a turn streams in or the divider is being dragged.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Document shown before anything has been generated (and after a clear).
pub const PLACEHOLDER_HTML: &str = "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Preview</title></head>\n<body style=\"font-family: sans-serif; display: flex; align-items: center; justify-content: center; height: 100vh; margin: 0; color: #888;\">\n<p>Your website will appear here.</p>\n</body>\n</html>\n";

/// Delay between clearing the surface and reassigning the document on a
/// forced reload.
pub const RELOAD_DELAY: Duration = Duration::from_millis(10);

/// An isolated place a document can be displayed on.
pub trait RenderSurface: Send {
    /// Replace the displayed document.
    fn load(&mut self, html: &str) -> Result<(), SurfaceError>;

    /// Show an empty document.
    fn clear(&mut self) -> Result<(), SurfaceError>;
}

/// Errors raised by a rendering surface.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    /// Writing the document failed.
    #[error("I/O error writing {path}: {source}")]
    Io {
        /// Target file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Surface backed by a standalone HTML file.
///
/// The file is opened by a browser as its own document, so generated scripts
/// never run inside this process. Writes go through a sibling temp file and a
/// rename, so a reader never sees a half-written document.
#[derive(Debug, Clone)]
pub struct FileSurface {
    path: PathBuf,
}

impl FileSurface {
    /// Create a surface writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, html: &str) -> Result<(), SurfaceError> {
        let io_err = |source| SurfaceError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = self.path.with_extension("html.tmp");
        std::fs::write(&tmp, html).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl RenderSurface for FileSurface {
    fn load(&mut self, html: &str) -> Result<(), SurfaceError> {
        self.write(html)
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.write("")
    }
}

/// In-memory surface. Records every assignment.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    document: String,
    history: Vec<String>,
}

impl MemorySurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently displayed document.
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Every document assigned so far, clears included (as empty strings).
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl RenderSurface for MemorySurface {
    fn load(&mut self, html: &str) -> Result<(), SurfaceError> {
        self.document = html.to_string();
        self.history.push(self.document.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.document.clear();
        self.history.push(String::new());
        Ok(())
    }
}

/// Why the preview refused an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InteractionBlocked {
    /// A generation turn is streaming into the preview.
    #[error("Preview is busy while the site is being generated. Please wait.")]
    TurnInFlight,
    /// The split divider is being dragged.
    #[error("Preview is locked while resizing the panels.")]
    Dragging,
}

#[derive(Debug)]
struct RendererState<S> {
    surface: S,
    snapshot: String,
    turn_in_flight: bool,
    dragging: bool,
}

/// Owner of the rendering surface and its snapshot.
#[derive(Debug)]
pub struct PreviewRenderer<S> {
    state: Mutex<RendererState<S>>,
}

impl<S: RenderSurface> PreviewRenderer<S> {
    /// Create a renderer and show the placeholder document.
    pub fn new(surface: S) -> Self {
        let renderer = Self {
            state: Mutex::new(RendererState {
                surface,
                snapshot: String::new(),
                turn_in_flight: false,
                dragging: false,
            }),
        };
        if let Err(e) = renderer.reset() {
            tracing::warn!(error = %e, "failed to show placeholder preview");
        }
        renderer
    }

    fn lock(&self) -> MutexGuard<'_, RendererState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the displayed document.
    ///
    /// Returns `false` without touching the surface when `html` is already
    /// displayed.
    pub fn update(&self, html: &str) -> Result<bool, SurfaceError> {
        let mut state = self.lock();
        if state.snapshot == html {
            return Ok(false);
        }
        state.surface.load(html)?;
        state.snapshot = html.to_string();
        Ok(true)
    }

    /// Show the placeholder document.
    pub fn reset(&self) -> Result<bool, SurfaceError> {
        self.update(PLACEHOLDER_HTML)
    }

    /// Re-run the current document from scratch.
    ///
    /// The surface is cleared first and the snapshot reassigned after
    /// [`RELOAD_DELAY`], so the host sees a new document rather than an
    /// unchanged assignment.
    pub async fn force_reload(&self) -> Result<(), SurfaceError> {
        self.lock().surface.clear()?;
        tokio::time::sleep(RELOAD_DELAY).await;
        let mut state = self.lock();
        let snapshot = state.snapshot.clone();
        state.surface.load(&snapshot)
    }

    /// Currently displayed document.
    pub fn snapshot(&self) -> String {
        self.lock().snapshot.clone()
    }

    /// Whether the placeholder is displayed.
    pub fn is_placeholder(&self) -> bool {
        self.lock().snapshot == PLACEHOLDER_HTML
    }

    /// Run `f` against the surface (read access for front ends and tests).
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.lock().surface)
    }

    /// Mark whether a generation turn is streaming.
    pub fn set_turn_in_flight(&self, in_flight: bool) {
        self.lock().turn_in_flight = in_flight;
    }

    /// Mark whether the split divider is being dragged.
    pub fn set_dragging(&self, dragging: bool) {
        self.lock().dragging = dragging;
    }

    /// Ask to interact with the preview directly.
    pub fn interact(&self) -> Result<(), InteractionBlocked> {
        let state = self.lock();
        let blocked = if state.turn_in_flight {
            InteractionBlocked::TurnInFlight
        } else if state.dragging {
            InteractionBlocked::Dragging
        } else {
            return Ok(());
        };
        tracing::warn!(reason = ?blocked, "preview interaction blocked");
        Err(blocked)
    }
}
