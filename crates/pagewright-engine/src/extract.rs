//! HTML document extraction from a growing assistant reply.
//!
//! The whole buffer is re-scanned after every delta. That keeps the result a
//! pure function of the buffer content: the same text always yields the same
//! [`ExtractionResult`], however it was chunked on the way in.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// A fenced block tagged `html`, closed by a later fence.
static FENCED_HTML: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```[ \t]*html\b[^\n]*\n(.*?)```").expect("Invalid regex pattern")
});

/// A raw document from its doctype or root tag to `</html>` or end of text.
static RAW_DOCUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(?:<!doctype\s+html\b|<html\b).*?(?:</html\s*>|\z)")
        .expect("Invalid regex pattern")
});

/// How an extracted document was found. Later variants outrank earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Confidence {
    /// Nothing that looks like a document yet.
    #[default]
    None,
    /// A raw doctype / `<html>` span, possibly still open.
    RawFallback,
    /// A complete fenced `html` block.
    Fenced,
}

impl Confidence {
    /// Short label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::RawFallback => "raw",
            Self::Fenced => "fenced",
        }
    }
}

/// Current best-known document in a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExtractionResult {
    /// Extracted document, if any.
    pub html: Option<String>,
    /// How it was found.
    pub confidence: Confidence,
}

impl ExtractionResult {
    /// Result for a buffer without any document.
    pub fn none() -> Self {
        Self::default()
    }

    fn found(html: &str, confidence: Confidence) -> Self {
        Self {
            html: Some(html.to_string()),
            confidence,
        }
    }

    /// Whether nothing was found.
    pub fn is_none(&self) -> bool {
        self.html.is_none()
    }
}

/// Extract the best document from `text`.
///
/// A fenced block only counts once its closing fence has arrived; until then
/// the raw-document scan runs so the preview keeps growing mid-stream. The
/// first closed fence with non-blank content wins, wherever it sits.
pub fn extract(text: &str) -> ExtractionResult {
    let fenced = FENCED_HTML
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|inner| inner.as_str().trim())
        .find(|html| !html.is_empty());
    if let Some(html) = fenced {
        return ExtractionResult::found(html, Confidence::Fenced);
    }

    if let Some(span) = RAW_DOCUMENT.find(text) {
        return ExtractionResult::found(span.as_str(), Confidence::RawFallback);
    }

    ExtractionResult::none()
}

/// Accumulates deltas of one turn and re-evaluates after each of them.
#[derive(Debug, Default)]
pub struct ContentExtractor {
    buffer: String,
    current: ExtractionResult,
}

impl ContentExtractor {
    /// Create an extractor with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delta and return the result for the whole buffer.
    pub fn push(&mut self, delta: &str) -> &ExtractionResult {
        self.buffer.push_str(delta);
        self.current = extract(&self.buffer);
        &self.current
    }

    /// Result as of the last delta.
    pub fn current(&self) -> &ExtractionResult {
        &self.current
    }

    /// Accumulated text so far.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Consume the extractor, keeping the accumulated text.
    pub fn into_buffer(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_debug_snapshot;

    const FENCED_REPLY: &str = "Here:\n```html\n<html><body>Hi</body></html>\n```\nEnjoy!";

    #[test]
    fn test_streamed_fenced_scenario() {
        let mut extractor = ContentExtractor::new();

        let first = extractor.push("Here:\n```html\n<html><bo").clone();
        assert_eq!(first.confidence, Confidence::RawFallback);
        assert_eq!(first.html.as_deref(), Some("<html><bo"));

        let second = extractor.push("dy>Hi</body></html>\n```");
        assert_debug_snapshot!(second, @r#"
        ExtractionResult {
            html: Some(
                "<html><body>Hi</body></html>",
            ),
            confidence: Fenced,
        }
        "#);
    }

    #[test]
    fn test_fenced_outranks_raw_doctype() {
        let text = "<!DOCTYPE html><html><body>raw</body></html>\n\n```html\n<p>fenced</p>\n```";
        let result = extract(text);
        assert_eq!(result.confidence, Confidence::Fenced);
        assert_eq!(result.html.as_deref(), Some("<p>fenced</p>"));
    }

    #[test]
    fn test_open_fence_is_never_fenced() {
        for text in [
            "```html\n<html><body>",
            "```html\n<div>no root tag yet",
            "```html\n",
            "intro ```HTML\n<!doctype html><html></html>",
        ] {
            assert_ne!(extract(text).confidence, Confidence::Fenced, "{text:?}");
        }
    }

    #[test]
    fn test_open_fence_falls_through_to_raw() {
        let result = extract("```html\n<!DOCTYPE html>\n<html lang=\"en\"><head>");
        assert_eq!(result.confidence, Confidence::RawFallback);
        assert_eq!(
            result.html.as_deref(),
            Some("<!DOCTYPE html>\n<html lang=\"en\"><head>")
        );
    }

    #[test]
    fn test_raw_stops_at_closing_tag() {
        let result = extract("Sure! <html><body>x</body></html> That's it.");
        assert_eq!(result.html.as_deref(), Some("<html><body>x</body></html>"));
        assert_eq!(result.confidence, Confidence::RawFallback);
    }

    #[test]
    fn test_html_prefixed_tags_are_not_documents() {
        assert!(extract("use <htmlish> tags").is_none());
        assert!(extract("<!doctype htmlx>").is_none());
    }

    #[test]
    fn test_fence_tag_is_case_insensitive() {
        let result = extract("```HTML\n<p>x</p>\n```");
        assert_eq!(result.confidence, Confidence::Fenced);
    }

    #[test]
    fn test_other_fences_are_ignored() {
        assert!(extract("```css\nbody { color: red; }\n```").is_none());
        assert!(extract("```htmlx\n<p>x</p>\n```").is_none());
    }

    #[test]
    fn test_empty_fence_falls_through() {
        assert!(extract("```html\n```").is_none());
    }

    #[test]
    fn test_later_fence_wins_over_raw_after_empty_fence() {
        let text = "```html\n```\n<!doctype html><html><body>raw</body></html>\n```html\n<p>real</p>\n```";
        let result = extract(text);
        assert_eq!(result.confidence, Confidence::Fenced);
        assert_eq!(result.html.as_deref(), Some("<p>real</p>"));
    }

    #[test]
    fn test_plain_text_is_none() {
        let mut extractor = ContentExtractor::new();
        assert!(extractor.push("Let me think about your bakery site").is_none());
        assert_eq!(extractor.current().confidence, Confidence::None);
    }

    #[test]
    fn test_incremental_matches_single_shot_for_every_split() {
        let expected = extract(FENCED_REPLY);
        let boundaries: Vec<usize> = FENCED_REPLY.char_indices().map(|(i, _)| i).collect();

        for &split in &boundaries {
            let mut extractor = ContentExtractor::new();
            extractor.push(&FENCED_REPLY[..split]);
            assert_eq!(extractor.push(&FENCED_REPLY[split..]), &expected);
        }

        // One character per delta.
        let mut extractor = ContentExtractor::new();
        for ch in FENCED_REPLY.chars() {
            extractor.push(&ch.to_string());
        }
        assert_eq!(extractor.current(), &expected);
        assert_eq!(extractor.buffer(), FENCED_REPLY);
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::Fenced > Confidence::RawFallback);
        assert!(Confidence::RawFallback > Confidence::None);
        assert_eq!(Confidence::RawFallback.label(), "raw");
    }
}
