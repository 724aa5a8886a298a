//! Builder API for diagnostic messages.
//!
//! Encodes the tidyverse structure: a title, a problem statement, a few
//! bulleted details and optional hints phrased as questions.

use crate::diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};
use crate::source::SourceInfo;

/// Builder for [`DiagnosticMessage`].
///
/// ```
/// use kml_error_reporting::DiagnosticMessageBuilder;
///
/// let msg = DiagnosticMessageBuilder::error("Unknown Namespace")
///     .with_code("K-4-1")
///     .problem("Element `foo` is in namespace `urn:x`")
///     .add_hint("Add the namespace to the builder table?")
///     .build();
/// assert_eq!(msg.code.as_deref(), Some("K-4-1"));
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosticMessageBuilder {
    message: DiagnosticMessage,
}

impl DiagnosticMessageBuilder {
    fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            message: DiagnosticMessage::new(kind, title),
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Info, title)
    }

    /// Error with code K-0-99 carrying the file and line that raised it.
    ///
    /// Used through the [`generic_error!`](crate::generic_error) macro.
    pub fn generic_error(message: impl Into<String>, file: &str, line: u32) -> DiagnosticMessage {
        Self::error(format!("{} ({}:{})", message.into(), file, line))
            .with_code("K-0-99")
            .build()
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.message.code = Some(code.into());
        self
    }

    /// Set the problem statement (what went wrong).
    pub fn problem(mut self, problem: impl Into<MessageContent>) -> Self {
        self.message.problem = Some(problem.into());
        self
    }

    /// Add an error detail (✖ bullet).
    pub fn add_detail(self, detail: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Error, detail.into(), None)
    }

    /// Add an error detail pointing at its own source range.
    pub fn add_detail_at(self, detail: impl Into<MessageContent>, location: SourceInfo) -> Self {
        self.push_detail(DetailKind::Error, detail.into(), Some(location))
    }

    /// Add an info detail (ℹ bullet).
    pub fn add_info(self, info: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Info, info.into(), None)
    }

    /// Add a note detail (• bullet).
    pub fn add_note(self, note: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Note, note.into(), None)
    }

    /// Add a hint. Hints should end with a question mark.
    pub fn add_hint(mut self, hint: impl Into<MessageContent>) -> Self {
        self.message.hints.push(hint.into());
        self
    }

    pub fn with_location(mut self, location: SourceInfo) -> Self {
        self.message.location = Some(location);
        self
    }

    /// Like [`with_location`](Self::with_location) but ignores `None`.
    pub fn with_optional_location(mut self, location: Option<SourceInfo>) -> Self {
        if location.is_some() {
            self.message.location = location;
        }
        self
    }

    pub fn build(self) -> DiagnosticMessage {
        self.message
    }

    fn push_detail(
        mut self,
        kind: DetailKind,
        content: MessageContent,
        location: Option<SourceInfo>,
    ) -> Self {
        self.message.details.push(DetailItem {
            kind,
            content,
            location,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FileId;

    #[test]
    fn test_builder_collects_parts_in_order() {
        let msg = DiagnosticMessageBuilder::warning("Mixed Content Ignored")
            .with_code("K-1-8")
            .problem("Text after the first child is dropped")
            .add_detail("found `tail` after <name>")
            .add_info("element is <Placemark>")
            .add_note("lxml calls this the tail")
            .add_hint("Move the text into its own element?")
            .build();

        assert_eq!(msg.kind, DiagnosticKind::Warning);
        assert_eq!(msg.details.len(), 3);
        assert_eq!(msg.details[0].kind, DetailKind::Error);
        assert_eq!(msg.details[1].kind, DetailKind::Info);
        assert_eq!(msg.details[2].kind, DetailKind::Note);
        assert_eq!(msg.hints.len(), 1);
        assert!(msg.location.is_none());
    }

    #[test]
    fn test_optional_location() {
        let loc = SourceInfo::original(FileId(0), 3, 9);
        let msg = DiagnosticMessageBuilder::error("x")
            .with_optional_location(None)
            .build();
        assert!(msg.location.is_none());

        let msg = DiagnosticMessageBuilder::error("x")
            .with_optional_location(Some(loc.clone()))
            .build();
        assert_eq!(msg.location, Some(loc));
    }

    #[test]
    fn test_generic_error_has_code_and_position() {
        let msg = DiagnosticMessageBuilder::generic_error("boom", "src/lib.rs", 12);
        assert_eq!(msg.code.as_deref(), Some("K-0-99"));
        assert!(msg.title.contains("boom"));
        assert!(msg.title.contains("src/lib.rs:12"));
    }
}
