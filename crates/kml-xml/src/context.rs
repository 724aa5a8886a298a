//! Context for XML parsing with diagnostic collection.

use kml_error_reporting::{DiagnosticKind, DiagnosticMessage, FileId};

/// Collects diagnostics produced while parsing.
///
/// Warnings (such as dropped mixed content) are recorded even when the
/// parse succeeds, so callers can report them next to the result.
///
/// ```rust
/// use kml_xml::{parse_with_context, XmlParseContext};
///
/// let mut ctx = XmlParseContext::new();
/// let doc = parse_with_context("<kml><name>a</name>tail</kml>", &mut ctx).unwrap();
/// assert_eq!(doc.root.local_name(), "kml");
/// assert!(ctx.has_diagnostics());
/// assert!(!ctx.has_errors());
/// ```
#[derive(Debug, Default)]
pub struct XmlParseContext {
    /// File the positions in produced diagnostics refer to.
    pub file_id: FileId,
    diagnostics: Vec<DiagnosticMessage>,
}

impl XmlParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_file(file_id: FileId) -> Self {
        Self {
            file_id,
            diagnostics: Vec::new(),
        }
    }

    pub fn add_diagnostic(&mut self, diagnostic: DiagnosticMessage) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[DiagnosticMessage] {
        &self.diagnostics
    }

    /// Take all collected diagnostics, leaving the context empty.
    pub fn take_diagnostics(&mut self) -> Vec<DiagnosticMessage> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Check if any errors (not warnings) have been collected.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::Error)
    }
}
