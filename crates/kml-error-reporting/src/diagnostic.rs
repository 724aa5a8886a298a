//! Core diagnostic message types.
//!
//! This module defines the structures for representing diagnostic messages
//! (errors, warnings, info) following tidyverse-style guidelines.

use crate::source::{SourceContext, SourceInfo};
use serde::{Deserialize, Serialize};

/// The kind of diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// An error that prevents completion
    Error,
    /// A warning that doesn't prevent completion but indicates a problem
    Warning,
    /// Informational message
    Info,
    /// A note providing additional context
    Note,
}

impl DiagnosticKind {
    fn label(self) -> &'static str {
        match self {
            DiagnosticKind::Error => "Error",
            DiagnosticKind::Warning => "Warning",
            DiagnosticKind::Info => "Info",
            DiagnosticKind::Note => "Note",
        }
    }
}

/// How detail items should be presented (tidyverse x/i bullet style).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailKind {
    /// Error detail (✖ bullet)
    Error,
    /// Info detail (ℹ bullet)
    Info,
    /// Note detail (plain bullet)
    Note,
}

impl DetailKind {
    fn bullet(self) -> &'static str {
        match self {
            DetailKind::Error => "✖",
            DetailKind::Info => "ℹ",
            DetailKind::Note => "•",
        }
    }
}

/// The content of a message or detail item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageContent {
    /// Plain text content
    Plain(String),
    /// Markdown content (backticks mark names and values)
    Markdown(String),
}

impl MessageContent {
    pub fn as_str(&self) -> &str {
        match self {
            MessageContent::Plain(s) => s,
            MessageContent::Markdown(s) => s,
        }
    }

    /// Convert to JSON value with type information
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            MessageContent::Plain(s) => json!({
                "type": "plain",
                "content": s
            }),
            MessageContent::Markdown(s) => json!({
                "type": "markdown",
                "content": s
            }),
        }
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Markdown(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Markdown(s.to_string())
    }
}

/// A detail item in a diagnostic message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailItem {
    pub kind: DetailKind,
    pub content: MessageContent,
    /// Optional source location this detail applies to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceInfo>,
}

/// A diagnostic message following tidyverse-style structure.
///
/// 1. **Code**: optional error code (e.g., "K-1-1") for searchability
/// 2. **Title**: brief error message
/// 3. **Kind**: Error, Warning, Info
/// 4. **Problem**: what went wrong
/// 5. **Details**: specific information, bulleted
/// 6. **Hints**: optional guidance for fixing (ends with ?)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub title: String,
    pub kind: DiagnosticKind,
    pub problem: Option<MessageContent>,
    pub details: Vec<DetailItem>,
    pub hints: Vec<MessageContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceInfo>,
}

impl DiagnosticMessage {
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            code: None,
            title: title.into(),
            kind,
            problem: None,
            details: Vec::new(),
            hints: Vec::new(),
            location: None,
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

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Documentation link for this error, if it has a catalogued code.
    pub fn docs_url(&self) -> Option<&str> {
        self.code
            .as_ref()
            .and_then(|code| crate::catalog::get_docs_url(code))
    }

    /// Render this diagnostic message as text.
    ///
    /// Without a source context (or without a location) the message is
    /// rendered tidyverse style:
    ///
    /// ```text
    /// Error [K-1-3]: Mismatched XML End Tag
    /// End tag </b> does not match start tag <a>
    /// ✖ Expected: </a>
    /// ? Check that all opening tags have matching closing tags?
    /// ```
    ///
    /// With a context the located part is rendered by ariadne, followed by
    /// the details ariadne cannot place and the hints.
    pub fn to_text(&self, ctx: Option<&SourceContext>) -> String {
        let snippet = ctx.and_then(|ctx| {
            let location = self
                .location
                .as_ref()
                .or_else(|| self.details.iter().find_map(|d| d.location.as_ref()))?;
            self.render_ariadne_source_context(location, ctx)
        });

        let mut lines: Vec<String> = Vec::new();
        match snippet {
            Some(snippet) => {
                lines.push(snippet.trim_end().to_string());
                for detail in self.details.iter().filter(|d| d.location.is_none()) {
                    lines.push(format!("{} {}", detail.kind.bullet(), detail.content.as_str()));
                }
            }
            None => {
                match &self.code {
                    Some(code) => lines.push(format!("{} [{}]: {}", self.kind.label(), code, self.title)),
                    None => lines.push(format!("{}: {}", self.kind.label(), self.title)),
                }
                if let Some(problem) = &self.problem {
                    lines.push(problem.as_str().to_string());
                }
                for detail in &self.details {
                    lines.push(format!("{} {}", detail.kind.bullet(), detail.content.as_str()));
                }
                if let Some(location) = &self.location {
                    let at = ctx
                        .and_then(|ctx| ctx.location_of(location))
                        .map(|loc| format!("at {}:{}", loc.row + 1, loc.column + 1))
                        .unwrap_or_else(|| format!("at byte {}", location.start_offset()));
                    lines.push(at);
                }
            }
        }
        for hint in &self.hints {
            lines.push(format!("? {}", hint.as_str()));
        }
        lines.join("\n")
    }

    /// Render this diagnostic message as a JSON value.
    ///
    /// ```
    /// use kml_error_reporting::DiagnosticMessage;
    ///
    /// let json = DiagnosticMessage::error("Something went wrong").to_json();
    /// assert_eq!(json["kind"], "error");
    /// assert_eq!(json["title"], "Something went wrong");
    /// ```
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let kind_str = match self.kind {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Info => "info",
            DiagnosticKind::Note => "note",
        };

        let mut obj = json!({
            "kind": kind_str,
            "title": self.title,
        });

        if let Some(code) = &self.code {
            obj["code"] = json!(code);
        }

        if let Some(problem) = &self.problem {
            obj["problem"] = problem.to_json();
        }

        if !self.details.is_empty() {
            let details: Vec<_> = self
                .details
                .iter()
                .map(|d| {
                    let detail_kind = match d.kind {
                        DetailKind::Error => "error",
                        DetailKind::Info => "info",
                        DetailKind::Note => "note",
                    };
                    let mut detail_obj = json!({
                        "kind": detail_kind,
                        "content": d.content.to_json()
                    });
                    if let Some(location) = &d.location {
                        detail_obj["location"] = json!(location);
                    }
                    detail_obj
                })
                .collect();
            obj["details"] = json!(details);
        }

        if !self.hints.is_empty() {
            let hints: Vec<_> = self.hints.iter().map(|h| h.to_json()).collect();
            obj["hints"] = json!(hints);
        }

        if let Some(location) = &self.location {
            obj["location"] = json!(location);
        }

        obj
    }

    fn render_ariadne_source_context(
        &self,
        main_location: &SourceInfo,
        ctx: &SourceContext,
    ) -> Option<String> {
        use ariadne::{Color, Config, Label, Report, ReportKind, Source};

        let file = ctx.get_file(main_location.file_id)?;
        let content = file.content.as_str();
        // ariadne spans count characters, our offsets count bytes
        let to_char = |offset: usize| -> usize {
            content
                .get(..offset.min(content.len()))
                .map_or(offset, |s| s.chars().count())
        };

        let (report_kind, main_color) = match self.kind {
            DiagnosticKind::Error => (ReportKind::Error, Color::Red),
            DiagnosticKind::Warning => (ReportKind::Warning, Color::Yellow),
            DiagnosticKind::Info => (ReportKind::Advice, Color::Cyan),
            DiagnosticKind::Note => (ReportKind::Advice, Color::Blue),
        };

        let start = to_char(main_location.start_offset());
        let end = to_char(main_location.end_offset()).max(start);

        let mut report = Report::build(report_kind, file.path.clone(), start)
            .with_config(Config::default().with_color(false));

        report = match &self.code {
            Some(code) => report.with_message(format!("[{}] {}", code, self.title)),
            None => report.with_message(&self.title),
        };

        let main_message = self
            .problem
            .as_ref()
            .map_or(self.title.as_str(), |p| p.as_str());
        report = report.with_label(
            Label::new((file.path.clone(), start..end))
                .with_message(main_message)
                .with_color(main_color),
        );

        for detail in &self.details {
            let Some(detail_loc) = &detail.location else {
                continue;
            };
            if detail_loc.file_id != main_location.file_id {
                continue;
            }
            let detail_start = to_char(detail_loc.start_offset());
            let detail_end = to_char(detail_loc.end_offset()).max(detail_start);
            let detail_color = match detail.kind {
                DetailKind::Error => Color::Red,
                DetailKind::Info => Color::Cyan,
                DetailKind::Note => Color::Blue,
            };
            report = report.with_label(
                Label::new((file.path.clone(), detail_start..detail_end))
                    .with_message(detail.content.as_str())
                    .with_color(detail_color),
            );
        }

        let mut output = Vec::new();
        report
            .finish()
            .write((file.path.clone(), Source::from(content)), &mut output)
            .ok()?;

        String::from_utf8(output).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DiagnosticMessageBuilder;
    use crate::source::FileId;

    #[test]
    fn test_message_content_from_str() {
        let content: MessageContent = "test".into();
        assert_eq!(content.as_str(), "test");
        assert!(matches!(content, MessageContent::Markdown(_)));
    }

    #[test]
    fn test_diagnostic_message_constructors() {
        let error = DiagnosticMessage::error("Error");
        assert_eq!(error.kind, DiagnosticKind::Error);
        assert!(error.code.is_none());
        assert!(error.details.is_empty());

        assert_eq!(DiagnosticMessage::warning("w").kind, DiagnosticKind::Warning);
        assert_eq!(DiagnosticMessage::info("i").kind, DiagnosticKind::Info);
    }

    #[test]
    fn test_docs_url() {
        let msg = DiagnosticMessage::error("XML Syntax Error").with_code("K-1-1");
        assert!(msg.docs_url().unwrap().contains("k-1-1"));
        assert!(DiagnosticMessage::error("x").docs_url().is_none());
        assert!(DiagnosticMessage::error("x").with_code("K-999-1").docs_url().is_none());
    }

    #[test]
    fn test_to_text_simple_error() {
        let msg = DiagnosticMessage::error("Something went wrong");
        assert_eq!(msg.to_text(None), "Error: Something went wrong");
    }

    #[test]
    fn test_to_text_with_code() {
        let msg = DiagnosticMessage::error("Something went wrong").with_code("K-1-1");
        assert_eq!(msg.to_text(None), "Error [K-1-1]: Something went wrong");
    }

    #[test]
    fn test_to_text_full_message() {
        let msg = DiagnosticMessageBuilder::error("Invalid input")
            .problem("Values must be numeric")
            .add_detail("Found text in column 3")
            .add_info("Columns should contain only numbers")
            .add_hint("Convert to numbers first?")
            .build();

        assert_eq!(
            msg.to_text(None),
            "Error: Invalid input\n\
             Values must be numeric\n\
             ✖ Found text in column 3\n\
             ℹ Columns should contain only numbers\n\
             ? Convert to numbers first?"
        );
    }

    #[test]
    fn test_location_without_context_uses_offset() {
        let msg = DiagnosticMessageBuilder::error("Invalid syntax")
            .with_location(SourceInfo::original(FileId(0), 42, 50))
            .build();
        assert!(msg.to_text(None).ends_with("at byte 42"));
    }

    #[test]
    fn test_location_with_context_renders_snippet() {
        let mut ctx = SourceContext::new();
        let file_id = ctx.add_file("test.kml", "<kml>\n  <Document>\n</kml>");

        let msg = DiagnosticMessageBuilder::error("Mismatched XML End Tag")
            .with_code("K-1-3")
            .with_location(SourceInfo::original(file_id, 9, 17))
            .add_hint("Close <Document> first?")
            .build();

        let text = msg.to_text(Some(&ctx));
        assert!(text.contains("test.kml"));
        assert!(text.contains("[K-1-3] Mismatched XML End Tag"));
        assert!(text.ends_with("? Close <Document> first?"));
    }

    #[test]
    fn test_to_json_full_message() {
        let msg = DiagnosticMessageBuilder::error("Invalid input")
            .with_code("K-3-3")
            .problem("Values must be numeric")
            .add_detail("Found text in column 3")
            .add_info("Expected numbers")
            .add_hint("Convert to numbers first?")
            .with_location(SourceInfo::original(FileId(0), 100, 110))
            .build();

        let json = msg.to_json();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["code"], "K-3-3");
        assert_eq!(json["problem"]["type"], "markdown");
        assert_eq!(json["problem"]["content"], "Values must be numeric");
        assert_eq!(json["details"][0]["kind"], "error");
        assert_eq!(json["details"][1]["kind"], "info");
        assert_eq!(json["hints"][0]["content"], "Convert to numbers first?");
        assert_eq!(json["location"]["start"], 100);
        assert_eq!(json["location"]["end"], 110);
    }

    #[test]
    fn test_to_json_omits_absent_fields() {
        let json = DiagnosticMessage::warning("Be careful").to_json();
        assert_eq!(json["kind"], "warning");
        assert!(json.get("code").is_none());
        assert!(json.get("problem").is_none());
        assert!(json.get("details").is_none());
        assert!(json.get("location").is_none());
    }
}
