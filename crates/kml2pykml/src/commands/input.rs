//! Reading and parsing the input document, and reporting diagnostics.

use anyhow::{Context, Result, bail};
use kml_error_reporting::{DiagnosticMessage, FileId, SourceContext};
use kml_xml::{Document, XmlParseContext, parse_with_context};
use std::io::Read;
use tracing::debug;

use crate::Format;

/// An input document held in a source context for error rendering.
pub struct Input {
    context: SourceContext,
    file_id: FileId,
}

impl Input {
    /// Read a local file, or stdin for `-`.
    pub fn read(input: &str) -> Result<Self> {
        if input.starts_with("http://") || input.starts_with("https://") {
            bail!(
                "`{}` is a URL; download it first and pass the local file (or '-' for stdin)",
                input
            );
        }

        let (name, content) = if input == "-" {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read stdin")?;
            ("<stdin>".to_string(), content)
        } else {
            let content = std::fs::read_to_string(input)
                .with_context(|| format!("Failed to read input file: {}", input))?;
            (input.to_string(), content)
        };
        debug!(input = %name, bytes = content.len(), "read input");

        let mut context = SourceContext::new();
        let file_id = context.add_file(name, content);
        Ok(Self { context, file_id })
    }

    pub fn context(&self) -> &SourceContext {
        &self.context
    }

    fn content(&self) -> &str {
        self.context
            .get_file(self.file_id)
            .map(|file| file.content.as_str())
            .unwrap_or_default()
    }

    /// Parse the document. Warnings are reported to stderr as they come;
    /// on failure the error diagnostics are returned for the caller to
    /// report in its format.
    pub fn parse(&self) -> Result<Document, Vec<DiagnosticMessage>> {
        let mut ctx = XmlParseContext::for_file(self.file_id);
        let result = parse_with_context(self.content(), &mut ctx);
        if result.is_ok() {
            report(&ctx.take_diagnostics(), Some(&self.context));
        }
        result
    }
}

/// Render diagnostics to stderr.
pub fn report(diagnostics: &[DiagnosticMessage], context: Option<&SourceContext>) {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic.to_text(context));
    }
}

/// Render diagnostics in the requested format: text to stderr, JSON to stdout.
pub fn report_as(diagnostics: &[DiagnosticMessage], context: Option<&SourceContext>, format: Format) {
    match format {
        Format::Text => report(diagnostics, context),
        Format::Json => {
            let json: Vec<serde_json::Value> =
                diagnostics.iter().map(DiagnosticMessage::to_json).collect();
            println!("{}", serde_json::json!({ "valid": false, "diagnostics": json }));
        }
    }
}
