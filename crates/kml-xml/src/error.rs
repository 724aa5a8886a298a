//! Error types for document parsing and serialization.

use kml_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder, SourceInfo};
use thiserror::Error;

/// Result type alias for kml-xml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for parse operations that return diagnostics.
pub type ParseResult<T> = std::result::Result<T, Vec<DiagnosticMessage>>;

/// Errors that can occur while reading or writing a document.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Syntax error reported by quick-xml.
    #[error("XML syntax error: {message}")]
    XmlSyntax {
        message: String,
        location: Option<SourceInfo>,
    },

    /// Input ended while an element was still open.
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof {
        expected: String,
        location: Option<SourceInfo>,
    },

    #[error("Mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEndTag {
        expected: String,
        found: String,
        location: Option<SourceInfo>,
    },

    /// A well-formed construct the document model cannot hold.
    #[error("Invalid XML structure: {message}")]
    InvalidStructure {
        message: String,
        location: Option<SourceInfo>,
    },

    #[error("Empty XML document: no root element found")]
    EmptyDocument,

    #[error("Invalid XML: multiple root elements")]
    MultipleRoots { location: Option<SourceInfo> },

    /// A prefix used on an element or attribute has no `xmlns` binding.
    #[error("Unknown namespace prefix `{prefix}` in `{name}`")]
    UnknownPrefix {
        prefix: String,
        name: String,
        location: Option<SourceInfo>,
    },

    /// The underlying writer failed.
    #[error("Failed to write XML: {message}")]
    Write { message: String },
}

impl Error {
    /// The source range the error refers to, if known.
    pub fn location(&self) -> Option<&SourceInfo> {
        match self {
            Error::XmlSyntax { location, .. }
            | Error::UnexpectedEof { location, .. }
            | Error::MismatchedEndTag { location, .. }
            | Error::InvalidStructure { location, .. }
            | Error::MultipleRoots { location }
            | Error::UnknownPrefix { location, .. } => location.as_ref(),
            Error::EmptyDocument | Error::Write { .. } => None,
        }
    }

    /// Convert this error to a DiagnosticMessage with the matching K-1-* code.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let builder = match self {
            Error::XmlSyntax { message, .. } => DiagnosticMessageBuilder::error("XML Syntax Error")
                .with_code("K-1-1")
                .problem(message.clone()),

            Error::UnexpectedEof { expected, .. } => {
                DiagnosticMessageBuilder::error("Unexpected End of XML Input")
                    .with_code("K-1-2")
                    .problem(format!(
                        "The XML document ended unexpectedly; expected {}",
                        expected
                    ))
            }

            Error::MismatchedEndTag {
                expected, found, ..
            } => DiagnosticMessageBuilder::error("Mismatched XML End Tag")
                .with_code("K-1-3")
                .problem(format!(
                    "End tag `</{}>` does not match start tag `<{}>`",
                    found, expected
                ))
                .add_detail(format!("Expected: `</{}>`", expected))
                .add_detail(format!("Found: `</{}>`", found))
                .add_hint("Check that all opening tags have matching closing tags?"),

            Error::InvalidStructure { message, .. } => {
                DiagnosticMessageBuilder::error("Invalid XML Structure")
                    .with_code("K-1-4")
                    .problem(message.clone())
            }

            Error::EmptyDocument => DiagnosticMessageBuilder::error("Empty XML Document")
                .with_code("K-1-5")
                .problem("The XML document contains no root element")
                .add_hint("Add a `<kml>` root element to the document?"),

            Error::MultipleRoots { .. } => {
                DiagnosticMessageBuilder::error("Multiple XML Root Elements")
                    .with_code("K-1-6")
                    .problem("The XML document contains multiple root elements")
                    .add_detail("XML documents must have exactly one root element")
                    .add_hint("Wrap the elements in a single `<Document>` or `<Folder>`?")
            }

            Error::UnknownPrefix { prefix, name, .. } => {
                DiagnosticMessageBuilder::error("Unknown Namespace Prefix")
                    .with_code("K-1-7")
                    .problem(format!(
                        "`{}` uses the prefix `{}`, which is not bound to a namespace",
                        name, prefix
                    ))
                    .add_hint(format!(
                        "Declare it with `xmlns:{}=\"...\"` on an enclosing element?",
                        prefix
                    ))
            }

            Error::Write { message } => DiagnosticMessageBuilder::error("Internal Error")
                .with_code("K-0-1")
                .problem(format!("Failed to write XML: {}", message)),
        };

        builder
            .with_optional_location(self.location().cloned())
            .build()
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlSyntax {
            message: err.to_string(),
            location: None,
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlSyntax {
            message: format!("Attribute error: {}", err),
            location: None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Write {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kml_error_reporting::FileId;

    #[test]
    fn test_codes() {
        let cases = [
            (
                Error::XmlSyntax {
                    message: "bad".into(),
                    location: None,
                },
                "K-1-1",
            ),
            (
                Error::UnexpectedEof {
                    expected: "closing tag </kml>".into(),
                    location: None,
                },
                "K-1-2",
            ),
            (Error::EmptyDocument, "K-1-5"),
            (Error::MultipleRoots { location: None }, "K-1-6"),
            (
                Error::UnknownPrefix {
                    prefix: "gx".into(),
                    name: "gx:Tour".into(),
                    location: None,
                },
                "K-1-7",
            ),
        ];

        for (error, code) in cases {
            assert_eq!(error.to_diagnostic().code.as_deref(), Some(code));
        }
    }

    #[test]
    fn test_diagnostic_carries_location() {
        let location = SourceInfo::original(FileId(0), 5, 9);
        let error = Error::MismatchedEndTag {
            expected: "name".into(),
            found: "nam".into(),
            location: Some(location.clone()),
        };

        let diagnostic = error.to_diagnostic();
        assert_eq!(diagnostic.location, Some(location));
        assert_eq!(diagnostic.details.len(), 2);
        assert_eq!(diagnostic.hints.len(), 1);
    }

    #[test]
    fn test_display() {
        let error = Error::UnknownPrefix {
            prefix: "gx".into(),
            name: "gx:Tour".into(),
            location: None,
        };
        assert_eq!(
            error.to_string(),
            "Unknown namespace prefix `gx` in `gx:Tour`"
        );
    }
}
