//! Errors raised while generating a builder script.

use kml_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder, SourceInfo};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// An element is in a namespace the table has no identifier for.
    #[error("no builder identifier for namespace `{namespace}` (element `{element}`)")]
    UnknownNamespace {
        namespace: String,
        element: String,
        location: Option<SourceInfo>,
    },

    /// The event stream ended without opening an element.
    #[error("the event stream contained no element")]
    NoRootElement,
}

impl Error {
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        match self {
            Error::UnknownNamespace {
                namespace,
                element,
                location,
            } => DiagnosticMessageBuilder::error("Unknown Namespace")
                .with_code("K-4-1")
                .problem(format!(
                    "Element `{}` is in namespace `{}`, which has no builder",
                    element, namespace
                ))
                .add_info("Known namespaces are KML 2.2, Atom and the Google extensions")
                .add_hint("Move the element into one of the known namespaces?")
                .with_optional_location(location.clone())
                .build(),

            Error::NoRootElement => DiagnosticMessageBuilder::error("No Root Element")
                .with_code("K-4-2")
                .problem("Nothing to generate: the input has no element")
                .build(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_namespace_diagnostic() {
        let error = Error::UnknownNamespace {
            namespace: "urn:x".into(),
            element: "Foo".into(),
            location: None,
        };
        let diagnostic = error.to_diagnostic();
        assert_eq!(diagnostic.code.as_deref(), Some("K-4-1"));
        assert!(diagnostic.to_text(None).contains("`urn:x`"));
        assert_eq!(
            error.to_string(),
            "no builder identifier for namespace `urn:x` (element `Foo`)"
        );
    }

    #[test]
    fn test_no_root_diagnostic() {
        assert_eq!(
            Error::NoRootElement.to_diagnostic().code.as_deref(),
            Some("K-4-2")
        );
    }
}
