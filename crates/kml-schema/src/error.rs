// Error types for schema loading and validation

use kml_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder, SourceInfo};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for schema loading operations
pub type LoadResult<T> = Result<T, SchemaLoadError>;

/// Errors that can occur while loading a schema
#[derive(Debug, Error)]
pub enum SchemaLoadError {
    /// No candidate location held the schema
    #[error("schema `{name}` not found (tried {})", display_paths(.tried))]
    NotFound { name: String, tried: Vec<PathBuf> },

    /// The schema file exists but could not be read
    #[error("failed to read schema `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The schema is not well-formed XML
    #[error("schema `{}` is not well-formed: {error}", display_origin(.path))]
    Parse {
        path: Option<PathBuf>,
        #[source]
        error: kml_xml::Error,
    },

    /// The root element is not `xs:schema`
    #[error("`{}` is not an XML Schema (root element is `{found}`)", display_origin(.path))]
    NotASchema { path: Option<PathBuf>, found: String },

    /// A QName-valued attribute could not be interpreted
    #[error("invalid reference `{reference}` in `{}`: {message}", display_origin(.path))]
    InvalidReference {
        path: Option<PathBuf>,
        reference: String,
        message: String,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "no locations".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_origin(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "<inline schema>".to_string(),
    }
}

impl SchemaLoadError {
    /// Convert this error to a DiagnosticMessage with the matching K-2-* code.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        match self {
            SchemaLoadError::NotFound { name, tried } => {
                let mut builder = DiagnosticMessageBuilder::error("Schema Not Found")
                    .with_code("K-2-1")
                    .problem(format!("Could not find schema `{}`", name));
                for path in tried {
                    builder = builder.add_detail(format!("Tried `{}`", path.display()));
                }
                builder
                    .add_info("Schemas are only read from local files")
                    .add_hint("Add the directory holding the schema to the search path?")
                    .build()
            }

            SchemaLoadError::Read { path, source } => {
                DiagnosticMessageBuilder::error("Schema Read Error")
                    .with_code("K-2-2")
                    .problem(format!("Could not read `{}`", path.display()))
                    .add_detail(source.to_string())
                    .build()
            }

            SchemaLoadError::Parse { path, error } => {
                DiagnosticMessageBuilder::error("Schema Parse Error")
                    .with_code("K-2-3")
                    .problem(format!("`{}` is not well-formed XML", display_origin(path)))
                    .add_detail(error.to_string())
                    .build()
            }

            SchemaLoadError::NotASchema { path, found } => {
                DiagnosticMessageBuilder::error("Not an XML Schema")
                    .with_code("K-2-4")
                    .problem(format!(
                        "The root element of `{}` is `{}`, not `xs:schema`",
                        display_origin(path),
                        found
                    ))
                    .build()
            }

            SchemaLoadError::InvalidReference {
                path,
                reference,
                message,
            } => DiagnosticMessageBuilder::error("Invalid Schema Reference")
                .with_code("K-2-5")
                .problem(format!(
                    "Cannot interpret `{}` in `{}`",
                    reference,
                    display_origin(path)
                ))
                .add_detail(message.clone())
                .build(),
        }
    }
}

/// Structured validation issue kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssueKind {
    /// The root element has no global declaration
    UndeclaredRoot { element: String },

    /// The element's declaration is abstract
    AbstractElement { element: String },

    /// The parent's content model does not admit the element
    UnexpectedChild { element: String, parent: String },

    /// An element of a text-only type has child elements
    ChildInTextOnly { element: String, child: String },

    /// A `use="required"` attribute is absent
    MissingAttribute { attribute: String, element: String },

    /// The attribute is neither declared nor covered by `anyAttribute`
    UndeclaredAttribute { attribute: String, element: String },

    /// A type, element, group or attribute group named by the schema was not loaded
    UnresolvedComponent { kind: &'static str, name: String },
}

impl ValidationIssueKind {
    /// Get the error code for this issue kind
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationIssueKind::UndeclaredRoot { .. } => "K-3-1",
            ValidationIssueKind::AbstractElement { .. } => "K-3-2",
            ValidationIssueKind::UnexpectedChild { .. } => "K-3-3",
            ValidationIssueKind::ChildInTextOnly { .. } => "K-3-4",
            ValidationIssueKind::MissingAttribute { .. } => "K-3-5",
            ValidationIssueKind::UndeclaredAttribute { .. } => "K-3-6",
            ValidationIssueKind::UnresolvedComponent { .. } => "K-3-7",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ValidationIssueKind::UndeclaredRoot { .. } => "Undeclared Root Element",
            ValidationIssueKind::AbstractElement { .. } => "Abstract Element",
            ValidationIssueKind::UnexpectedChild { .. } => "Unexpected Child Element",
            ValidationIssueKind::ChildInTextOnly { .. } => "Child Element in Text-Only Element",
            ValidationIssueKind::MissingAttribute { .. } => "Missing Required Attribute",
            ValidationIssueKind::UndeclaredAttribute { .. } => "Undeclared Attribute",
            ValidationIssueKind::UnresolvedComponent { .. } => "Unresolved Type",
        }
    }

    /// Format a human-readable message from this issue kind
    pub fn message(&self) -> String {
        match self {
            ValidationIssueKind::UndeclaredRoot { element } => {
                format!("No global declaration for root element `{}`", element)
            }
            ValidationIssueKind::AbstractElement { element } => {
                format!("Element `{}` is abstract", element)
            }
            ValidationIssueKind::UnexpectedChild { element, parent } => {
                format!("Element `{}` is not allowed in `{}`", element, parent)
            }
            ValidationIssueKind::ChildInTextOnly { element, child } => {
                format!(
                    "Element `{}` has a text-only type but contains `{}`",
                    element, child
                )
            }
            ValidationIssueKind::MissingAttribute { attribute, element } => {
                format!(
                    "Element `{}` is missing required attribute `{}`",
                    element, attribute
                )
            }
            ValidationIssueKind::UndeclaredAttribute { attribute, element } => {
                format!(
                    "Attribute `{}` is not declared for element `{}`",
                    attribute, element
                )
            }
            ValidationIssueKind::UnresolvedComponent { kind, name } => {
                format!("The schema references {} `{}`, which was not loaded", kind, name)
            }
        }
    }
}

/// One violation found while validating a document.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub kind: ValidationIssueKind,
    /// Element path, e.g. `/kml/Document/Placemark[2]`
    pub path: String,
    pub location: Option<SourceInfo>,
}

impl ValidationIssue {
    pub fn new(kind: ValidationIssueKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: Option<SourceInfo>) -> Self {
        self.location = location;
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.error_code()
    }

    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        DiagnosticMessageBuilder::error(self.kind.title())
            .with_code(self.code())
            .problem(self.kind.message())
            .add_detail(format!("At `{}`", self.path))
            .with_optional_location(self.location.clone())
            .build()
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind.message())
    }
}

/// A document failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("document is not valid ({} issue(s)); first: {}", .issues.len(), first_issue(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn first_issue(issues: &[ValidationIssue]) -> String {
    issues
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

impl ValidationError {
    pub fn to_diagnostics(&self) -> Vec<DiagnosticMessage> {
        self.issues.iter().map(ValidationIssue::to_diagnostic).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_every_location() {
        let error = SchemaLoadError::NotFound {
            name: "ogckml22.xsd".into(),
            tried: vec![PathBuf::from("a/ogckml22.xsd"), PathBuf::from("b/ogckml22.xsd")],
        };
        assert_eq!(
            error.to_string(),
            "schema `ogckml22.xsd` not found (tried a/ogckml22.xsd, b/ogckml22.xsd)"
        );

        let diagnostic = error.to_diagnostic();
        assert_eq!(diagnostic.code.as_deref(), Some("K-2-1"));
        let text = diagnostic.to_text(None);
        assert!(text.contains("a/ogckml22.xsd"));
        assert!(text.contains("b/ogckml22.xsd"));
    }

    #[test]
    fn test_issue_codes() {
        let kinds = [
            (ValidationIssueKind::UndeclaredRoot { element: "x".into() }, "K-3-1"),
            (ValidationIssueKind::AbstractElement { element: "x".into() }, "K-3-2"),
            (
                ValidationIssueKind::UnexpectedChild {
                    element: "x".into(),
                    parent: "y".into(),
                },
                "K-3-3",
            ),
            (
                ValidationIssueKind::UnresolvedComponent {
                    kind: "type",
                    name: "{urn:x}T".into(),
                },
                "K-3-7",
            ),
        ];
        for (kind, code) in kinds {
            assert_eq!(kind.error_code(), code);
            let title = kml_error_reporting::get_error_info(code).map(|info| info.title.as_str());
            assert_eq!(title, Some(kind.title()), "{code}");
        }
    }

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError {
            issues: vec![ValidationIssue::new(
                ValidationIssueKind::UnexpectedChild {
                    element: "Foo".into(),
                    parent: "Placemark".into(),
                },
                "/kml/Placemark/Foo",
            )],
        };
        assert_eq!(
            error.to_string(),
            "document is not valid (1 issue(s)); first: /kml/Placemark/Foo: Element `Foo` is not allowed in `Placemark`"
        );
        let diagnostics = error.to_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].to_text(None).contains("/kml/Placemark/Foo"));
    }
}
