//! XML Schema loading and document validation for KML.
//!
//! A [`Schema`] is loaded from a local file (or from the local copy of a
//! schema URL, see [`SchemaResolver`]) together with everything it imports,
//! and checks documents against a practical subset of XML Schema:
//!
//! - the root must be a declared, non-abstract global element;
//! - every child must be admitted by its parent's content model, either
//!   directly, through a substitution group or through a wildcard;
//! - elements of simple types may not contain elements;
//! - required attributes must be present and undeclared ones are rejected
//!   unless the type allows any attribute.
//!
//! Ordering and occurrence counts are not checked.
//!
//! ```
//! use kml_schema::{Schema, SchemaResolver};
//!
//! let schema = Schema::parse(
//!     r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
//!            xmlns="urn:k" targetNamespace="urn:k" elementFormDefault="qualified">
//!          <xs:element name="kml">
//!            <xs:complexType>
//!              <xs:sequence><xs:element name="name" type="xs:string"/></xs:sequence>
//!            </xs:complexType>
//!          </xs:element>
//!        </xs:schema>"#,
//!     &SchemaResolver::new(),
//! )
//! .unwrap();
//!
//! let good = kml_xml::parse(r#"<kml xmlns="urn:k"><name>a</name></kml>"#).unwrap();
//! assert!(schema.validate(&good));
//!
//! let bad = kml_xml::parse(r#"<kml xmlns="urn:k"><nope/></kml>"#).unwrap();
//! let error = schema.assert_valid(&bad).unwrap_err();
//! assert_eq!(error.issues[0].code(), "K-3-3");
//! assert_eq!(error.issues[0].path, "/kml/nope");
//! ```

pub mod error;
mod loader;
pub mod model;
pub mod resolver;
pub mod validator;

pub use error::{
    LoadResult, SchemaLoadError, ValidationError, ValidationIssue, ValidationIssueKind,
};
pub use model::{SchemaSet, XSD_NAMESPACE, XSI_NAMESPACE};
pub use resolver::SchemaResolver;

use kml_xml::Document;
use loader::Loader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the OGC KML 2.2 schema.
pub const DEFAULT_SCHEMA: &str = "ogckml22.xsd";

/// A loaded schema, ready to validate documents.
#[derive(Debug, Clone)]
pub struct Schema {
    set: SchemaSet,
    path: Option<PathBuf>,
}

impl Schema {
    /// Load a schema by file name, path or URL.
    pub fn load(source: &str, resolver: &SchemaResolver) -> LoadResult<Self> {
        let path = resolver.resolve(source, None)?;
        let set = Loader::new(resolver).load_file(&path)?;
        debug!(
            path = %path.display(),
            elements = set.elements.len(),
            types = set.types.len(),
            "schema loaded"
        );
        Ok(Self {
            set,
            path: Some(path),
        })
    }

    /// Build a schema from its text.
    pub fn parse(content: &str, resolver: &SchemaResolver) -> LoadResult<Self> {
        Ok(Self {
            set: Loader::new(resolver).load_text(content)?,
            path: None,
        })
    }

    /// The file the schema was loaded from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn components(&self) -> &SchemaSet {
        &self.set
    }

    /// Every violation in the document, in document order.
    pub fn issues(&self, doc: &Document) -> Vec<ValidationIssue> {
        validator::validate_document(doc, &self.set)
    }

    pub fn validate(&self, doc: &Document) -> bool {
        self.issues(doc).is_empty()
    }

    /// Fail with every violation if the document is not valid.
    pub fn assert_valid(&self, doc: &Document) -> Result<(), ValidationError> {
        let issues = self.issues(doc);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}
