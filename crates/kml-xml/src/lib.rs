//! Namespace-aware document model for KML.
//!
//! This crate wraps [`quick-xml`] to provide a [`Document`]: a root
//! [`Element`] with qualified names, ordered attributes, text and
//! interleaved comment children, plus the comments around the root.
//! Every parsed node records the byte range it came from.
//!
//! # Overview
//!
//! - [`parse`] / [`parse_with_context`]: read a document
//! - [`Document::events`]: walk it as a stream of [`TreeEvent`]s
//! - [`to_string`]: serialize it back to XML, optionally with CDATA
//! - [`ElementMaker`]: build documents in code
//! - [`count_elements`]: occurrences per namespace and local name
//! - [`to_wkt_list`]: polygons as Well-Known Text
//!
//! # Example
//!
//! ```rust
//! use kml_xml::{parse, KML_NAMESPACE};
//!
//! let doc = parse(r#"<kml xmlns="http://www.opengis.net/kml/2.2">
//!   <Placemark id="p1">
//!     <name>Hello World!</name>
//!   </Placemark>
//! </kml>"#).unwrap();
//!
//! let placemark = doc.root.find_child("Placemark").unwrap();
//! assert_eq!(placemark.namespace(), Some(KML_NAMESPACE));
//! assert_eq!(placemark.get_attribute("id"), Some("p1"));
//! ```
//!
//! # Source Location Tracking
//!
//! ```rust
//! use kml_xml::parse;
//!
//! let content = "<root><child/></root>";
//! let doc = parse(content).unwrap();
//!
//! let info = doc.root.source_info.as_ref().unwrap();
//! assert_eq!(info.start_offset(), 0);
//! assert_eq!(info.end_offset(), content.len());
//! ```

pub mod builder;
pub mod context;
pub mod count;
pub mod error;
pub mod namespaces;
pub mod parser;
pub mod types;
pub mod walker;
pub mod wkt;
pub mod writer;

pub use builder::ElementMaker;
pub use context::XmlParseContext;
pub use count::{ElementCounts, count_elements};
pub use error::{Error, ParseResult, Result};
pub use kml_error_reporting::SourceInfo;
pub use namespaces::{ATOM_NAMESPACE, GX_NAMESPACE, KML_NAMESPACE, XML_NAMESPACE};
pub use parser::{parse, parse_with_context, parse_with_file_id};
pub use types::{Attribute, Comment, Document, Element, NamespaceDeclaration, Node, QName};
pub use walker::{Events, TreeEvent};
pub use wkt::{to_wkt_list, wrap_angle180};
pub use writer::{KML_CDATA_ELEMENTS, WriteOptions, to_string, write_document};
