//! Error reporting and diagnostic messages for the KML tooling.
//!
//! Every error raised by the workspace crates can be turned into a
//! [`DiagnosticMessage`]: a tidyverse-style message (title, problem,
//! bulleted details, hints) carrying a stable code from the embedded
//! [error catalog](catalog) and, when known, the [`SourceInfo`] it refers to.
//!
//! Messages render as plain text, as an ariadne source snippet when a
//! [`SourceContext`] holding the file is available, or as JSON.
//!
//! ```
//! use kml_error_reporting::DiagnosticMessageBuilder;
//!
//! let error = DiagnosticMessageBuilder::error("Unexpected Child Element")
//!     .with_code("K-3-3")
//!     .problem("`<Foo>` is not allowed in `<Placemark>`")
//!     .add_hint("Check the element name for typos?")
//!     .build();
//!
//! assert!(error.to_text(None).starts_with("Error [K-3-3]"));
//! ```

pub mod builder;
pub mod catalog;
pub mod diagnostic;
pub mod macros;
pub mod source;

pub use builder::DiagnosticMessageBuilder;
pub use catalog::{ERROR_CATALOG, ErrorCodeInfo, get_docs_url, get_error_info, get_subsystem};
pub use diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};
pub use source::{FileId, FileInformation, Location, SourceContext, SourceFile, SourceInfo};
