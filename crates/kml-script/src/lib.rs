//! Turn a KML document into a Python script that rebuilds it.
//!
//! The generated script targets pyKML's element makers on top of lxml:
//! every element becomes a nested call such as `KML.Placemark(...)`, text
//! becomes string literals, attributes become keyword arguments and
//! comments become `etree.Comment(...)` children. Comments beside the
//! root are attached with `addprevious`/`addnext`.
//!
//! ```rust
//! use kml_script::transpile;
//!
//! let doc = kml_xml::parse(r#"<!-- note -->
//! <kml xmlns="http://www.opengis.net/kml/2.2">
//!   <Placemark>
//!     <name>Hello World!</name>
//!   </Placemark>
//! </kml>"#).unwrap();
//!
//! let script = transpile(&doc).unwrap();
//! assert!(script.contains("doc = KML.kml(\n  KML.Placemark(\n    KML.name('Hello World!'),\n  ),\n)\n"));
//! assert!(script.contains("doc.addprevious(etree.Comment(' note '))\n"));
//! ```
//!
//! The emitter works on any stream of [`kml_xml::TreeEvent`]s, see
//! [`transpile_events`] and [`ScriptEmitter`].

pub mod emitter;
pub mod error;
pub mod literal;
pub mod namespace;

pub use emitter::{EmitterState, ScriptEmitter, transpile, transpile_events, transpile_with};
pub use error::{Error, Result};
pub use namespace::{NamespaceEntry, NamespaceTable, split_qualified_name};
