//! Command implementations for the kml2pykml CLI
//!
//! Each command module handles the CLI interface and delegates to the
//! library crates for the actual work.

pub mod count;
pub mod input;
pub mod script;
pub mod validate;
pub mod wkt;
pub mod xml;
