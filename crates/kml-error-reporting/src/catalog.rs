//! Error code catalog and lookup.
//!
//! Maps error codes (like "K-1-1") to their metadata (subsystem, title,
//! default message, docs link).

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata for an error code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorCodeInfo {
    /// Subsystem name (e.g., "xml", "schema", "script")
    pub subsystem: String,

    /// Short title for the error
    pub title: String,

    /// Default message
    pub message_template: String,

    /// Link to documentation, relative to the repository root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,

    /// When this error was introduced (version)
    pub since_version: String,
}

/// Global error catalog, embedded at compile time from `error_catalog.json`.
///
/// # Panics
///
/// Panics on first access if the embedded JSON is invalid.
pub static ERROR_CATALOG: Lazy<HashMap<String, ErrorCodeInfo>> = Lazy::new(|| {
    let json_data = include_str!("../error_catalog.json");
    serde_json::from_str(json_data).expect("Invalid error catalog JSON - this is a bug in kml2pykml")
});

/// Look up error code information.
///
/// ```
/// use kml_error_reporting::catalog::get_error_info;
///
/// let info = get_error_info("K-1-1").unwrap();
/// assert_eq!(info.subsystem, "xml");
/// ```
pub fn get_error_info(code: &str) -> Option<&ErrorCodeInfo> {
    ERROR_CATALOG.get(code)
}

/// Get documentation URL for an error code.
pub fn get_docs_url(code: &str) -> Option<&str> {
    ERROR_CATALOG
        .get(code)
        .and_then(|info| info.docs_url.as_deref())
}

/// Get the subsystem name for an error code.
pub fn get_subsystem(code: &str) -> Option<&str> {
    ERROR_CATALOG.get(code).map(|info| info.subsystem.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        assert!(!ERROR_CATALOG.is_empty());
    }

    #[test]
    fn test_internal_error_exists() {
        let info = get_error_info("K-0-1").unwrap();
        assert_eq!(info.subsystem, "internal");
        assert_eq!(info.title, "Internal Error");
        assert!(info.docs_url.is_some());
    }

    #[test]
    fn test_codes_are_grouped_by_subsystem() {
        assert_eq!(get_subsystem("K-1-3"), Some("xml"));
        assert_eq!(get_subsystem("K-2-1"), Some("schema"));
        assert_eq!(get_subsystem("K-3-3"), Some("validation"));
        assert_eq!(get_subsystem("K-4-1"), Some("script"));
    }

    #[test]
    fn test_get_docs_url() {
        let url = get_docs_url("K-4-1").unwrap();
        assert!(url.starts_with("docs/errors.md#"));
        // Not every code has a docs entry
        assert!(get_docs_url("K-3-7").is_none());
    }

    #[test]
    fn test_nonexistent_code() {
        assert!(get_error_info("K-999-999").is_none());
        assert!(get_subsystem("K-999-999").is_none());
    }
}
