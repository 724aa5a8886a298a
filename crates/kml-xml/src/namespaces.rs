//! Namespace URIs used by KML documents.

/// OGC KML 2.2.
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Atom syndication, used for `atom:author` and `atom:link`.
pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

/// Google extensions to KML 2.2.
pub const GX_NAMESPACE: &str = "http://www.google.com/kml/ext/2.2";

/// Bound to the `xml` prefix by definition.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Conventional prefix for a well-known namespace.
pub fn conventional_prefix(uri: &str) -> Option<&'static str> {
    match uri {
        KML_NAMESPACE => Some("kml"),
        ATOM_NAMESPACE => Some("atom"),
        GX_NAMESPACE => Some("gx"),
        XML_NAMESPACE => Some("xml"),
        _ => None,
    }
}
