//! Mapping from namespace URIs to builder identifiers.

use kml_xml::{ATOM_NAMESPACE, GX_NAMESPACE, KML_NAMESPACE};

/// One namespace the generated script can build elements in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceEntry {
    pub uri: String,
    /// Name the factory is bound to in the script (`KML`).
    pub identifier: String,
    /// Factory imported from `pykml.factory` (`KML_ElementMaker`).
    pub factory: String,
}

/// Namespace URI to builder identifier table, owned by the emitter.
///
/// The default table is the pyKML one:
///
/// ```
/// use kml_script::NamespaceTable;
///
/// let table = NamespaceTable::default();
/// assert_eq!(table.resolve(Some("http://www.google.com/kml/ext/2.2")), Some("GX"));
/// assert_eq!(table.resolve(None), Some("KML"));
/// assert_eq!(table.resolve(Some("urn:unknown")), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceTable {
    entries: Vec<NamespaceEntry>,
    default_identifier: String,
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Self::new("KML")
            .with_entry(KML_NAMESPACE, "KML", "KML_ElementMaker")
            .with_entry(ATOM_NAMESPACE, "ATOM", "ATOM_ElementMaker")
            .with_entry(GX_NAMESPACE, "GX", "GX_ElementMaker")
    }
}

impl NamespaceTable {
    /// An empty table; elements without a namespace use `default_identifier`.
    pub fn new(default_identifier: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            default_identifier: default_identifier.into(),
        }
    }

    pub fn with_entry(
        mut self,
        uri: impl Into<String>,
        identifier: impl Into<String>,
        factory: impl Into<String>,
    ) -> Self {
        self.entries.push(NamespaceEntry {
            uri: uri.into(),
            identifier: identifier.into(),
            factory: factory.into(),
        });
        self
    }

    pub fn entries(&self) -> &[NamespaceEntry] {
        &self.entries
    }

    pub fn default_identifier(&self) -> &str {
        &self.default_identifier
    }

    /// Builder identifier for a namespace; `None` if the URI is unknown.
    ///
    /// A missing or empty namespace resolves to the default identifier.
    pub fn resolve(&self, namespace: Option<&str>) -> Option<&str> {
        match namespace.filter(|ns| !ns.is_empty()) {
            None => Some(self.default_identifier.as_str()),
            Some(uri) => self
                .entries
                .iter()
                .find(|entry| entry.uri == uri)
                .map(|entry| entry.identifier.as_str()),
        }
    }

    /// Namespace URI bound to an identifier.
    pub fn namespace_of(&self, identifier: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.identifier == identifier)
            .map(|entry| entry.uri.as_str())
    }

    /// Builder identifier for a qualified name in Clark notation.
    pub fn resolve_qualified(&self, qualified: &str) -> Option<&str> {
        let (namespace, _) = split_qualified_name(qualified);
        self.resolve(namespace)
    }
}

/// Split `{uri}local` into its namespace and local name.
///
/// ```
/// use kml_script::split_qualified_name;
///
/// assert_eq!(
///     split_qualified_name("{http://www.w3.org/2005/Atom}link"),
///     (Some("http://www.w3.org/2005/Atom"), "link")
/// );
/// assert_eq!(split_qualified_name("Placemark"), (None, "Placemark"));
/// ```
pub fn split_qualified_name(qualified: &str) -> (Option<&str>, &str) {
    if let Some(rest) = qualified.strip_prefix('{')
        && let Some((namespace, local)) = rest.split_once('}')
        && !namespace.is_empty()
        && !local.is_empty()
    {
        return (Some(namespace), local);
    }
    (None, qualified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kml_xml::QName;

    #[test]
    fn test_default_table() {
        let table = NamespaceTable::default();
        assert_eq!(table.resolve(Some(KML_NAMESPACE)), Some("KML"));
        assert_eq!(table.resolve(Some(ATOM_NAMESPACE)), Some("ATOM"));
        assert_eq!(table.resolve(Some(GX_NAMESPACE)), Some("GX"));
        assert_eq!(table.resolve(Some("")), Some("KML"));
        assert_eq!(table.entries().len(), 3);
        assert_eq!(table.namespace_of("ATOM"), Some(ATOM_NAMESPACE));
    }

    #[test]
    fn test_resolve_qualified() {
        let table = NamespaceTable::default();
        assert_eq!(
            table.resolve_qualified(&format!("{{{GX_NAMESPACE}}}Tour")),
            Some("GX")
        );
        assert_eq!(table.resolve_qualified("name"), Some("KML"));
        assert_eq!(table.resolve_qualified("{urn:other}name"), None);
    }

    #[test]
    fn test_split_matches_document_model() {
        for name in ["{urn:a}b", "b", "{}b", "{urn:a}", "{urn:a"] {
            let (namespace, local) = split_qualified_name(name);
            assert_eq!(QName::new(namespace, local), QName::parse_clark(name), "{name}");
        }
    }

    #[test]
    fn test_custom_table() {
        let table = NamespaceTable::new("X").with_entry("urn:x", "X", "X_ElementMaker");
        assert_eq!(table.resolve(None), Some("X"));
        assert_eq!(table.resolve(Some(KML_NAMESPACE)), None);
    }
}
