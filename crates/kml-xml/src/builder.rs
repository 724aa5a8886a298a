//! Programmatic construction of documents.
//!
//! [`ElementMaker`] mirrors the factory objects a generated builder script
//! calls: one maker per namespace, producing elements by local name.
//!
//! ```rust
//! use kml_xml::{Document, ElementMaker};
//!
//! let kml = ElementMaker::kml();
//! let doc = Document::new(
//!     kml.element("kml").with_child(
//!         kml.element("Placemark")
//!             .with_child(kml.element("name").with_text("Hello World!"))
//!             .with_child(
//!                 kml.element("Point")
//!                     .with_child(kml.element("coordinates").with_text("-91.35,0,0")),
//!             ),
//!     ),
//! );
//! assert_eq!(kml_xml::count_elements(&doc)[&Some(kml_xml::KML_NAMESPACE.to_string())].len(), 5);
//! ```

use crate::namespaces::{ATOM_NAMESPACE, GX_NAMESPACE, KML_NAMESPACE, conventional_prefix};
use crate::{Attribute, Comment, Element, Node, QName};

/// Makes elements in a fixed namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementMaker {
    namespace: Option<String>,
    prefix: Option<String>,
}

impl ElementMaker {
    /// A maker for `namespace`; `None` makes elements in no namespace.
    pub fn new(namespace: Option<&str>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            prefix: None,
        }
    }

    /// Prefer `prefix` when the elements are serialized.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// OGC KML elements, serialized in the default namespace.
    pub fn kml() -> Self {
        Self::new(Some(KML_NAMESPACE))
    }

    pub fn atom() -> Self {
        Self::new(Some(ATOM_NAMESPACE)).with_prefix("atom")
    }

    pub fn gx() -> Self {
        Self::new(Some(GX_NAMESPACE)).with_prefix("gx")
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Create an empty element with this maker's namespace.
    pub fn element(&self, local: &str) -> Element {
        let mut element = Element::new(QName::new(self.namespace.as_deref(), local));
        element.prefix = self.prefix.clone();
        element
    }
}

impl Element {
    /// Set the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append an attribute in no namespace.
    pub fn with_attribute(self, name: &str, value: impl Into<String>) -> Self {
        self.with_qualified_attribute(QName::local(name), value)
    }

    /// Append a namespaced attribute.
    pub fn with_qualified_attribute(mut self, name: QName, value: impl Into<String>) -> Self {
        let prefix = name
            .namespace()
            .and_then(conventional_prefix)
            .map(str::to_string);
        let mut attribute = Attribute::new(name, value);
        attribute.prefix = prefix;
        self.attributes.push(attribute);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_comment(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Comment(Comment::new(text)));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_makers() {
        let placemark = ElementMaker::kml().element("Placemark");
        assert_eq!(placemark.name, QName::new(Some(KML_NAMESPACE), "Placemark"));
        assert_eq!(placemark.prefix, None);

        let tour = ElementMaker::gx().element("Tour");
        assert_eq!(tour.namespace(), Some(GX_NAMESPACE));
        assert_eq!(tour.prefix.as_deref(), Some("gx"));

        let plain = ElementMaker::new(None).element("x");
        assert_eq!(plain.name, QName::local("x"));
    }

    #[test]
    fn test_chaining_preserves_order() {
        let element = ElementMaker::atom()
            .element("link")
            .with_attribute("rel", "alternate")
            .with_attribute("href", "http://example.org")
            .with_comment(" c ")
            .with_child(ElementMaker::atom().element("x"));

        let names: Vec<_> = element
            .attributes
            .iter()
            .map(|a| a.name.local.as_str())
            .collect();
        assert_eq!(names, vec!["rel", "href"]);
        assert!(matches!(element.children[0], Node::Comment(_)));
        assert!(matches!(element.children[1], Node::Element(_)));
    }

    #[test]
    fn test_qualified_attribute_gets_conventional_prefix() {
        let element = Element::new(QName::local("a")).with_qualified_attribute(
            QName::new(Some(crate::namespaces::XML_NAMESPACE), "lang"),
            "en",
        );
        assert_eq!(element.attributes[0].prefix.as_deref(), Some("xml"));
    }
}
