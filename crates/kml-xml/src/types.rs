//! Core types of the document model.
//!
//! A [`Document`] is a root [`Element`] plus the comments that sit next to
//! it. Elements keep their attributes in the order they were reported and
//! interleave child elements and comments in a single ordered list.

use kml_error_reporting::SourceInfo;
use std::fmt;

/// A qualified name: optional namespace URI plus local name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
            local: local.into(),
        }
    }

    /// A name in no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    /// Split a name in Clark notation (`{uri}local`) into its parts.
    ///
    /// Anything that is not of the form `{uri}local` with a non-empty URI
    /// and local name is taken as a local name without namespace.
    ///
    /// ```
    /// use kml_xml::QName;
    ///
    /// let name = QName::parse_clark("{http://www.opengis.net/kml/2.2}Placemark");
    /// assert_eq!(name.namespace.as_deref(), Some("http://www.opengis.net/kml/2.2"));
    /// assert_eq!(name.local, "Placemark");
    ///
    /// assert_eq!(QName::parse_clark("name"), QName::local("name"));
    /// ```
    pub fn parse_clark(qualified: &str) -> Self {
        if let Some(rest) = qualified.strip_prefix('{')
            && let Some((namespace, local)) = rest.split_once('}')
            && !namespace.is_empty()
            && !local.is_empty()
        {
            return Self::new(Some(namespace), local);
        }
        Self::local(qualified)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Render in Clark notation; names without namespace render bare.
    pub fn to_clark(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// An `xmlns` / `xmlns:prefix` binding declared on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDeclaration {
    /// `None` for the default namespace.
    pub prefix: Option<String>,
    pub uri: String,
}

/// An attribute. Equality ignores the source prefix.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QName,
    /// Prefix used in the source, if any.
    pub prefix: Option<String>,
    /// The attribute value (after unescaping XML entities).
    pub value: String,
}

impl Attribute {
    pub fn new(name: QName, value: impl Into<String>) -> Self {
        Self {
            name,
            prefix: None,
            value: value.into(),
        }
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

/// A comment node.
#[derive(Debug, Clone)]
pub struct Comment {
    pub text: String,
    pub source_info: Option<SourceInfo>,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_info: None,
        }
    }
}

impl PartialEq for Comment {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

/// A child of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Comment(Comment),
}

/// An element.
///
/// Equality covers what a builder script can reproduce: the qualified
/// name, attributes in order, text and children. Source prefixes,
/// namespace declarations and source positions are presentation details
/// and do not participate.
///
/// Equality, cloning and dropping work with an explicit stack, so trees of
/// any depth are safe to handle.
#[derive(Debug)]
pub struct Element {
    pub name: QName,

    /// Prefix used in the source (e.g., "gx" in `<gx:Tour>`).
    pub prefix: Option<String>,

    /// Namespace bindings declared on this element, in source order.
    pub namespace_declarations: Vec<NamespaceDeclaration>,

    /// Attributes in reported order.
    pub attributes: Vec<Attribute>,

    /// Character data before the first child.
    pub text: Option<String>,

    /// Child elements and comments, in document order.
    pub children: Vec<Node>,

    /// Source range from `<` of the start tag to `>` of the end tag.
    pub source_info: Option<SourceInfo>,
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            if left.name != right.name
                || left.attributes != right.attributes
                || left.text != right.text
                || left.children.len() != right.children.len()
            {
                return false;
            }
            for pair in left.children.iter().zip(&right.children) {
                match pair {
                    (Node::Element(l), Node::Element(r)) => pending.push((l, r)),
                    (Node::Comment(l), Node::Comment(r)) if l == r => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

impl Clone for Element {
    fn clone(&self) -> Self {
        // (source, copy holding the children copied so far, next child)
        let mut parents: Vec<(&Element, Element, usize)> = Vec::new();
        let mut current = (self, self.shallow_clone(), 0);
        loop {
            let source = current.0;
            match source.children.get(current.2) {
                Some(Node::Comment(comment)) => {
                    current.1.children.push(Node::Comment(comment.clone()));
                    current.2 += 1;
                }
                Some(Node::Element(child)) => {
                    current.2 += 1;
                    parents.push(std::mem::replace(
                        &mut current,
                        (child, child.shallow_clone(), 0),
                    ));
                }
                None => match parents.pop() {
                    Some(parent) => {
                        let (_, done, _) = std::mem::replace(&mut current, parent);
                        current.1.children.push(Node::Element(done));
                    }
                    None => return current.1,
                },
            }
        }
    }
}

impl Drop for Element {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let Node::Element(mut element) = node {
                pending.append(&mut element.children);
            }
        }
    }
}

impl Element {
    /// Create an element with no attributes, text or children.
    pub fn new(name: QName) -> Self {
        Self {
            name,
            prefix: None,
            namespace_declarations: Vec::new(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
            source_info: None,
        }
    }

    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace()
    }

    /// Text content, treating empty text as absent.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// Get an attribute value by local name, ignoring namespaces.
    pub fn get_attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.local == local)
            .map(|a| a.value.as_str())
    }

    /// Get an attribute value by qualified name.
    pub fn get_attribute_qualified(&self, name: &QName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| &a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Child elements, skipping comments.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            Node::Comment(_) => None,
        })
    }

    /// Child comments, skipping elements.
    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.children.iter().filter_map(|c| match c {
            Node::Comment(c) => Some(c),
            Node::Element(_) => None,
        })
    }

    /// Child elements with the given local name.
    pub fn get_children<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.child_elements().filter(move |e| e.name.local == local)
    }

    /// First child element with the given local name.
    pub fn find_child(&self, local: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.name.local == local)
    }

    /// A copy of everything but the children.
    fn shallow_clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            prefix: self.prefix.clone(),
            namespace_declarations: self.namespace_declarations.clone(),
            attributes: self.attributes.clone(),
            text: self.text.clone(),
            children: Vec::with_capacity(self.children.len()),
            source_info: self.source_info.clone(),
        }
    }

    /// An element without element or comment children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A parsed or constructed document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Comments before the root element, in order.
    pub leading_comments: Vec<Comment>,
    pub root: Element,
    /// Comments after the root element, in order.
    pub trailing_comments: Vec<Comment>,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self {
            leading_comments: Vec::new(),
            root,
            trailing_comments: Vec::new(),
        }
    }

    pub fn with_leading_comment(mut self, text: impl Into<String>) -> Self {
        self.leading_comments.push(Comment::new(text));
        self
    }

    pub fn with_trailing_comment(mut self, text: impl Into<String>) -> Self {
        self.trailing_comments.push(Comment::new(text));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clark_edge_cases() {
        assert_eq!(QName::parse_clark("{}x"), QName::local("{}x"));
        assert_eq!(QName::parse_clark("{urn:a}"), QName::local("{urn:a}"));
        assert_eq!(QName::parse_clark("{urn:a"), QName::local("{urn:a"));
        assert_eq!(
            QName::parse_clark("{urn:a}b"),
            QName::new(Some("urn:a"), "b")
        );
    }

    #[test]
    fn test_clark_display() {
        assert_eq!(QName::new(Some("urn:a"), "b").to_clark(), "{urn:a}b");
        assert_eq!(QName::local("b").to_string(), "b");
        // an empty namespace is no namespace
        assert_eq!(QName::new(Some(""), "b"), QName::local("b"));
    }

    #[test]
    fn test_element_get_attribute() {
        let mut element = Element::new(QName::local("link"));
        element
            .attributes
            .push(Attribute::new(QName::local("href"), "http://example.org"));
        element.attributes.push(Attribute::new(
            QName::new(Some("urn:x"), "href"),
            "other",
        ));

        assert_eq!(element.get_attribute("href"), Some("http://example.org"));
        assert_eq!(
            element.get_attribute_qualified(&QName::new(Some("urn:x"), "href")),
            Some("other")
        );
        assert_eq!(element.get_attribute("missing"), None);
    }

    #[test]
    fn test_equality_ignores_presentation() {
        let mut a = Element::new(QName::new(Some("urn:x"), "a"));
        let mut b = a.clone();
        a.prefix = Some("x".to_string());
        a.namespace_declarations.push(NamespaceDeclaration {
            prefix: Some("x".to_string()),
            uri: "urn:x".to_string(),
        });
        a.source_info = Some(SourceInfo::default());
        assert_eq!(a, b);

        b.text = Some("t".to_string());
        assert_ne!(a, b);
    }

    #[test]
    fn test_children_accessors() {
        let mut parent = Element::new(QName::local("Folder"));
        parent.children.push(Node::Comment(Comment::new(" c ")));
        parent
            .children
            .push(Node::Element(Element::new(QName::local("name"))));
        parent
            .children
            .push(Node::Element(Element::new(QName::local("Placemark"))));

        assert_eq!(parent.child_elements().count(), 2);
        assert_eq!(parent.comments().count(), 1);
        assert_eq!(parent.get_children("name").count(), 1);
        assert!(parent.find_child("Placemark").is_some());
        assert!(!parent.is_leaf());
    }

    #[test]
    fn test_empty_text_is_absent() {
        let mut element = Element::new(QName::local("name"));
        element.text = Some(String::new());
        assert_eq!(element.text(), None);
    }

    fn nested(depth: usize, bottom: &str) -> Element {
        let mut element = Element::new(QName::local("leaf")).with_comment(bottom);
        for _ in 0..depth {
            let mut parent = Element::new(QName::local("Folder"));
            parent.children.push(Node::Element(element));
            element = parent;
        }
        element
    }

    #[test]
    fn test_deep_tree_clone_compare_and_drop() {
        let tree = nested(200_000, "bottom");
        let copy = tree.clone();
        assert!(copy == tree);

        let other = nested(200_000, "changed");
        assert!(other != tree);

        drop(tree);
        drop(copy);
        drop(other);
    }

    #[test]
    fn test_clone_keeps_children_in_order() {
        let element = Element::new(QName::local("Document"))
            .with_comment("first")
            .with_child(Element::new(QName::local("name")).with_text("n"))
            .with_comment("last")
            .with_child(Element::new(QName::local("Folder")).with_child(Element::new(QName::local("x"))));
        let copy = element.clone();

        assert_eq!(copy, element);
        assert!(matches!(&copy.children[0], Node::Comment(c) if c.text == "first"));
        assert!(matches!(&copy.children[2], Node::Comment(c) if c.text == "last"));
        assert_eq!(copy.find_child("Folder").and_then(|f| f.find_child("x")).map(|x| x.local_name()), Some("x"));
    }

    #[test]
    fn test_comment_and_element_children_differ() {
        let a = Element::new(QName::local("a")).with_comment("x");
        let b = Element::new(QName::local("a")).with_child(Element::new(QName::local("x")));
        assert_ne!(a, b);
    }
}
