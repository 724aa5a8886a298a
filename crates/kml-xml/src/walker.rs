//! Streaming traversal of a document as open/close/comment events.
//!
//! The walk keeps an explicit stack of open elements, so arbitrarily deep
//! trees do not grow the call stack.

use crate::{Comment, Document, Element, Node};

/// A structural event produced by walking a tree in document order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TreeEvent<'a> {
    Open(&'a Element),
    Close(&'a Element),
    Comment(&'a Comment),
}

/// Iterator over the [`TreeEvent`]s of a document or subtree.
///
/// ```rust
/// use kml_xml::{parse, TreeEvent};
///
/// let doc = parse("<!--a--><kml><name>x</name></kml>").unwrap();
/// let kinds: Vec<&str> = doc
///     .events()
///     .map(|event| match event {
///         TreeEvent::Open(_) => "open",
///         TreeEvent::Close(_) => "close",
///         TreeEvent::Comment(_) => "comment",
///     })
///     .collect();
/// assert_eq!(kinds, ["comment", "open", "open", "close", "close"]);
/// ```
#[derive(Debug, Clone)]
pub struct Events<'a> {
    leading: std::slice::Iter<'a, Comment>,
    root: Option<&'a Element>,
    /// Open elements with the index of the next child to visit.
    stack: Vec<(&'a Element, usize)>,
    trailing: std::slice::Iter<'a, Comment>,
}

impl<'a> Events<'a> {
    fn new(leading: &'a [Comment], root: &'a Element, trailing: &'a [Comment]) -> Self {
        Self {
            leading: leading.iter(),
            root: Some(root),
            stack: Vec::new(),
            trailing: trailing.iter(),
        }
    }

    /// Current nesting depth: the number of open elements.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl<'a> Iterator for Events<'a> {
    type Item = TreeEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(comment) = self.leading.next() {
            return Some(TreeEvent::Comment(comment));
        }

        if let Some(root) = self.root.take() {
            self.stack.push((root, 0));
            return Some(TreeEvent::Open(root));
        }

        if let Some((element, index)) = self.stack.last_mut() {
            let element: &'a Element = *element;
            return match element.children.get(*index) {
                Some(child) => {
                    *index += 1;
                    match child {
                        Node::Element(child) => {
                            self.stack.push((child, 0));
                            Some(TreeEvent::Open(child))
                        }
                        Node::Comment(comment) => Some(TreeEvent::Comment(comment)),
                    }
                }
                None => {
                    self.stack.pop();
                    Some(TreeEvent::Close(element))
                }
            };
        }

        self.trailing.next().map(TreeEvent::Comment)
    }
}

impl Document {
    /// Walk the document: leading comments, the root subtree, then
    /// trailing comments.
    pub fn events(&self) -> Events<'_> {
        Events::new(&self.leading_comments, &self.root, &self.trailing_comments)
    }
}

impl Element {
    /// Walk this element's subtree.
    pub fn events(&self) -> Events<'_> {
        Events::new(&[], self, &[])
    }
}
