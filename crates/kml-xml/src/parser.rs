//! Namespace-aware parser that builds [`Document`] trees.

use crate::{
    Attribute, Comment, Document, Element, Error, NamespaceDeclaration, Node, ParseResult, QName,
    Result, XmlParseContext,
};
use kml_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder, FileId, SourceInfo};
use quick_xml::NsReader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::name::{PrefixDeclaration, ResolveResult};
use std::borrow::Cow;
use tracing::{debug, warn};

/// Parse a document from a string.
///
/// Warnings are logged and otherwise discarded; use
/// [`parse_with_context`] to collect them.
///
/// ```rust
/// use kml_xml::parse;
///
/// let doc = parse(r#"<kml xmlns="http://www.opengis.net/kml/2.2">
///   <Placemark><name>Hello</name></Placemark>
/// </kml>"#).unwrap();
///
/// assert_eq!(doc.root.local_name(), "kml");
/// assert_eq!(doc.root.namespace(), Some("http://www.opengis.net/kml/2.2"));
/// let placemark = doc.root.find_child("Placemark").unwrap();
/// assert_eq!(placemark.find_child("name").unwrap().text(), Some("Hello"));
/// ```
pub fn parse(content: &str) -> Result<Document> {
    parse_with_file_id(content, FileId(0))
}

/// Parse a document, tagging source positions with `file_id`.
pub fn parse_with_file_id(content: &str, file_id: FileId) -> Result<Document> {
    let mut parser = XmlParser::new(content, file_id);
    parser.parse()
}

/// Parse a document, collecting warnings and errors as diagnostics.
///
/// # Errors
///
/// Returns the diagnostics for the error that stopped parsing. The same
/// diagnostics are also recorded in `ctx`.
pub fn parse_with_context(content: &str, ctx: &mut XmlParseContext) -> ParseResult<Document> {
    let mut parser = XmlParser::new(content, ctx.file_id);
    let result = parser.parse();

    for warning in parser.warnings.drain(..) {
        ctx.add_diagnostic(warning);
    }

    result.map_err(|err| {
        let diagnostic = err.to_diagnostic();
        ctx.add_diagnostic(diagnostic.clone());
        vec![diagnostic]
    })
}

struct XmlParser<'a> {
    reader: NsReader<&'a [u8]>,
    file_id: FileId,
    stack: Vec<BuildNode>,
    leading_comments: Vec<Comment>,
    trailing_comments: Vec<Comment>,
    root: Option<Element>,
    warnings: Vec<DiagnosticMessage>,
}

/// An element being constructed during parsing.
struct BuildNode {
    name: QName,
    /// Name as written, used to match the end tag.
    raw_name: String,
    prefix: Option<String>,
    namespace_declarations: Vec<NamespaceDeclaration>,
    attributes: Vec<Attribute>,
    /// Byte offset of the `<` of the start tag.
    start_offset: usize,
    text: Option<String>,
    children: Vec<Node>,
}

impl BuildNode {
    fn finish(self, source_info: SourceInfo) -> Element {
        let text = match self.text {
            Some(t) if t.is_empty() => None,
            Some(t) if !self.children.is_empty() && t.trim().is_empty() => None,
            other => other,
        };

        Element {
            name: self.name,
            prefix: self.prefix,
            namespace_declarations: self.namespace_declarations,
            attributes: self.attributes,
            text,
            children: self.children,
            source_info: Some(source_info),
        }
    }
}

/// End-of-line handling: `\r\n` and a lone `\r` both become `\n`.
///
/// Applied to raw markup, before references are expanded, so `&#13;`
/// still yields a carriage return.
fn normalize_line_ends(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\r') {
        return Cow::Borrowed(raw);
    }
    Cow::Owned(raw.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Attribute-value normalization: after end-of-line handling every tab
/// and line feed in the raw value becomes a space.
fn normalize_attribute_value(raw: &str) -> Cow<'_, str> {
    let value = normalize_line_ends(raw);
    if !value.contains(['\n', '\t']) {
        return value;
    }
    Cow::Owned(value.replace(['\n', '\t'], " "))
}

/// Owned form of a quick-xml namespace resolution; `Err` holds the
/// unbound prefix.
fn owned_namespace(resolved: ResolveResult<'_>) -> std::result::Result<Option<String>, String> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(String::from_utf8_lossy(&prefix).into_owned()),
    }
}

impl<'a> XmlParser<'a> {
    fn new(source: &'a str, file_id: FileId) -> Self {
        let mut reader = NsReader::from_str(source);
        let config = reader.config_mut();
        config.trim_text_start = false;
        config.trim_text_end = false;
        // Mismatches are reported by `handle_end` with a location.
        config.check_end_names = false;

        Self {
            reader,
            file_id,
            stack: Vec::new(),
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
            root: None,
            warnings: Vec::new(),
        }
    }

    fn source_info(&self, start: usize, end: usize) -> SourceInfo {
        SourceInfo::original(self.file_id, start, end)
    }

    fn parse(&mut self) -> Result<Document> {
        loop {
            let event_start = self.reader.buffer_position() as usize;

            let (resolved, event) = match self.reader.read_resolved_event() {
                Ok(pair) => pair,
                Err(err) => {
                    let position = self.reader.error_position() as usize;
                    return Err(Error::XmlSyntax {
                        message: err.to_string(),
                        location: Some(self.source_info(position, position)),
                    });
                }
            };
            let namespace = owned_namespace(resolved);

            match event {
                Event::Start(e) => {
                    let node = self.start_node(&e, namespace, event_start)?;
                    self.stack.push(node);
                }
                Event::Empty(e) => {
                    let node = self.start_node(&e, namespace, event_start)?;
                    let end_offset = self.reader.buffer_position() as usize;
                    let element = node.finish(self.source_info(event_start, end_offset));
                    self.attach(element)?;
                }
                Event::End(e) => {
                    let found = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let element = self.handle_end(found, event_start)?;
                    self.attach(element)?;
                }
                Event::Text(e) => self.handle_text(&e, event_start)?,
                Event::CData(e) => {
                    let raw = String::from_utf8_lossy(e.as_ref());
                    let text = normalize_line_ends(&raw).into_owned();
                    self.push_text(text, event_start)?;
                }
                Event::Comment(e) => self.handle_comment(&e, event_start),
                Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        if let Some(node) = self.stack.last() {
            return Err(Error::UnexpectedEof {
                expected: format!("closing tag </{}>", node.raw_name),
                location: Some(self.source_info(node.start_offset, node.start_offset + 1)),
            });
        }

        let root = self.root.take().ok_or(Error::EmptyDocument)?;
        debug!(
            root = %root.name,
            leading = self.leading_comments.len(),
            trailing = self.trailing_comments.len(),
            "parsed document"
        );

        Ok(Document {
            leading_comments: std::mem::take(&mut self.leading_comments),
            root,
            trailing_comments: std::mem::take(&mut self.trailing_comments),
        })
    }

    fn start_node(
        &self,
        e: &BytesStart<'_>,
        namespace: std::result::Result<Option<String>, String>,
        event_start: usize,
    ) -> Result<BuildNode> {
        let raw_name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        // The whole tag has been read, `>` or `/>` included.
        let tag_end = self.reader.buffer_position() as usize;

        if self.stack.is_empty() && self.root.is_some() {
            return Err(Error::MultipleRoots {
                location: Some(self.source_info(event_start, tag_end)),
            });
        }

        let namespace = namespace.map_err(|prefix| Error::UnknownPrefix {
            prefix,
            name: raw_name.clone(),
            location: Some(self.source_info(event_start, tag_end)),
        })?;
        let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
        let prefix = e
            .name()
            .prefix()
            .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned());

        let mut namespace_declarations = Vec::new();
        let mut attributes = Vec::new();

        for attr_result in e.attributes() {
            let attr = attr_result?;
            let raw = String::from_utf8_lossy(&attr.value);
            let value = unescape(&normalize_attribute_value(&raw))
                .map_err(|err| Error::XmlSyntax {
                    message: format!("Invalid attribute value: {}", err),
                    location: Some(self.source_info(event_start, tag_end)),
                })?
                .into_owned();

            if let Some(binding) = attr.key.as_namespace_binding() {
                let prefix = match binding {
                    PrefixDeclaration::Default => None,
                    PrefixDeclaration::Named(p) => Some(String::from_utf8_lossy(p).into_owned()),
                };
                namespace_declarations.push(NamespaceDeclaration { prefix, uri: value });
                continue;
            }

            let (resolved, attr_local) = self.reader.resolve_attribute(attr.key);
            let attr_namespace = owned_namespace(resolved).map_err(|prefix| Error::UnknownPrefix {
                prefix,
                name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                location: Some(self.source_info(event_start, tag_end)),
            })?;

            attributes.push(Attribute {
                name: QName::new(
                    attr_namespace.as_deref(),
                    String::from_utf8_lossy(attr_local.as_ref()).into_owned(),
                ),
                prefix: attr
                    .key
                    .prefix()
                    .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned()),
                value,
            });
        }

        Ok(BuildNode {
            name: QName::new(namespace.as_deref(), local),
            raw_name,
            prefix,
            namespace_declarations,
            attributes,
            start_offset: event_start,
            text: None,
            children: Vec::new(),
        })
    }

    fn handle_end(&mut self, found: String, event_start: usize) -> Result<Element> {
        let end_offset = self.reader.buffer_position() as usize;

        let Some(node) = self.stack.pop() else {
            return Err(Error::InvalidStructure {
                message: format!("Unexpected closing tag </{}>", found),
                location: Some(self.source_info(event_start, end_offset)),
            });
        };

        if node.raw_name != found {
            return Err(Error::MismatchedEndTag {
                expected: node.raw_name,
                found,
                location: Some(self.source_info(event_start, end_offset)),
            });
        }

        let source_info = self.source_info(node.start_offset, end_offset);
        Ok(node.finish(source_info))
    }

    /// Add a finished element to its parent, or make it the root.
    fn attach(&mut self, element: Element) -> Result<()> {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(Node::Element(element)),
            None => {
                if self.root.is_some() {
                    return Err(Error::MultipleRoots {
                        location: element.source_info.clone(),
                    });
                }
                self.root = Some(element);
            }
        }
        Ok(())
    }

    fn handle_text(&mut self, e: &BytesText<'_>, event_start: usize) -> Result<()> {
        let raw = String::from_utf8_lossy(e.as_ref());
        let text = match unescape(&normalize_line_ends(&raw)) {
            Ok(text) => text.into_owned(),
            Err(err) => {
                let end_offset = self.reader.buffer_position() as usize;
                return Err(Error::XmlSyntax {
                    message: format!("Invalid text content: {}", err),
                    location: Some(self.source_info(event_start, end_offset)),
                });
            }
        };
        self.push_text(text, event_start)
    }

    fn push_text(&mut self, text: String, event_start: usize) -> Result<()> {
        let end_offset = self.reader.buffer_position() as usize;
        let source_info = self.source_info(event_start, end_offset);

        let Some(node) = self.stack.last_mut() else {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(Error::InvalidStructure {
                message: "Text content outside the root element".to_string(),
                location: Some(source_info),
            });
        };

        if node.children.is_empty() {
            node.text.get_or_insert_with(String::new).push_str(&text);
            return Ok(());
        }

        if !text.trim().is_empty() {
            warn!(element = %node.name, "dropping text after the first child element");
            let warning = DiagnosticMessageBuilder::warning("Mixed Content Ignored")
                .with_code("K-1-8")
                .problem(format!(
                    "Text after the first child of `<{}>` is not kept",
                    node.raw_name
                ))
                .add_info(format!("Dropped text: `{}`", text.trim()))
                .with_location(source_info)
                .build();
            self.warnings.push(warning);
        }
        Ok(())
    }

    fn handle_comment(&mut self, e: &BytesText<'_>, event_start: usize) {
        let end_offset = self.reader.buffer_position() as usize;
        let comment = Comment {
            text: normalize_line_ends(&String::from_utf8_lossy(e.as_ref())).into_owned(),
            source_info: Some(self.source_info(event_start, end_offset)),
        };

        match self.stack.last_mut() {
            Some(node) => node.children.push(Node::Comment(comment)),
            None if self.root.is_none() => self.leading_comments.push(comment),
            None => self.trailing_comments.push(comment),
        }
    }
}
