//! Event-driven generation of pyKML builder scripts.
//!
//! The emitter consumes [`TreeEvent`]s one at a time and appends to a
//! single output buffer. It tracks the nesting depth, whether the previous
//! event was an element opening (so a childless element can be closed on
//! its opening line), and the comments found beside the root, which are
//! attached with `addprevious`/`addnext` once the tree is written.

use crate::literal::{double_quoted, format_text, is_identifier, python_repr};
use crate::{Error, NamespaceTable, Result};
use kml_xml::{Attribute, Comment, Document, Element, TreeEvent};
use tracing::debug;

const INDENT_SIZE: usize = 2;

const EPILOGUE: &str = "print(etree.tostring(etree.ElementTree(doc), \n                     encoding='utf-8', \n                     xml_declaration=True, \n                     pretty_print=True).decode('utf-8'))\n";

/// Where the emitter is relative to the root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterState {
    BeforeRoot,
    InTree,
    AfterRoot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastEvent {
    Open,
    Close,
    Comment,
}

/// An element whose call is still open.
#[derive(Debug)]
struct Frame {
    /// A tag literal or text precedes any further argument.
    has_leading_argument: bool,
}

/// Generate a script with the default pyKML namespace table.
///
/// ```
/// use kml_script::transpile;
///
/// let doc = kml_xml::parse(r#"<kml xmlns="http://www.opengis.net/kml/2.2"><name>Hi</name></kml>"#).unwrap();
/// let script = transpile(&doc).unwrap();
/// assert!(script.contains("doc = KML.kml(\n  KML.name('Hi'),\n)\n"));
/// ```
pub fn transpile(doc: &Document) -> Result<String> {
    transpile_with(doc, &NamespaceTable::default())
}

/// Generate a script for `doc` using `table`.
pub fn transpile_with(doc: &Document, table: &NamespaceTable) -> Result<String> {
    transpile_events(doc.events(), table)
}

/// Generate a script from any well-nested event stream.
pub fn transpile_events<'a, I>(events: I, table: &NamespaceTable) -> Result<String>
where
    I: IntoIterator<Item = TreeEvent<'a>>,
{
    let mut emitter = ScriptEmitter::new(table);
    for event in events {
        emitter.emit(event)?;
    }
    emitter.finish()
}

/// State machine turning tree events into script text.
#[derive(Debug)]
pub struct ScriptEmitter<'t> {
    table: &'t NamespaceTable,
    out: String,
    state: EmitterState,
    frames: Vec<Frame>,
    last: Option<LastEvent>,
    leading: Vec<String>,
    trailing: Vec<String>,
}

impl<'t> ScriptEmitter<'t> {
    /// Start a script: writes the imports and `doc = `.
    pub fn new(table: &'t NamespaceTable) -> Self {
        let mut out = String::new();
        out.push_str("from __future__ import unicode_literals\n");
        out.push_str("from __future__ import print_function\n");
        out.push_str("from lxml import etree\n");
        for entry in table.entries() {
            out.push_str(&format!(
                "from pykml.factory import {} as {}\n",
                entry.factory, entry.identifier
            ));
        }
        out.push('\n');
        out.push_str("doc = ");

        Self {
            table,
            out,
            state: EmitterState::BeforeRoot,
            frames: Vec::new(),
            last: None,
            leading: Vec::new(),
            trailing: Vec::new(),
        }
    }

    pub fn state(&self) -> EmitterState {
        self.state
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn indent(&self) -> String {
        " ".repeat(self.depth() * INDENT_SIZE)
    }

    pub fn emit(&mut self, event: TreeEvent<'_>) -> Result<()> {
        match event {
            TreeEvent::Open(element) => self.open(element)?,
            TreeEvent::Close(element) => self.close(element),
            TreeEvent::Comment(comment) => self.comment(comment),
        }
        Ok(())
    }

    /// Separate the parent's tag literal or text from its first child.
    fn before_child(&mut self) {
        let needs_comma = self.last == Some(LastEvent::Open)
            && self
                .frames
                .last()
                .is_some_and(|frame| frame.has_leading_argument);
        if needs_comma && self.out.ends_with('\n') {
            self.out.pop();
            self.out.push_str(",\n");
        }
    }

    fn open(&mut self, element: &Element) -> Result<()> {
        if self.state == EmitterState::AfterRoot {
            debug!(element = %element.name, "element after the root closed");
        }
        if self.depth() > 0 {
            self.before_child();
        }

        let identifier =
            self.table
                .resolve(element.namespace())
                .ok_or_else(|| Error::UnknownNamespace {
                    namespace: element.namespace().unwrap_or_default().to_string(),
                    element: element.local_name().to_string(),
                    location: element.source_info.clone(),
                })?;

        let indent = self.indent();
        let text = format_text(element.text(), &indent);
        let local = element.local_name();

        let (callee, tag_literal) = if is_identifier(local) {
            (format!("{}.{}(", identifier, local), false)
        } else {
            (format!("{}({}", identifier, python_repr(local)), true)
        };
        let separator = match (tag_literal, text.has_literal) {
            (true, true) if text.code.starts_with('\n') => ",",
            (true, true) => ", ",
            _ => "",
        };

        self.out
            .push_str(&format!("{}{}{}{}\n", indent, callee, separator, text.code));
        self.frames.push(Frame {
            has_leading_argument: tag_literal || text.has_literal,
        });
        self.state = EmitterState::InTree;
        self.last = Some(LastEvent::Open);
        Ok(())
    }

    fn close(&mut self, element: &Element) {
        let Some(frame) = self.frames.pop() else {
            debug!(element = %element.name, "close without a matching open; ignored");
            return;
        };

        let indent = if self.last == Some(LastEvent::Open) {
            // Collapse onto the opening line.
            if self.out.ends_with('\n') {
                self.out.pop();
            }
            if frame.has_leading_argument && !element.attributes.is_empty() {
                self.out.push(',');
            }
            String::new()
        } else {
            self.indent()
        };

        for attribute in &element.attributes {
            self.out
                .push_str(&format!("{}  {}\n", indent, keyword_argument(attribute)));
        }
        self.out.push_str(&format!("{}),\n", indent));

        if self.frames.is_empty() {
            self.state = EmitterState::AfterRoot;
        }
        self.last = Some(LastEvent::Close);
    }

    fn comment(&mut self, comment: &Comment) {
        let indent = self.indent();
        let text = format_text(Some(comment.text.as_str()), &indent);

        if self.frames.is_empty() {
            let entry = format!("etree.Comment({})", text.code);
            match self.state {
                EmitterState::BeforeRoot => self.leading.push(entry),
                EmitterState::InTree | EmitterState::AfterRoot => self.trailing.push(entry),
            }
        } else {
            self.before_child();
            self.out
                .push_str(&format!("{}etree.Comment({}),\n", indent, text.code));
        }
        self.last = Some(LastEvent::Comment);
    }

    /// Complete the script: drop the comma after the root call, attach the
    /// root-level comments and print the document.
    pub fn finish(mut self) -> Result<String> {
        if self.state == EmitterState::BeforeRoot {
            return Err(Error::NoRootElement);
        }
        if !self.frames.is_empty() {
            debug!(open = self.frames.len(), "event stream ended inside the tree");
        }

        if self.out.ends_with(",\n") {
            self.out.truncate(self.out.len() - 2);
            self.out.push('\n');
        }

        for entry in &self.leading {
            self.out.push_str(&format!("doc.addprevious({})\n", entry));
        }
        // Each addnext inserts directly after the root, so the last comment
        // goes first.
        for entry in self.trailing.iter().rev() {
            self.out.push_str(&format!("doc.addnext({})\n", entry));
        }

        self.out.push_str(EPILOGUE);
        debug!(
            bytes = self.out.len(),
            leading = self.leading.len(),
            trailing = self.trailing.len(),
            "generated script"
        );
        Ok(self.out)
    }
}

/// An attribute as a keyword argument, `**{...}` when its name is not a
/// plain Python identifier.
fn keyword_argument(attribute: &Attribute) -> String {
    if attribute.name.namespace.is_none() && is_identifier(&attribute.name.local) {
        format!("{}={},", attribute.name.local, double_quoted(&attribute.value))
    } else {
        format!(
            "**{{{}: {}}},",
            python_repr(&attribute.name.to_clark()),
            python_repr(&attribute.value)
        )
    }
}
