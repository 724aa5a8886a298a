//! Serialization of documents back to XML text.

use crate::namespaces::{KML_NAMESPACE, XML_NAMESPACE};
use crate::{Document, Element, Error, QName, Result, TreeEvent};
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;

/// Options for [`to_string`] and [`write_document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Spaces per nesting level; `None` writes everything on one line.
    pub indent: Option<usize>,
    /// Emit `<?xml version="1.0" encoding="UTF-8"?>` first.
    pub xml_declaration: bool,
    /// Elements whose text is written as CDATA instead of escaped text.
    pub cdata_elements: Vec<QName>,
}

/// KML elements that commonly carry HTML markup.
pub const KML_CDATA_ELEMENTS: [&str; 4] = ["description", "text", "linkDescription", "displayName"];

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent: Some(2),
            xml_declaration: true,
            cdata_elements: Vec::new(),
        }
    }
}

impl WriteOptions {
    /// Write the text of the [`KML_CDATA_ELEMENTS`] as CDATA sections.
    pub fn with_kml_cdata(mut self) -> Self {
        self.cdata_elements.extend(
            KML_CDATA_ELEMENTS
                .iter()
                .map(|local| QName::new(Some(KML_NAMESPACE), *local)),
        );
        self
    }
}

/// Serialize a document to a string.
///
/// ```rust
/// use kml_xml::{parse, to_string, WriteOptions};
///
/// let doc = parse(r#"<kml xmlns="http://www.opengis.net/kml/2.2"><name>a &amp; b</name></kml>"#).unwrap();
/// let options = WriteOptions { indent: None, xml_declaration: false, ..WriteOptions::default() };
/// assert_eq!(
///     to_string(&doc, &options).unwrap(),
///     r#"<kml xmlns="http://www.opengis.net/kml/2.2"><name>a &amp; b</name></kml>"#
/// );
/// ```
pub fn to_string(doc: &Document, options: &WriteOptions) -> Result<String> {
    let mut buffer = Vec::new();
    write_document(doc, &mut buffer, options)?;
    String::from_utf8(buffer).map_err(|err| Error::Write {
        message: err.to_string(),
    })
}

/// Serialize a document into `inner`.
pub fn write_document<W: Write>(doc: &Document, inner: W, options: &WriteOptions) -> Result<()> {
    let writer = match options.indent {
        Some(size) => Writer::new_with_indent(inner, b' ', size),
        None => Writer::new(inner),
    };
    let mut serializer = Serializer {
        writer,
        cdata_elements: &options.cdata_elements,
        scopes: Vec::new(),
        open_tags: Vec::new(),
        generated_prefixes: 0,
    };

    if options.xml_declaration {
        serializer
            .writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        if options.indent.is_none() {
            serializer.writer.get_mut().write_all(b"\n")?;
        }
    }

    for event in doc.events() {
        match event {
            TreeEvent::Open(element) => serializer.open(element)?,
            TreeEvent::Close(element) => serializer.close(element)?,
            TreeEvent::Comment(comment) => {
                serializer
                    .writer
                    .write_event(Event::Comment(BytesText::from_escaped(comment.text.as_str())))?;
            }
        }
    }

    if options.indent.is_some() {
        serializer.writer.get_mut().write_all(b"\n")?;
    }
    Ok(())
}

/// Namespace bindings of one element: `(prefix, uri)`, `None` for the
/// default namespace and an empty uri for an undeclared default.
type Frame = Vec<(Option<String>, String)>;

struct Serializer<'o, W: Write> {
    writer: Writer<W>,
    cdata_elements: &'o [QName],
    scopes: Vec<Frame>,
    /// Tag names of open non-empty elements.
    open_tags: Vec<String>,
    generated_prefixes: usize,
}

impl<W: Write> Serializer<'_, W> {
    fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    fn declared_here(&self, prefix: Option<&str>) -> bool {
        self.scopes
            .last()
            .is_some_and(|frame| frame.iter().any(|(p, _)| p.as_deref() == prefix))
    }

    fn declare(&mut self, prefix: Option<String>, uri: &str) {
        if let Some(frame) = self.scopes.last_mut() {
            frame.push((prefix, uri.to_string()));
        }
    }

    /// A non-default prefix currently bound to `uri`.
    fn prefix_for(&self, uri: &str) -> Option<String> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .filter_map(|(p, u)| p.as_deref().filter(|_| u == uri))
            .find(|p| self.lookup(Some(*p)) == Some(uri))
            .map(str::to_string)
    }

    fn fresh_prefix(&mut self) -> String {
        loop {
            self.generated_prefixes += 1;
            let candidate = format!("ns{}", self.generated_prefixes);
            if self.lookup(Some(candidate.as_str())).is_none()
                && !self.declared_here(Some(candidate.as_str()))
            {
                return candidate;
            }
        }
    }

    fn element_name(&mut self, element: &Element) -> String {
        let local = &element.name.local;
        let Some(uri) = element.name.namespace() else {
            if self.lookup(None).is_some() {
                self.declare(None, "");
            }
            return local.clone();
        };

        if let Some(prefix) = element.prefix.as_deref() {
            if self.lookup(Some(prefix)) == Some(uri) {
                return format!("{}:{}", prefix, local);
            }
            if !self.declared_here(Some(prefix)) {
                self.declare(Some(prefix.to_string()), uri);
                return format!("{}:{}", prefix, local);
            }
        } else if self.lookup(None) == Some(uri) {
            return local.clone();
        }

        if !self.declared_here(None) {
            self.declare(None, uri);
            return local.clone();
        }
        let prefix = self.fresh_prefix();
        self.declare(Some(prefix.clone()), uri);
        format!("{}:{}", prefix, local)
    }

    fn attribute_name(&mut self, attribute: &crate::Attribute) -> String {
        let local = &attribute.name.local;
        let Some(uri) = attribute.name.namespace() else {
            return local.clone();
        };
        if uri == XML_NAMESPACE {
            return format!("xml:{}", local);
        }

        if let Some(prefix) = attribute.prefix.as_deref()
            && self.lookup(Some(prefix)) == Some(uri)
        {
            return format!("{}:{}", prefix, local);
        }
        if let Some(prefix) = self.prefix_for(uri) {
            return format!("{}:{}", prefix, local);
        }

        let prefix = match attribute.prefix.as_deref() {
            Some(p) if !self.declared_here(Some(p)) => p.to_string(),
            _ => self.fresh_prefix(),
        };
        self.declare(Some(prefix.clone()), uri);
        format!("{}:{}", prefix, local)
    }

    fn open(&mut self, element: &Element) -> Result<()> {
        self.scopes.push(
            element
                .namespace_declarations
                .iter()
                .map(|d| (d.prefix.clone(), d.uri.clone()))
                .collect(),
        );

        let name = self.element_name(element);
        let attributes: Vec<(String, &str)> = element
            .attributes
            .iter()
            .map(|a| (self.attribute_name(a), a.value.as_str()))
            .collect();

        let mut start = BytesStart::new(name.as_str());
        if let Some(frame) = self.scopes.last() {
            for (prefix, uri) in frame {
                let key = match prefix {
                    Some(p) => format!("xmlns:{}", p),
                    None => "xmlns".to_string(),
                };
                start.push_attribute((key.as_str(), uri.as_str()));
            }
        }
        for (key, value) in &attributes {
            start.push_attribute((key.as_str(), *value));
        }

        let text = element.text();
        if element.is_leaf() && text.is_none() {
            self.writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        self.writer.write_event(Event::Start(start))?;
        match text {
            Some(text) if self.cdata_elements.contains(&element.name) => self.write_cdata(text)?,
            Some(text) => self.writer.write_event(Event::Text(BytesText::new(text)))?,
            None => {}
        }
        self.open_tags.push(name);
        Ok(())
    }

    /// Write `text` as CDATA, splitting the section wherever the text
    /// contains `]]>`.
    fn write_cdata(&mut self, text: &str) -> Result<()> {
        let mut rest = text;
        while let Some(end) = rest.find("]]>") {
            let (section, tail) = rest.split_at(end + 2);
            self.writer.write_event(Event::CData(BytesCData::new(section)))?;
            rest = tail;
        }
        self.writer.write_event(Event::CData(BytesCData::new(rest)))?;
        Ok(())
    }

    fn close(&mut self, element: &Element) -> Result<()> {
        self.scopes.pop();
        if element.is_leaf() && element.text().is_none() {
            return Ok(());
        }
        if let Some(name) = self.open_tags.pop() {
            self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::{ATOM_NAMESPACE, GX_NAMESPACE, KML_NAMESPACE};
    use crate::{ElementMaker, QName, parse};

    fn compact() -> WriteOptions {
        WriteOptions {
            indent: None,
            xml_declaration: false,
            ..WriteOptions::default()
        }
    }

    #[test]
    fn test_reparse_is_equal() {
        let source = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- lead -->
<kml xmlns="{KML_NAMESPACE}" xmlns:gx="{GX_NAMESPACE}" xmlns:atom="{ATOM_NAMESPACE}">
  <Document id="d1">
    <atom:link href="http://example.org/?a=1&amp;b=2"/>
    <!-- inside -->
    <Placemark>
      <name>Hello "World"</name>
      <gx:balloonVisibility>1</gx:balloonVisibility>
    </Placemark>
  </Document>
</kml>
<!-- trail -->"#
        );
        let doc = parse(&source).unwrap();
        let written = to_string(&doc, &WriteOptions::default()).unwrap();
        let reparsed = parse(&written).unwrap();
        assert_eq!(doc, reparsed);
        assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    }

    #[test]
    fn test_builder_elements_get_declarations() {
        let kml = ElementMaker::kml();
        let doc = Document::new(
            kml.element("kml")
                .with_child(ElementMaker::gx().element("Tour"))
                .with_child(ElementMaker::atom().element("author")),
        );

        let written = to_string(&doc, &compact()).unwrap();
        assert_eq!(
            written,
            format!(
                r#"<kml xmlns="{KML_NAMESPACE}"><gx:Tour xmlns:gx="{GX_NAMESPACE}"/><atom:author xmlns:atom="{ATOM_NAMESPACE}"/></kml>"#
            )
        );
        assert_eq!(parse(&written).unwrap(), doc);
    }

    #[test]
    fn test_no_namespace_child_undeclares_default() {
        let doc = Document::new(
            ElementMaker::kml()
                .element("kml")
                .with_child(Element::new(QName::local("plain"))),
        );
        let written = to_string(&doc, &compact()).unwrap();
        assert!(written.contains(r#"<plain xmlns=""/>"#));
        assert_eq!(parse(&written).unwrap(), doc);
    }

    #[test]
    fn test_namespaced_attribute_gets_generated_prefix() {
        let doc = Document::new(
            Element::new(QName::local("a"))
                .with_qualified_attribute(QName::new(Some("urn:x"), "flag"), "1"),
        );
        let written = to_string(&doc, &compact()).unwrap();
        assert_eq!(written, r#"<a xmlns:ns1="urn:x" ns1:flag="1"/>"#);
        assert_eq!(parse(&written).unwrap(), doc);
    }

    #[test]
    fn test_indented_output() {
        let kml = ElementMaker::kml();
        let doc = Document::new(
            kml.element("kml")
                .with_child(kml.element("name").with_text("x")),
        );
        let written = to_string(&doc, &WriteOptions::default()).unwrap();
        assert_eq!(
            written,
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<kml xmlns=\"{KML_NAMESPACE}\">\n  <name>x</name>\n</kml>\n"
            )
        );
    }

    #[test]
    fn test_cdata_elements() {
        let doc = parse(&format!(
            r#"<kml xmlns="{KML_NAMESPACE}"><Placemark><name>a &lt;b&gt;</name><description><![CDATA[<h1>Hi</h1>]]></description></Placemark></kml>"#
        ))
        .unwrap();

        let written = to_string(&doc, &compact().with_kml_cdata()).unwrap();
        assert_eq!(
            written,
            format!(
                r#"<kml xmlns="{KML_NAMESPACE}"><Placemark><name>a &lt;b&gt;</name><description><![CDATA[<h1>Hi</h1>]]></description></Placemark></kml>"#
            )
        );
        assert_eq!(parse(&written).unwrap(), doc);

        let escaped = to_string(&doc, &compact()).unwrap();
        assert!(escaped.contains("<description>&lt;h1&gt;Hi&lt;/h1&gt;</description>"));
    }

    #[test]
    fn test_cdata_end_marker_is_split() {
        let kml = ElementMaker::kml();
        let doc = Document::new(kml.element("description").with_text("a]]>b"));

        let written = to_string(&doc, &compact().with_kml_cdata()).unwrap();
        assert_eq!(
            written,
            format!(r#"<description xmlns="{KML_NAMESPACE}"><![CDATA[a]]]]><![CDATA[>b]]></description>"#)
        );
        assert_eq!(parse(&written).unwrap(), doc);
    }

    #[test]
    fn test_cdata_only_in_kml_namespace() {
        let doc = Document::new(Element::new(QName::local("description")).with_text("<x>"));
        let written = to_string(&doc, &compact().with_kml_cdata()).unwrap();
        assert_eq!(written, "<description>&lt;x&gt;</description>");
    }
}
