/*
 * script_reader/mod.rs
 *
 * Reads a generated builder script back into a Document.
 *
 * Understands exactly the Python subset the emitter writes: nested factory
 * calls, adjacent string literals, keyword and `**{...}` attributes,
 * `etree.Comment(...)` children and the `addprevious`/`addnext`
 * statements. Anything else is an error.
 */

use kml_script::NamespaceTable;
use kml_xml::{Attribute, Comment, Document, Element, Node, QName};

pub fn read_script(script: &str, table: &NamespaceTable) -> Result<Document, String> {
    let start = script
        .find("doc = ")
        .ok_or_else(|| "no `doc = ` assignment".to_string())?;
    let mut reader = Reader {
        chars: script[start + "doc = ".len()..].chars().collect(),
        pos: 0,
        table,
    };

    let root = reader.call()?;
    let mut doc = Document::new(root);

    loop {
        reader.skip_whitespace();
        if reader.eat("doc.addprevious(") {
            let comment = reader.comment_after_open()?;
            doc.leading_comments.push(comment);
        } else if reader.eat("doc.addnext(") {
            let comment = reader.comment_after_open()?;
            doc.trailing_comments.insert(0, comment);
        } else if reader.eat("print(") {
            break;
        } else {
            return Err(format!("unexpected statement at {}", reader.context()));
        }
        reader.skip_whitespace();
        reader.expect(")")?;
    }

    Ok(doc)
}

struct Reader<'t> {
    chars: Vec<char>,
    pos: usize,
    table: &'t NamespaceTable,
}

enum Argument {
    Strings(String),
    Element(Element),
    Comment(Comment),
    Attribute(Attribute),
}

impl Reader<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn context(&self) -> String {
        self.chars[self.pos..].iter().take(40).collect()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn looking_at(&self, token: &str) -> bool {
        let mut i = self.pos;
        for c in token.chars() {
            if self.chars.get(i) != Some(&c) {
                return false;
            }
            i += 1;
        }
        true
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.looking_at(token) {
            self.pos += token.chars().count();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), String> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(format!("expected `{}` at {:?}", token, self.context()))
        }
    }

    fn identifier(&mut self) -> Result<String, String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c == '_' || c.is_alphanumeric())
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(format!("expected identifier at {:?}", self.context()));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn string(&mut self) -> Result<String, String> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(format!("expected string at {:?}", self.context())),
        };
        self.pos += 1;

        let mut out = String::new();
        loop {
            let c = self.peek().ok_or("unterminated string")?;
            self.pos += 1;
            if c == quote {
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            let escaped = self.peek().ok_or("unterminated escape")?;
            self.pos += 1;
            match escaped {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                'x' => out.push(self.hex_escape(2)?),
                'u' => out.push(self.hex_escape(4)?),
                'U' => out.push(self.hex_escape(8)?),
                other => out.push(other),
            }
        }
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, String> {
        let hex: String = self.chars[self.pos..]
            .iter()
            .take(digits)
            .collect();
        self.pos += digits;
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| format!("bad escape `{}`", hex))
    }

    /// Adjacent literals concatenate.
    fn strings(&mut self) -> Result<String, String> {
        let mut out = self.string()?;
        loop {
            let save = self.pos;
            self.skip_whitespace();
            if matches!(self.peek(), Some('\'' | '"')) {
                out.push_str(&self.string()?);
            } else {
                self.pos = save;
                return Ok(out);
            }
        }
    }

    /// `etree.Comment(...)` after the statement's opening parenthesis.
    fn comment_after_open(&mut self) -> Result<Comment, String> {
        self.skip_whitespace();
        self.expect("etree.Comment(")?;
        self.comment_body()
    }

    fn comment_body(&mut self) -> Result<Comment, String> {
        self.skip_whitespace();
        if self.eat(")") {
            return Ok(Comment::new(""));
        }
        let text = self.strings()?;
        self.skip_whitespace();
        self.expect(")")?;
        Ok(Comment::new(text))
    }

    fn call(&mut self) -> Result<Element, String> {
        let identifier = self.identifier()?;
        let namespace = self
            .table
            .namespace_of(&identifier)
            .ok_or_else(|| format!("unknown factory `{}`", identifier))?
            .to_string();

        let mut tag = if self.eat(".") {
            Some(self.identifier()?)
        } else {
            None
        };
        self.expect("(")?;

        let mut text: Option<String> = None;
        let mut children = Vec::new();
        let mut attributes = Vec::new();

        loop {
            self.skip_whitespace();
            if self.eat(")") {
                break;
            }
            match self.argument()? {
                Argument::Strings(s) if tag.is_none() => tag = Some(s),
                Argument::Strings(s) => {
                    if !children.is_empty() || !attributes.is_empty() {
                        return Err("text after children or attributes".into());
                    }
                    text.get_or_insert_with(String::new).push_str(&s);
                }
                Argument::Element(e) => children.push(Node::Element(e)),
                Argument::Comment(c) => children.push(Node::Comment(c)),
                Argument::Attribute(a) => attributes.push(a),
            }
            self.skip_whitespace();
            if !self.eat(",") {
                self.expect(")")?;
                break;
            }
        }

        let tag = tag.ok_or("call without a tag")?;
        let mut element = Element::new(QName::new(Some(namespace.as_str()), tag));
        element.text = text;
        element.children = children;
        element.attributes = attributes;
        Ok(element)
    }

    fn argument(&mut self) -> Result<Argument, String> {
        if matches!(self.peek(), Some('\'' | '"')) {
            return Ok(Argument::Strings(self.strings()?));
        }
        if self.eat("**{") {
            self.skip_whitespace();
            let name = self.string()?;
            self.skip_whitespace();
            self.expect(":")?;
            self.skip_whitespace();
            let value = self.string()?;
            self.skip_whitespace();
            self.expect("}")?;
            return Ok(Argument::Attribute(Attribute::new(
                QName::parse_clark(&name),
                value,
            )));
        }
        if self.eat("etree.Comment(") {
            return Ok(Argument::Comment(self.comment_body()?));
        }

        let save = self.pos;
        let name = self.identifier()?;
        if self.eat("=") {
            let value = self.string()?;
            return Ok(Argument::Attribute(Attribute::new(QName::local(name), value)));
        }
        self.pos = save;
        Ok(Argument::Element(self.call()?))
    }
}

#[test]
fn test_reads_hello_world() {
    let script = "doc = KML.kml(\n  KML.Placemark(\n    KML.name('Hello World!'),\n  ),\n)\nprint(x)\n";
    let doc = read_script(script, &NamespaceTable::default()).unwrap();
    let placemark = doc.root.find_child("Placemark").unwrap();
    assert_eq!(placemark.find_child("name").unwrap().text(), Some("Hello World!"));
}

#[test]
fn test_reads_attributes_and_comments() {
    let script = "doc = KML('bad-name', 'a\\'b',  id=\"x\",\n  **{'{urn:x}flag': '1'},\n)\ndoc.addprevious(etree.Comment(' c '))\ndoc.addnext(etree.Comment('2'))\ndoc.addnext(etree.Comment('1'))\nprint(x)";
    let doc = read_script(script, &NamespaceTable::default()).unwrap();
    assert_eq!(doc.root.local_name(), "bad-name");
    assert_eq!(doc.root.text(), Some("a'b"));
    assert_eq!(doc.root.get_attribute("id"), Some("x"));
    assert_eq!(
        doc.root
            .get_attribute_qualified(&QName::new(Some("urn:x"), "flag")),
        Some("1")
    );
    assert_eq!(doc.leading_comments[0].text, " c ");
    let trailing: Vec<_> = doc.trailing_comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(trailing, ["1", "2"]);
}
