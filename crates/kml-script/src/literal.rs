//! Python source literals and names.

use unicode_normalization::is_nfkc;

/// Reserved words that cannot be used as attribute or keyword names.
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Whether `name` can be written as a Python attribute or keyword name.
///
/// Python NFKC-normalizes identifiers, so a name that is not already in
/// NFKC form would reach the builder as a different name.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
        && !PYTHON_KEYWORDS.contains(&name)
        && is_nfkc(name)
}

/// Characters Python's `repr` escapes even though they are not ASCII
/// control characters (separators, format characters, private use).
fn is_unprintable(c: char) -> bool {
    c.is_control()
        || matches!(
            c,
            '\u{a0}'
                | '\u{ad}'
                | '\u{1680}'
                | '\u{2000}'..='\u{200f}'
                | '\u{2028}'..='\u{202f}'
                | '\u{205f}'..='\u{2064}'
                | '\u{2066}'..='\u{206f}'
                | '\u{3000}'
                | '\u{feff}'
                | '\u{fff9}'..='\u{fffb}'
                | '\u{e000}'..='\u{f8ff}'
        )
}

fn push_escaped(out: &mut String, text: &str, quote: char) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if is_unprintable(c) => {
                let code = c as u32;
                if code < 0x100 {
                    out.push_str(&format!("\\x{:02x}", code));
                } else if code < 0x10000 {
                    out.push_str(&format!("\\u{:04x}", code));
                } else {
                    out.push_str(&format!("\\U{:08x}", code));
                }
            }
            c => out.push(c),
        }
    }
}

/// Quote `text` the way Python's `repr` quotes a `str`.
///
/// Single quotes are used unless the text contains a single quote and no
/// double quote.
///
/// ```
/// use kml_script::literal::python_repr;
///
/// assert_eq!(python_repr("Hello World!"), "'Hello World!'");
/// assert_eq!(python_repr("it's"), "\"it's\"");
/// assert_eq!(python_repr("a\tb"), "'a\\tb'");
/// ```
pub fn python_repr(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    push_escaped(&mut out, text, quote);
    out.push(quote);
    out
}

/// Quote `text` as a double-quoted Python literal.
pub fn double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    push_escaped(&mut out, text, '"');
    out.push('"');
    out
}

/// A text slot ready to be placed after an opening parenthesis.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormattedText {
    pub code: String,
    /// Whether `code` contains at least one string literal.
    pub has_literal: bool,
}

/// Format element or comment text for the slot after `(`.
///
/// Single-line text becomes one literal. Multi-line text becomes one
/// literal per non-blank line, each on its own line indented by the
/// line's original leading whitespace and ending in a single space; the
/// block starts with a line break and ends with `indent` so the closing
/// parenthesis lines up with the call.
///
/// ```
/// use kml_script::literal::format_text;
///
/// let text = format_text(Some("\n  1,2,0\n\n    3,4,0\n"), "  ");
/// assert_eq!(text.code, "\n  '1,2,0 '\n    '3,4,0 '\n  ");
/// ```
pub fn format_text(text: Option<&str>, indent: &str) -> FormattedText {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return FormattedText::default();
    };

    if !text.contains('\n') {
        return FormattedText {
            code: python_repr(text),
            has_literal: true,
        };
    }

    let mut code = String::from("\n");
    let mut has_literal = false;
    for line in text.split('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let leading = line.chars().count() - line.trim_start().chars().count();
        code.push_str(&" ".repeat(leading));
        code.push_str(&python_repr(&format!("{} ", trimmed)));
        code.push('\n');
        has_literal = true;
    }
    code.push_str(indent);

    FormattedText { code, has_literal }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("Placemark"));
        assert!(is_identifier("_x1"));
        assert!(is_identifier("Ünïcode"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("bad-name"));
        assert!(!is_identifier("x.y"));
        assert!(!is_identifier("class"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_compatibility_characters_are_not_identifiers() {
        // U+FB01 LATIN SMALL LIGATURE FI and U+FF21 FULLWIDTH A
        assert!(!is_identifier("\u{fb01}le"));
        assert!(!is_identifier("\u{ff21}"));
        assert!(is_identifier("file"));
    }

    #[test]
    fn test_repr_quote_choice() {
        assert_eq!(python_repr(""), "''");
        assert_eq!(python_repr("a'b\"c"), r#"'a\'b"c'"#);
        assert_eq!(python_repr("say \"hi\""), r#"'say "hi"'"#);
        assert_eq!(python_repr("back\\slash"), r"'back\\slash'");
    }

    #[test]
    fn test_repr_unprintable() {
        assert_eq!(python_repr("\u{7}"), r"'\x07'");
        assert_eq!(python_repr("a\u{a0}b"), r"'a\xa0b'");
        assert_eq!(python_repr("\u{2028}"), r"'\u2028'");
        assert_eq!(python_repr("\r\n"), r"'\r\n'");
        assert_eq!(python_repr("é 😀"), "'é 😀'");
    }

    #[test]
    fn test_double_quoted() {
        assert_eq!(double_quoted("http://x/?a=1&b=2"), r#""http://x/?a=1&b=2""#);
        assert_eq!(double_quoted("say \"hi\""), r#""say \"hi\"""#);
        assert_eq!(double_quoted("it's"), r#""it's""#);
    }

    #[test]
    fn test_format_text_empty() {
        assert_eq!(format_text(None, "  "), FormattedText::default());
        assert_eq!(format_text(Some(""), "  "), FormattedText::default());
    }

    #[test]
    fn test_format_text_single_line() {
        let text = format_text(Some("  padded  "), "    ");
        assert_eq!(text.code, "'  padded  '");
        assert!(text.has_literal);
    }

    #[test]
    fn test_format_text_three_newlines_mixed_indent() {
        let text = format_text(Some("first\n  second\n\t third\n    fourth"), "      ");
        assert_eq!(
            text.code,
            "\n'first '\n  'second '\n  'third '\n    'fourth '\n      "
        );
        assert_eq!(text.code.matches(" '\n").count(), 4);
    }

    #[test]
    fn test_format_text_blank_lines_only() {
        let text = format_text(Some("\n   \n"), "  ");
        assert_eq!(text.code, "\n  ");
        assert!(!text.has_literal);
    }
}
