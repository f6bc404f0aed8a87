//! N-Quads serialization and parsing.
//!
//! The serializer is the emission hook of the canonicalization algorithm:
//! it writes blank node labels verbatim, so the algorithm's sentinel and
//! canonical labels land in the output byte-for-byte.

use crate::error::CanonicalizationError;
use crate::rdf::{BlankNode, Dataset, Graph, Literal, NamedNode, Object, Quad, Subject};

/// Serialization into a fragment of an N-Quads line.
pub trait SerializeNQuads {
    fn serialize(&self) -> String;
}

impl SerializeNQuads for NamedNode {
    fn serialize(&self) -> String {
        format!("<{}>", self.as_str())
    }
}

impl SerializeNQuads for BlankNode {
    fn serialize(&self) -> String {
        self.as_str().to_string()
    }
}

impl SerializeNQuads for Literal {
    fn serialize(&self) -> String {
        let value = escape_literal(self.value());
        match (self.language(), self.datatype()) {
            // If present, the language tag is preceded by a '@' (U+0040).
            (Some(lang), _) => format!("\"{}\"@{}", value, lang),
            // If there is no language tag, there may be a datatype IRI,
            // preceded by '^^' (U+005E U+005E).
            (None, Some(dt)) => format!("\"{}\"^^<{}>", value, dt.as_str()),
            // If there is no datatype IRI and no language tag, the datatype
            // is xsd:string and is not written.
            (None, None) => format!("\"{}\"", value),
        }
    }
}

impl SerializeNQuads for Subject {
    fn serialize(&self) -> String {
        match self {
            Subject::NamedNode(n) => n.serialize(),
            Subject::BlankNode(n) => n.serialize(),
        }
    }
}

impl SerializeNQuads for Object {
    fn serialize(&self) -> String {
        match self {
            Object::NamedNode(n) => n.serialize(),
            Object::BlankNode(n) => n.serialize(),
            Object::Literal(l) => l.serialize(),
        }
    }
}

impl SerializeNQuads for Graph {
    fn serialize(&self) -> String {
        match self {
            Graph::DefaultGraph => String::new(),
            Graph::NamedNode(n) => n.serialize(),
            Graph::BlankNode(n) => n.serialize(),
        }
    }
}

impl SerializeNQuads for Quad {
    fn serialize(&self) -> String {
        let subject = self.subject.serialize();
        let predicate = self.predicate.serialize();
        let object = self.object.serialize();
        let graph = self.graph.serialize();
        if graph.is_empty() {
            format!("{} {} {} .\n", subject, predicate, object)
        } else {
            format!("{} {} {} {} .\n", subject, predicate, object, graph)
        }
    }
}

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Serializes a dataset as N-Quads text with the lines in code point order.
pub fn serialize(dataset: &Dataset) -> String {
    let mut lines: Vec<String> = dataset.to_quads().iter().map(Quad::serialize).collect();
    lines.sort();
    lines.concat()
}

/// Parses N-Quads text into a dataset. Blank lines and `#` comments are
/// skipped; errors carry the 1-based line number.
pub fn parse(input: &str) -> Result<Dataset, CanonicalizationError> {
    let mut dataset = Dataset::new();
    for (index, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let quad = parse_line(line).map_err(|message| CanonicalizationError::NQuadsParse {
            line: index + 1,
            message,
        })?;
        dataset.insert_quad(quad);
    }
    Ok(dataset)
}

fn parse_line(line: &str) -> Result<Quad, String> {
    let mut cursor = Cursor::new(line);

    let subject = match cursor.peek() {
        Some('<') => Subject::NamedNode(cursor.iri()?),
        Some('_') => Subject::BlankNode(cursor.blank_node()?),
        _ => return Err("expected IRI or blank node in subject position".to_string()),
    };
    cursor.whitespace()?;

    let predicate = match cursor.peek() {
        Some('<') => cursor.iri()?,
        _ => return Err("expected IRI in predicate position".to_string()),
    };
    cursor.whitespace()?;

    let object = match cursor.peek() {
        Some('<') => Object::NamedNode(cursor.iri()?),
        Some('_') => Object::BlankNode(cursor.blank_node()?),
        Some('"') => Object::Literal(cursor.literal()?),
        _ => return Err("expected IRI, blank node or literal in object position".to_string()),
    };
    cursor.skip_whitespace();

    let graph = match cursor.peek() {
        Some('<') => Graph::NamedNode(cursor.iri()?),
        Some('_') => Graph::BlankNode(cursor.blank_node()?),
        Some('.') => Graph::DefaultGraph,
        _ => return Err("expected graph label or terminating '.'".to_string()),
    };
    cursor.skip_whitespace();
    cursor.expect('.')?;
    cursor.skip_whitespace();
    if !cursor.at_end() {
        return Err("trailing characters after terminating '.'".to_string());
    }

    Ok(Quad::new(subject, predicate, object, graph))
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(line: &str) -> Cursor {
        Cursor {
            chars: line.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(format!("expected '{}', found '{}'", expected, c)),
            None => Err(format!("expected '{}', found end of line", expected)),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.pos += 1;
        }
    }

    fn whitespace(&mut self) -> Result<(), String> {
        if !matches!(self.peek(), Some(' ') | Some('\t')) {
            return Err("expected whitespace between terms".to_string());
        }
        self.skip_whitespace();
        Ok(())
    }

    fn iri(&mut self) -> Result<NamedNode, String> {
        self.expect('<')?;
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('>') => return Ok(NamedNode::new(value)),
                Some(c) => value.push(c),
                None => return Err("unterminated IRI".to_string()),
            }
        }
    }

    fn blank_node(&mut self) -> Result<BlankNode, String> {
        self.expect('_')?;
        self.expect(':')?;
        let mut label = String::from("_:");
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' {
                label.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        // A label never ends with '.'; give the dot back as the terminator.
        while label.ends_with('.') {
            label.pop();
            self.pos -= 1;
        }
        if label.len() == 2 {
            return Err("empty blank node label".to_string());
        }
        Ok(BlankNode::new(label))
    }

    fn literal(&mut self) -> Result<Literal, String> {
        self.expect('"')?;
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => value.push(self.escape()?),
                Some(c) => value.push(c),
                None => return Err("unterminated string literal".to_string()),
            }
        }
        match self.peek() {
            Some('@') => {
                self.pos += 1;
                let mut language = String::new();
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphanumeric() || c == '-' {
                        language.push(c);
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                if language.is_empty() {
                    return Err("empty language tag".to_string());
                }
                Ok(Literal::language_tagged(value, language))
            }
            Some('^') => {
                self.expect('^')?;
                self.expect('^')?;
                Ok(Literal::typed(value, self.iri()?))
            }
            _ => Ok(Literal::simple(value)),
        }
    }

    fn escape(&mut self) -> Result<char, String> {
        match self.bump() {
            Some('t') => Ok('\t'),
            Some('b') => Ok('\u{0008}'),
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('f') => Ok('\u{000C}'),
            Some('"') => Ok('"'),
            Some('\'') => Ok('\''),
            Some('\\') => Ok('\\'),
            Some('u') => self.unicode_escape(4),
            Some('U') => self.unicode_escape(8),
            Some(c) => Err(format!("unsupported escape sequence \\{}", c)),
            None => Err("unterminated escape sequence".to_string()),
        }
    }

    fn unicode_escape(&mut self, digits: usize) -> Result<char, String> {
        let mut code = 0u32;
        for _ in 0..digits {
            let c = self
                .bump()
                .ok_or_else(|| "truncated unicode escape".to_string())?;
            let digit = c
                .to_digit(16)
                .ok_or_else(|| format!("invalid hex digit '{}' in unicode escape", c))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| format!("invalid code point U+{:X}", code))
    }
}
