//! Markup-fragment construction.
//!
//! A deliberately small parser for building detached node trees from
//! HTML-ish fragments: nested tags, bare/quoted attributes, text, void and
//! self-closing tags, comments. No entity decoding, no error recovery;
//! malformed input is [`DomError::Markup`]. This backs the library's
//! element-construction passthrough, nothing more.

use crate::document::Document;
use crate::error::{DomError, Result};
use crate::types::NodeId;

/// Tags that never take children.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Parse `markup` into detached nodes owned by `doc` and return the first
/// top-level node.
pub fn parse_fragment(doc: &mut Document, markup: &str) -> Result<NodeId> {
    let mut parser = FragmentParser {
        doc,
        input: markup,
        pos: 0,
        open: Vec::new(),
        top_level: Vec::new(),
    };
    parser.run()?;

    parser
        .top_level
        .first()
        .copied()
        .ok_or_else(|| DomError::Markup("empty fragment".to_string()))
}

struct FragmentParser<'a> {
    doc: &'a mut Document,
    input: &'a str,
    pos: usize,
    /// Stack of open elements with their tag names.
    open: Vec<(NodeId, String)>,
    top_level: Vec<NodeId>,
}

impl FragmentParser<'_> {
    fn run(&mut self) -> Result<()> {
        while self.pos < self.input.len() {
            if self.rest().starts_with("<!--") {
                self.skip_comment()?;
            } else if self.rest().starts_with("</") {
                self.close_tag()?;
            } else if self.rest().starts_with('<') {
                self.open_tag()?;
            } else {
                self.text_run()?;
            }
        }

        if let Some((_, tag)) = self.open.last() {
            return Err(DomError::Markup(format!("unclosed tag <{tag}>")));
        }
        Ok(())
    }

    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn attach(&mut self, node: NodeId) -> Result<()> {
        match self.open.last() {
            Some(&(parent, _)) => self.doc.append_child(parent, node),
            None => {
                self.top_level.push(node);
                Ok(())
            }
        }
    }

    fn text_run(&mut self) -> Result<()> {
        let end = self.rest().find('<').unwrap_or(self.rest().len());
        let text = &self.input[self.pos..self.pos + end];
        self.pos += end;
        if !text.trim().is_empty() {
            let node = self.doc.create_text(text);
            self.attach(node)?;
        }
        Ok(())
    }

    fn skip_comment(&mut self) -> Result<()> {
        match self.rest().find("-->") {
            Some(end) => {
                self.pos += end + 3;
                Ok(())
            }
            None => Err(DomError::Markup("unterminated comment".to_string())),
        }
    }

    fn open_tag(&mut self) -> Result<()> {
        self.pos += 1; // '<'
        let tag = self.tag_name()?;

        let mut attrs: Vec<(String, String)> = Vec::new();
        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    break;
                }
                Some('/') => {
                    self.pos += 1;
                    if self.peek() != Some('>') {
                        return Err(self.err("expected '>' after '/'"));
                    }
                    self.pos += 1;
                    self_closing = true;
                    break;
                }
                Some(_) => attrs.push(self.attribute()?),
                None => return Err(self.err("unterminated tag")),
            }
        }

        let borrowed: Vec<(&str, &str)> = attrs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let node = self.doc.create_element_with_attrs(&tag, &borrowed);
        self.attach(node)?;

        if !self_closing && !VOID_TAGS.contains(&tag.as_str()) {
            self.open.push((node, tag));
        }
        Ok(())
    }

    fn close_tag(&mut self) -> Result<()> {
        self.pos += 2; // "</"
        let tag = self.tag_name()?;
        self.skip_whitespace();
        if self.peek() != Some('>') {
            return Err(self.err("expected '>' in closing tag"));
        }
        self.pos += 1;

        match self.open.pop() {
            Some((_, open_tag)) if open_tag == tag => Ok(()),
            Some((_, open_tag)) => Err(DomError::Markup(format!(
                "mismatched closing tag </{tag}>, expected </{open_tag}>"
            ))),
            None => Err(DomError::Markup(format!("stray closing tag </{tag}>"))),
        }
    }

    fn tag_name(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '-' {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.err("missing tag name"));
        }
        Ok(self.input[start..self.pos].to_ascii_lowercase())
    }

    fn attribute(&mut self) -> Result<(String, String)> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == ':' {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.err("malformed attribute"));
        }
        let name = self.input[start..self.pos].to_ascii_lowercase();

        self.skip_whitespace();
        if self.peek() != Some('=') {
            // Bare boolean attribute.
            return Ok((name, String::new()));
        }
        self.pos += 1;
        self.skip_whitespace();

        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let end = self
                    .rest()
                    .find(quote)
                    .ok_or_else(|| self.err("unterminated attribute value"))?;
                let value = self.input[self.pos..self.pos + end].to_string();
                self.pos += end + 1;
                value
            }
            Some(_) => {
                let start = self.pos;
                while let Some(ch) = self.peek() {
                    if ch.is_ascii_whitespace() || ch == '>' || ch == '/' {
                        break;
                    }
                    self.pos += ch.len_utf8();
                }
                self.input[start..self.pos].to_string()
            }
            None => return Err(self.err("unterminated tag")),
        };

        Ok((name, value))
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_whitespace() {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
    }

    fn err(&self, message: &str) -> DomError {
        DomError::Markup(format!("{message} at byte {}", self.pos))
    }
}
