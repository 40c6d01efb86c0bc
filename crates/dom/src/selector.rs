//! Selector parsing and matching.
//!
//! Supported grammar: tag names, `*`, `#id`, `.class`, attribute
//! conditions (`[a]`, `[a=v]`, `[a^=v]`, `[a$=v]`, `[a*=v]`, `[a~=v]`,
//! `[a|=v]`), descendant and `>` combinators, and comma-separated groups.
//! Attribute values may be bare or quoted. Pseudo-classes are not
//! supported and parse as [`DomError::InvalidSelector`].
//!
//! Matching is right-to-left: the rightmost compound must match the
//! candidate, then each combinator walks up through parents.

use crate::document::Document;
use crate::error::{DomError, Result};
use crate::types::NodeId;

/// One `[attr...]` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrCondition {
    Exists { name: String },
    Eq { name: String, value: String },
    StartsWith { name: String, value: String },
    EndsWith { name: String, value: String },
    Contains { name: String, value: String },
    Includes { name: String, value: String },
    DashMatch { name: String, value: String },
}

/// A compound selector: everything between two combinators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub universal: bool,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrCondition>,
}

impl Compound {
    /// `Some(id)` when the compound is exactly `#id`, enabling the
    /// id-index fast path.
    fn id_only(&self) -> Option<&str> {
        if !self.universal && self.tag.is_none() && self.classes.is_empty() && self.attrs.is_empty()
        {
            self.id.as_deref()
        } else {
            None
        }
    }
}

/// Relation of a compound to the one on its left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// Compounds left-to-right; `combinator` is the relation to the
    /// previous part and is `None` only on the first.
    pub parts: Vec<(Option<Combinator>, Compound)>,
}

/// A full parsed selector: one or more comma-separated alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    pub groups: Vec<ComplexSelector>,
}

impl SelectorList {
    /// Parse a selector string. Empty or malformed input is an
    /// invalid-argument error, raised before any tree work happens.
    pub fn parse(selector: &str) -> Result<Self> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Err(DomError::InvalidSelector(selector.to_string()));
        }

        let mut groups = Vec::new();
        for group in split_groups(selector)? {
            groups.push(parse_complex(&group)?);
        }
        Ok(Self { groups })
    }

    fn id_only(&self) -> Option<&str> {
        match self.groups.as_slice() {
            [group] => match group.parts.as_slice() {
                [(None, compound)] => compound.id_only(),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Split on top-level commas, respecting brackets and quotes.
fn split_groups(selector: &str) -> Result<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;
    let mut quote: Option<char> = None;

    for ch in selector.chars() {
        match ch {
            '"' | '\'' if in_brackets => {
                match quote {
                    None => quote = Some(ch),
                    Some(q) if q == ch => quote = None,
                    Some(_) => {}
                }
                current.push(ch);
            }
            '[' if quote.is_none() => {
                if in_brackets {
                    return Err(DomError::InvalidSelector(selector.to_string()));
                }
                in_brackets = true;
                current.push(ch);
            }
            ']' if quote.is_none() => {
                if !in_brackets {
                    return Err(DomError::InvalidSelector(selector.to_string()));
                }
                in_brackets = false;
                current.push(ch);
            }
            ',' if !in_brackets => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    return Err(DomError::InvalidSelector(selector.to_string()));
                }
                groups.push(trimmed.to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if in_brackets || quote.is_some() {
        return Err(DomError::InvalidSelector(selector.to_string()));
    }
    let trimmed = current.trim();
    if trimmed.is_empty() {
        return Err(DomError::InvalidSelector(selector.to_string()));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

/// Tokenize one group into compounds and combinators, then assemble.
fn parse_complex(group: &str) -> Result<ComplexSelector> {
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;

    for ch in group.chars() {
        match ch {
            '[' => {
                in_brackets = true;
                current.push(ch);
            }
            ']' => {
                in_brackets = false;
                current.push(ch);
            }
            '>' if !in_brackets => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
                tokens.push(">".to_string());
            }
            ch if ch.is_ascii_whitespace() && !in_brackets => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }

    let mut parts: Vec<(Option<Combinator>, Compound)> = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in tokens {
        if token == ">" {
            if pending.is_some() || parts.is_empty() {
                return Err(DomError::InvalidSelector(group.to_string()));
            }
            pending = Some(Combinator::Child);
            continue;
        }

        let compound = parse_compound(&token)?;
        let combinator = if parts.is_empty() {
            None
        } else {
            Some(pending.take().unwrap_or(Combinator::Descendant))
        };
        parts.push((combinator, compound));
    }

    if parts.is_empty() || pending.is_some() {
        return Err(DomError::InvalidSelector(group.to_string()));
    }
    Ok(ComplexSelector { parts })
}

fn parse_compound(token: &str) -> Result<Compound> {
    let bytes = token.as_bytes();
    let mut compound = Compound::default();
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if compound.universal || compound.tag.is_some() {
                    return Err(DomError::InvalidSelector(token.to_string()));
                }
                compound.universal = true;
                i += 1;
            }
            b'#' => {
                let (ident, next) = parse_ident(token, i + 1)
                    .ok_or_else(|| DomError::InvalidSelector(token.to_string()))?;
                if compound.id.replace(ident).is_some() {
                    return Err(DomError::InvalidSelector(token.to_string()));
                }
                i = next;
            }
            b'.' => {
                let (ident, next) = parse_ident(token, i + 1)
                    .ok_or_else(|| DomError::InvalidSelector(token.to_string()))?;
                compound.classes.push(ident);
                i = next;
            }
            b'[' => {
                let (attr, next) = parse_attr_condition(token, i)?;
                compound.attrs.push(attr);
                i = next;
            }
            _ => {
                // Tag names lead the compound; anything after another
                // simple selector is garbage (pseudo-classes land here).
                if compound.universal
                    || compound.tag.is_some()
                    || compound.id.is_some()
                    || !compound.classes.is_empty()
                    || !compound.attrs.is_empty()
                {
                    return Err(DomError::InvalidSelector(token.to_string()));
                }
                let (ident, next) = parse_ident(token, i)
                    .ok_or_else(|| DomError::InvalidSelector(token.to_string()))?;
                compound.tag = Some(ident.to_ascii_lowercase());
                i = next;
            }
        }
    }

    if compound == Compound::default() {
        return Err(DomError::InvalidSelector(token.to_string()));
    }
    Ok(compound)
}

fn parse_ident(token: &str, start: usize) -> Option<(String, usize)> {
    let bytes = token.as_bytes();
    let mut end = start;
    while end < bytes.len() {
        let b = bytes[end];
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            end += 1;
        } else {
            break;
        }
    }
    if end == start {
        None
    } else {
        Some((token[start..end].to_string(), end))
    }
}

fn parse_attr_condition(token: &str, start: usize) -> Result<(AttrCondition, usize)> {
    let invalid = || DomError::InvalidSelector(token.to_string());
    let close = token[start..].find(']').ok_or_else(invalid)? + start;
    let body = token[start + 1..close].trim();
    if body.is_empty() {
        return Err(invalid());
    }

    let condition = match body.find(&['^', '$', '*', '~', '|', '='][..]) {
        None => AttrCondition::Exists {
            name: body.to_string(),
        },
        Some(op_pos) => {
            let op = &body[op_pos..op_pos + 1];
            let (name, raw_value) = if op == "=" {
                (&body[..op_pos], &body[op_pos + 1..])
            } else {
                if body.as_bytes().get(op_pos + 1) != Some(&b'=') {
                    return Err(invalid());
                }
                (&body[..op_pos], &body[op_pos + 2..])
            };
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(invalid());
            }
            let value = unquote(raw_value.trim()).to_string();
            match op {
                "=" => AttrCondition::Eq { name, value },
                "^" => AttrCondition::StartsWith { name, value },
                "$" => AttrCondition::EndsWith { name, value },
                "*" => AttrCondition::Contains { name, value },
                "~" => AttrCondition::Includes { name, value },
                "|" => AttrCondition::DashMatch { name, value },
                _ => unreachable!(),
            }
        }
    };

    Ok((condition, close + 1))
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return &value[1..value.len() - 1];
        }
    }
    value
}

// ===========================================================================
// Matching
// ===========================================================================

fn matches_compound(doc: &Document, node_id: NodeId, compound: &Compound) -> bool {
    let Ok(node) = doc.node(node_id) else {
        return false;
    };
    let Some(tag) = node.tag_name() else {
        return false;
    };

    if let Some(want) = &compound.tag {
        if !tag.eq_ignore_ascii_case(want) {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if node.attr("id") != Some(id.as_str()) {
            return false;
        }
    }
    if compound.classes.iter().any(|c| !node.has_class(c)) {
        return false;
    }

    compound.attrs.iter().all(|cond| match cond {
        AttrCondition::Exists { name } => node.attr(name).is_some(),
        AttrCondition::Eq { name, value } => node.attr(name) == Some(value.as_str()),
        AttrCondition::StartsWith { name, value } => {
            node.attr(name).is_some_and(|a| a.starts_with(value))
        }
        AttrCondition::EndsWith { name, value } => {
            node.attr(name).is_some_and(|a| a.ends_with(value))
        }
        AttrCondition::Contains { name, value } => {
            node.attr(name).is_some_and(|a| a.contains(value))
        }
        AttrCondition::Includes { name, value } => node
            .attr(name)
            .is_some_and(|a| a.split_whitespace().any(|t| t == value)),
        AttrCondition::DashMatch { name, value } => node
            .attr(name)
            .is_some_and(|a| a == value || a.starts_with(&format!("{value}-"))),
    })
}

fn matches_complex(doc: &Document, node_id: NodeId, complex: &ComplexSelector) -> bool {
    let parts = &complex.parts;
    let Some((_, last)) = parts.last() else {
        return false;
    };
    if !matches_compound(doc, node_id, last) {
        return false;
    }

    let mut current = node_id;
    for idx in (1..parts.len()).rev() {
        let (combinator, _) = &parts[idx];
        let (_, prev_compound) = &parts[idx - 1];

        let matched = match combinator.unwrap_or(Combinator::Descendant) {
            Combinator::Child => doc
                .parent(current)
                .filter(|&p| matches_compound(doc, p, prev_compound)),
            Combinator::Descendant => {
                let mut cursor = doc.parent(current);
                let mut found = None;
                while let Some(ancestor) = cursor {
                    if matches_compound(doc, ancestor, prev_compound) {
                        found = Some(ancestor);
                        break;
                    }
                    cursor = doc.parent(ancestor);
                }
                found
            }
        };

        match matched {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

fn matches_list(doc: &Document, node_id: NodeId, list: &SelectorList) -> bool {
    list.groups
        .iter()
        .any(|complex| matches_complex(doc, node_id, complex))
}

impl Document {
    /// Native selector-match test: would `node_id` be selected by
    /// `selector`? Non-element nodes never match.
    pub fn matches_selector(&self, node_id: NodeId, selector: &str) -> Result<bool> {
        let list = SelectorList::parse(selector)?;
        Ok(matches_list(self, node_id, &list))
    }

    /// First match in the whole document, document order.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    /// All matches in the whole document, document order.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;

        if let Some(id) = list.id_only() {
            if let Some(node_id) = self.arena().element_by_id(id) {
                if self.arena().is_attached_under(node_id, self.root()) {
                    return Ok(vec![node_id]);
                }
            }
            return Ok(Vec::new());
        }

        Ok(self
            .arena()
            .element_subtree(self.root())
            .into_iter()
            .filter(|&candidate| matches_list(self, candidate, &list))
            .collect())
    }

    /// First match among `root`'s descendants.
    pub fn query_selector_from(&self, root: NodeId, selector: &str) -> Result<Option<NodeId>> {
        Ok(self
            .query_selector_all_from(root, selector)?
            .into_iter()
            .next())
    }

    /// All matches among `root`'s descendants (`root` itself excluded),
    /// document order.
    pub fn query_selector_all_from(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        let mut out = Vec::new();
        for child in self.children(root) {
            for candidate in self.arena().element_subtree(child) {
                if matches_list(self, candidate, &list) {
                    out.push(candidate);
                }
            }
        }
        Ok(out)
    }
}
