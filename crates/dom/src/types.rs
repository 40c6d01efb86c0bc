//! Core type definitions for the simulated document environment.
//!
//! Key design principles:
//! 1. Use u32 indices into the arena, never pointers
//! 2. Use SmallVec for child lists (most nodes have few children)
//! 3. Keep nodes plain data; all tree logic lives on [`crate::Document`]

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Node identifier (index into the arena).
pub type NodeId = u32;

/// Node kind, the discriminator between elements and everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    Comment = 8,
    Document = 9,
}

/// Rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DomRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The rect a host reports for a node it has never laid out.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

/// A single node in the document tree.
///
/// Tag names are stored lowercase. `node_value` holds the text data for
/// Text and Comment nodes and is empty for everything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomNode {
    pub node_type: NodeType,
    pub node_name: String,
    pub node_value: String,
    pub attributes: HashMap<String, String>,
    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>,
    /// Viewport-relative box, if the host has laid this node out.
    pub layout: Option<DomRect>,
}

impl DomNode {
    pub fn new(node_type: NodeType, node_name: impl Into<String>) -> Self {
        Self {
            node_type,
            node_name: node_name.into(),
            node_value: String::new(),
            attributes: HashMap::new(),
            parent_id: None,
            children_ids: SmallVec::new(),
            layout: None,
        }
    }

    pub fn element(tag_name: &str) -> Self {
        Self::new(NodeType::Element, tag_name.to_ascii_lowercase())
    }

    pub fn text(data: &str) -> Self {
        let mut node = Self::new(NodeType::Text, "#text");
        node.node_value = data.to_string();
        node
    }

    pub fn comment(data: &str) -> Self {
        let mut node = Self::new(NodeType::Comment, "#comment");
        node.node_value = data.to_string();
        node
    }

    pub fn document() -> Self {
        Self::new(NodeType::Document, "#document")
    }

    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Tag name for element nodes.
    pub fn tag_name(&self) -> Option<&str> {
        if self.is_element() {
            Some(&self.node_name)
        } else {
            None
        }
    }

    /// Get attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Whitespace-token membership test against the `class` attribute.
    pub fn has_class(&self, class_name: &str) -> bool {
        self.attr("class")
            .map(|value| value.split_whitespace().any(|token| token == class_name))
            .unwrap_or(false)
    }
}

/// What the host environment is capable of.
///
/// `native_matches` mirrors hosts that lack a native selector-match test;
/// with it off, callers are expected to emulate matching by querying and
/// scanning for identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HostCaps {
    pub native_matches: bool,
}

impl Default for HostCaps {
    fn default() -> Self {
        Self {
            native_matches: true,
        }
    }
}

/// Vertical scroll state, with the multiple offset sources real hosts
/// disagree about.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub page_y_offset: Option<f64>,
    pub doc_scroll_top: Option<f64>,
    pub body_scroll_top: Option<f64>,
}

impl Viewport {
    /// Resolve the current vertical scroll offset.
    ///
    /// Sources are tried in order and a zero offset falls through to the
    /// next source; with no usable source the offset is 0.
    pub fn scroll_offset(&self) -> f64 {
        [self.page_y_offset, self.doc_scroll_top, self.body_scroll_top]
            .into_iter()
            .flatten()
            .find(|v| *v != 0.0)
            .unwrap_or(0.0)
    }
}

/// A dispatched event, with just enough surface for cancellation.
///
/// `return_value` is the legacy cancellation flag some hosts still read;
/// it starts true and is cleared when the default action is suppressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    pub cancelable: bool,
    pub default_prevented: bool,
    pub return_value: bool,
}

impl Event {
    pub fn new(event_type: &str, cancelable: bool) -> Self {
        Self {
            event_type: event_type.to_string(),
            cancelable,
            default_prevented: false,
            return_value: true,
        }
    }
}
