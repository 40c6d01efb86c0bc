//! The document handle.
//!
//! [`Document`] is the explicit context utilities thread through every
//! call instead of reading process-global state: it owns the node arena,
//! the observer registry, viewport scroll state, the location string, and
//! the host capability switches. All tree mutation funnels through the
//! methods here so that mutation records are queued consistently.

use crate::arena::NodeArena;
use crate::error::{DomError, Result};
use crate::observer::{MutationRecord, ObserveOptions, ObserverId, ObserverRegistry};
use crate::types::{DomNode, DomRect, HostCaps, NodeId, NodeType, Viewport};

pub struct Document {
    arena: NodeArena,
    root: NodeId,
    html: NodeId,
    head: NodeId,
    body: NodeId,
    location: String,
    caps: HostCaps,
    pub viewport: Viewport,
    observers: ObserverRegistry,
}

impl Document {
    /// Build an empty page: `#document > html > (head, body)`.
    pub fn new_page(location: &str) -> Self {
        let mut arena = NodeArena::new();
        let root = arena.alloc(DomNode::document());
        let html = arena.alloc(DomNode::element("html"));
        let head = arena.alloc(DomNode::element("head"));
        let body = arena.alloc(DomNode::element("body"));

        // Link maintenance on fresh nodes cannot fail.
        let _ = arena.append(root, html);
        let _ = arena.append(html, head);
        let _ = arena.append(html, body);

        Self {
            arena,
            root,
            html,
            head,
            body,
            location: location.to_string(),
            caps: HostCaps::default(),
            viewport: Viewport::default(),
            observers: ObserverRegistry::new(),
        }
    }

    // =======================================================================
    // Node creation
    // =======================================================================

    /// Create a detached element.
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.arena.alloc(DomNode::element(tag_name))
    }

    /// Create a detached element with attributes already set.
    pub fn create_element_with_attrs(&mut self, tag_name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut node = DomNode::element(tag_name);
        for (name, value) in attrs {
            node.attributes.insert(name.to_string(), value.to_string());
        }
        self.arena.alloc(node)
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.arena.alloc(DomNode::text(data))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.arena.alloc(DomNode::comment(data))
    }

    // =======================================================================
    // Accessors
    // =======================================================================

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn html_element(&self) -> NodeId {
        self.html
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn node(&self, node_id: NodeId) -> Result<&DomNode> {
        self.arena.get(node_id)
    }

    pub fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.arena.parent(node_id)
    }

    /// Immediate children in document order. Empty for unknown ids.
    pub fn children(&self, node_id: NodeId) -> Vec<NodeId> {
        self.arena.children(node_id)
    }

    pub fn is_element(&self, node_id: NodeId) -> bool {
        self.arena.get(node_id).map(|n| n.is_element()).unwrap_or(false)
    }

    pub fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.arena.get(node_id).ok()?.tag_name()
    }

    pub fn attr(&self, node_id: NodeId, name: &str) -> Option<&str> {
        self.arena.get(node_id).ok()?.attr(name)
    }

    /// Set an attribute on an element, keeping the id index current.
    pub fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let node = self.arena.get_mut(node_id)?;
        if !node.is_element() {
            return Err(DomError::NotAnElement(node_id));
        }
        node.attributes.insert(name.to_string(), value.to_string());
        if name == "id" {
            self.arena.index_id(value, node_id);
        }
        Ok(())
    }

    /// Concatenated text of the subtree, trimmed.
    pub fn text_content(&self, node_id: NodeId) -> Result<String> {
        let mut text = String::new();
        self.arena.traverse_df(node_id, |node, _| {
            if node.is_text() {
                text.push_str(&node.node_value);
            }
            Ok(())
        })?;
        Ok(text.trim().to_string())
    }

    /// Record the host's layout box for a node.
    pub fn set_layout(&mut self, node_id: NodeId, rect: DomRect) -> Result<()> {
        self.arena.get_mut(node_id)?.layout = Some(rect);
        Ok(())
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn set_location(&mut self, location: &str) {
        self.location = location.to_string();
    }

    pub fn caps(&self) -> HostCaps {
        self.caps
    }

    pub fn set_native_matches(&mut self, enabled: bool) {
        self.caps.native_matches = enabled;
    }

    pub(crate) fn arena(&self) -> &NodeArena {
        &self.arena
    }

    // =======================================================================
    // Tree mutation
    // =======================================================================

    /// Append `child` as the last child of `parent`. An attached child is
    /// moved, with a removal record queued on its old parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insertion(parent, child)?;
        let old_parent = self.arena.parent(child);
        self.arena.append(parent, child)?;
        if let Some(old) = old_parent {
            self.queue_record(MutationRecord::removed(old, child));
        }
        self.queue_record(MutationRecord::added(parent, child));
        Ok(())
    }

    /// Insert `child` immediately before `reference` in `parent`'s child
    /// list; `None` appends.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        self.check_insertion(parent, child)?;
        let old_parent = self.arena.parent(child);
        self.arena.insert_before(parent, child, reference)?;
        if let Some(old) = old_parent {
            self.queue_record(MutationRecord::removed(old, child));
        }
        self.queue_record(MutationRecord::added(parent, child));
        Ok(())
    }

    /// Detach `child` from `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.arena.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.arena.detach(child)?;
        self.queue_record(MutationRecord::removed(parent, child));
        Ok(())
    }

    /// Swap `replacement` into `old`'s position under `parent`. One record
    /// carries both the addition and the removal; the child list never has
    /// a state with neither node present.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        replacement: NodeId,
        old: NodeId,
    ) -> Result<()> {
        self.check_insertion(parent, replacement)?;
        let replacement_old_parent = self.arena.parent(replacement);
        self.arena.replace(parent, replacement, old)?;
        if replacement == old {
            // Nothing moved, so observers see nothing.
            return Ok(());
        }
        if let Some(prior) = replacement_old_parent {
            self.queue_record(MutationRecord::removed(prior, replacement));
        }
        self.queue_record(MutationRecord {
            target: parent,
            added: vec![replacement],
            removed: vec![old],
        });
        Ok(())
    }

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_node = self.arena.get(parent)?;
        if !matches!(parent_node.node_type, NodeType::Element | NodeType::Document) {
            return Err(DomError::NotAnElement(parent));
        }
        self.arena.get(child)?;
        if self.arena.is_attached_under(parent, child) {
            return Err(DomError::HierarchyViolation(child));
        }
        Ok(())
    }

    fn queue_record(&mut self, record: MutationRecord) {
        let ancestors = self.arena.ancestors(record.target);
        self.observers.queue(&record, &ancestors);
    }

    // =======================================================================
    // Mutation observation
    // =======================================================================

    pub fn observe(&mut self, target: NodeId, options: ObserveOptions) -> ObserverId {
        self.observers.observe(target, options)
    }

    pub fn take_records(&mut self, id: ObserverId) -> Result<Vec<MutationRecord>> {
        self.observers.take_records(id)
    }

    pub fn disconnect(&mut self, id: ObserverId) -> Result<()> {
        self.observers.disconnect(id)
    }

    pub fn is_observer_connected(&self, id: ObserverId) -> bool {
        self.observers.is_connected(id)
    }

    pub fn has_pending_records(&self) -> bool {
        self.observers.has_pending()
    }

    /// Drain every observer's pending batch, registration-ordered.
    pub fn flush_records(&mut self) -> Vec<(ObserverId, Vec<MutationRecord>)> {
        self.observers.flush()
    }
}
