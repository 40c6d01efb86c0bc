//! Arena-based node storage.
//!
//! A single `Vec<DomNode>` holds every node ever created for a document;
//! parent/child relationships are u32 indices into it. Nothing is ever
//! deallocated: a removed node just becomes detached (parent = None) and
//! can be reinserted later, which is exactly what callers moving nodes
//! around a tree need.
//!
//! This module maintains the raw links only. Mutation notification lives
//! in [`crate::Document`], which wraps every mutating call here.

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId};
use ahash::AHashMap;

#[derive(Debug, Default)]
pub struct NodeArena {
    /// All nodes stored sequentially (cache-friendly).
    nodes: Vec<DomNode>,

    /// `id` attribute → NodeId, for the id-only selector fast path.
    id_index: AHashMap<String, NodeId>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(64),
            id_index: AHashMap::new(),
        }
    }

    /// Add a node to the arena, returns its ID.
    pub fn alloc(&mut self, node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        if let Some(id_attr) = node.attr("id") {
            self.id_index.insert(id_attr.to_string(), node_id);
        }
        self.nodes.push(node);
        node_id
    }

    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Record a fresh `id` attribute value for a node.
    pub fn index_id(&mut self, id_attr: &str, node_id: NodeId) {
        self.id_index.insert(id_attr.to_string(), node_id);
    }

    /// Id-index lookup. Verifies the node still carries the attribute,
    /// since attributes can be rewritten after indexing.
    pub fn element_by_id(&self, id_attr: &str) -> Option<NodeId> {
        let node_id = *self.id_index.get(id_attr)?;
        let node = self.nodes.get(node_id as usize)?;
        (node.is_element() && node.attr("id") == Some(id_attr)).then_some(node_id)
    }

    // =======================================================================
    // Traversal
    // =======================================================================

    pub fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes.get(node_id as usize)?.parent_id
    }

    /// Immediate children in document order.
    pub fn children(&self, node_id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node_id as usize)
            .map(|n| n.children_ids.to_vec())
            .unwrap_or_default()
    }

    /// Ancestor chain, nearest first.
    pub fn ancestors(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(node_id);
        while let Some(id) = cursor {
            out.push(id);
            cursor = self.parent(id);
        }
        out
    }

    /// Whether `node_id` sits in the subtree rooted at `root`.
    pub fn is_attached_under(&self, node_id: NodeId, root: NodeId) -> bool {
        node_id == root || self.ancestors(node_id).contains(&root)
    }

    /// Pre-order depth-first traversal starting at (and including)
    /// `start_id`. Iterative, no recursion.
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode, NodeId) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node, node_id)?;

            // Push children in reverse order so they are visited left-to-right.
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// All element nodes in the subtree rooted at `root`, in document
    /// order, including `root` itself when it is an element.
    pub fn element_subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let _ = self.traverse_df(root, |node, id| {
            if node.is_element() {
                out.push(id);
            }
            Ok(())
        });
        out
    }

    // =======================================================================
    // Link maintenance
    // =======================================================================

    /// Append `child` as the last child of `parent`. An attached child is
    /// detached from its current position first.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.get(parent)?;
        self.get(child)?;
        self.detach(child)?;
        self.get_mut(child)?.parent_id = Some(parent);
        self.get_mut(parent)?.children_ids.push(child);
        Ok(())
    }

    /// Insert `child` into `parent`'s child list immediately before
    /// `reference`. `None` behaves like [`NodeArena::append`].
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        let reference = match reference {
            Some(r) => r,
            None => return self.append(parent, child),
        };

        self.get(child)?;
        if self.parent(reference) != Some(parent) {
            return Err(DomError::NotAChild {
                parent,
                child: reference,
            });
        }
        if child == reference {
            // Inserting a node before itself leaves the tree unchanged.
            return Ok(());
        }

        // Detach first; the reference position is found afterwards so a
        // same-parent move lands in the right spot.
        self.detach(child)?;
        let pos = self
            .get(parent)?
            .children_ids
            .iter()
            .position(|&c| c == reference)
            .ok_or(DomError::NotAChild {
                parent,
                child: reference,
            })?;
        self.get_mut(child)?.parent_id = Some(parent);
        self.get_mut(parent)?.children_ids.insert(pos, child);
        Ok(())
    }

    /// Detach `node_id` from its parent, leaving it a free root. Detaching
    /// an already-detached node is a no-op.
    pub fn detach(&mut self, node_id: NodeId) -> Result<()> {
        let Some(parent_id) = self.get(node_id)?.parent_id else {
            return Ok(());
        };
        self.get_mut(parent_id)?
            .children_ids
            .retain(|c| *c != node_id);
        self.get_mut(node_id)?.parent_id = None;
        Ok(())
    }

    /// Swap `replacement` into `old`'s position under `parent`. The child
    /// list never passes through a state with neither node present.
    pub fn replace(&mut self, parent: NodeId, replacement: NodeId, old: NodeId) -> Result<()> {
        if self.parent(old) != Some(parent) {
            return Err(DomError::NotAChild { parent, child: old });
        }
        // Replacing a node with itself leaves the tree unchanged.
        if replacement == old {
            return Ok(());
        }
        self.detach(replacement)?;
        let pos = self
            .get(parent)?
            .children_ids
            .iter()
            .position(|&c| c == old)
            .ok_or(DomError::NotAChild { parent, child: old })?;
        self.get_mut(parent)?.children_ids[pos] = replacement;
        self.get_mut(old)?.parent_id = None;
        self.get_mut(replacement)?.parent_id = Some(parent);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DomNode;

    fn el(arena: &mut NodeArena, tag: &str) -> NodeId {
        arena.alloc(DomNode::element(tag))
    }

    #[test]
    fn append_sets_links() {
        let mut arena = NodeArena::new();
        let parent = el(&mut arena, "div");
        let c1 = el(&mut arena, "span");
        let c2 = arena.alloc(DomNode::text("hi"));

        arena.append(parent, c1).unwrap();
        arena.append(parent, c2).unwrap();

        assert_eq!(arena.children(parent), vec![c1, c2]);
        assert_eq!(arena.parent(c1), Some(parent));
        assert_eq!(arena.parent(c2), Some(parent));
    }

    #[test]
    fn append_moves_from_old_parent() {
        let mut arena = NodeArena::new();
        let p1 = el(&mut arena, "div");
        let p2 = el(&mut arena, "section");
        let child = el(&mut arena, "span");

        arena.append(p1, child).unwrap();
        arena.append(p2, child).unwrap();

        assert!(arena.children(p1).is_empty());
        assert_eq!(arena.children(p2), vec![child]);
    }

    #[test]
    fn insert_before_middle_and_first() {
        let mut arena = NodeArena::new();
        let parent = el(&mut arena, "ul");
        let a = el(&mut arena, "li");
        let b = el(&mut arena, "li");
        let c = el(&mut arena, "li");

        arena.append(parent, a).unwrap();
        arena.append(parent, c).unwrap();
        arena.insert_before(parent, b, Some(c)).unwrap();
        assert_eq!(arena.children(parent), vec![a, b, c]);

        let front = el(&mut arena, "li");
        arena.insert_before(parent, front, Some(a)).unwrap();
        assert_eq!(arena.children(parent), vec![front, a, b, c]);
    }

    #[test]
    fn insert_before_none_appends() {
        let mut arena = NodeArena::new();
        let parent = el(&mut arena, "ul");
        let a = el(&mut arena, "li");
        let b = el(&mut arena, "li");

        arena.append(parent, a).unwrap();
        arena.insert_before(parent, b, None).unwrap();
        assert_eq!(arena.children(parent), vec![a, b]);
    }

    #[test]
    fn insert_before_foreign_reference_errors() {
        let mut arena = NodeArena::new();
        let p1 = el(&mut arena, "div");
        let p2 = el(&mut arena, "div");
        let stranger = el(&mut arena, "span");
        let child = el(&mut arena, "span");
        arena.append(p2, stranger).unwrap();

        let err = arena.insert_before(p1, child, Some(stranger)).unwrap_err();
        assert!(matches!(err, DomError::NotAChild { .. }));
    }

    #[test]
    fn detach_middle_child() {
        let mut arena = NodeArena::new();
        let parent = el(&mut arena, "ul");
        let a = el(&mut arena, "li");
        let b = el(&mut arena, "li");
        let c = el(&mut arena, "li");
        for id in [a, b, c] {
            arena.append(parent, id).unwrap();
        }

        arena.detach(b).unwrap();
        assert_eq!(arena.children(parent), vec![a, c]);
        assert_eq!(arena.parent(b), None);

        // Detaching again is harmless.
        arena.detach(b).unwrap();
    }

    #[test]
    fn replace_keeps_position() {
        let mut arena = NodeArena::new();
        let parent = el(&mut arena, "div");
        let a = el(&mut arena, "p");
        let b = el(&mut arena, "p");
        let c = el(&mut arena, "p");
        for id in [a, b, c] {
            arena.append(parent, id).unwrap();
        }
        let swap = el(&mut arena, "blockquote");

        arena.replace(parent, swap, b).unwrap();
        assert_eq!(arena.children(parent), vec![a, swap, c]);
        assert_eq!(arena.parent(b), None);
        assert_eq!(arena.parent(swap), Some(parent));
    }

    #[test]
    fn replace_with_self_leaves_child_in_place() {
        let mut arena = NodeArena::new();
        let parent = el(&mut arena, "div");
        let child = el(&mut arena, "p");
        arena.append(parent, child).unwrap();

        arena.replace(parent, child, child).unwrap();
        assert_eq!(arena.children(parent), vec![child]);
        assert_eq!(arena.parent(child), Some(parent));
    }

    #[test]
    fn ancestors_nearest_first() {
        let mut arena = NodeArena::new();
        let grand = el(&mut arena, "div");
        let mid = el(&mut arena, "section");
        let leaf = el(&mut arena, "span");
        arena.append(grand, mid).unwrap();
        arena.append(mid, leaf).unwrap();

        assert_eq!(arena.ancestors(leaf), vec![mid, grand]);
        assert!(arena.ancestors(grand).is_empty());
        assert!(arena.is_attached_under(leaf, grand));
        assert!(!arena.is_attached_under(grand, leaf));
    }

    #[test]
    fn element_subtree_document_order() {
        let mut arena = NodeArena::new();
        let root = el(&mut arena, "div");
        let a = el(&mut arena, "p");
        let a_text = arena.alloc(DomNode::text("x"));
        let b = el(&mut arena, "p");
        arena.append(root, a).unwrap();
        arena.append(a, a_text).unwrap();
        arena.append(root, b).unwrap();

        assert_eq!(arena.element_subtree(root), vec![root, a, b]);
    }

    #[test]
    fn element_by_id_checks_current_attribute() {
        let mut arena = NodeArena::new();
        let mut node = DomNode::element("div");
        node.attributes.insert("id".to_string(), "main".to_string());
        let id = arena.alloc(node);

        assert_eq!(arena.element_by_id("main"), Some(id));

        // Rewriting the attribute invalidates the stale index entry.
        arena
            .get_mut(id)
            .unwrap()
            .attributes
            .insert("id".to_string(), "other".to_string());
        assert_eq!(arena.element_by_id("main"), None);
    }
}
