//! Tree mutation helpers.
//!
//! Contracts vary deliberately: `insert_before`/`insert_after` and
//! `replace_element` degrade to safe no-ops on a detached reference node,
//! while `remove_element` treats detachment as a caller error. Wrapping
//! takes an explicit [`WrapTarget`] so the live-versus-snapshot decision
//! is visible at the call site rather than sniffed at runtime.

use dom::{Document, DomError, NodeId, Result};

/// Input to [`wrap_elements`].
///
/// `Live(parent)` is a view over `parent`'s current element children,
/// re-read between mutations the way live host collections are. Wrapping
/// one corrupts the walk (each move shifts the remaining members down and
/// the next entry is skipped); that behavior is kept observable on
/// purpose. Materialize a `Snapshot` first when you want all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrapTarget {
    Single(NodeId),
    Snapshot(Vec<NodeId>),
    Live(NodeId),
}

impl From<NodeId> for WrapTarget {
    fn from(el: NodeId) -> Self {
        WrapTarget::Single(el)
    }
}

impl From<Vec<NodeId>> for WrapTarget {
    fn from(els: Vec<NodeId>) -> Self {
        WrapTarget::Snapshot(els)
    }
}

impl From<&[NodeId]> for WrapTarget {
    fn from(els: &[NodeId]) -> Self {
        WrapTarget::Snapshot(els.to_vec())
    }
}

/// Insert `child` as the new first child of `parent`. With no existing
/// children this is a plain append.
pub fn prepend_child(doc: &mut Document, parent: NodeId, child: NodeId) -> Result<()> {
    let first = doc.children(parent).first().copied();
    doc.insert_before(parent, child, first)
}

/// Insert `new_node` as `node`'s immediate predecessor. No-op when `node`
/// is detached.
pub fn insert_before(doc: &mut Document, node: NodeId, new_node: NodeId) -> Result<()> {
    let Some(parent) = doc.parent(node) else {
        return Ok(());
    };
    doc.insert_before(parent, new_node, Some(node))
}

/// Insert `new_node` as `node`'s immediate successor. No-op when `node`
/// is detached.
pub fn insert_after(doc: &mut Document, node: NodeId, new_node: NodeId) -> Result<()> {
    let Some(parent) = doc.parent(node) else {
        return Ok(());
    };
    let siblings = doc.children(parent);
    let next = siblings
        .iter()
        .position(|&s| s == node)
        .and_then(|pos| siblings.get(pos + 1).copied());
    doc.insert_before(parent, new_node, next)
}

/// Detach every direct child of `el`. Each child carries its own subtree
/// with it, so no recursive teardown is needed.
pub fn clear_children(doc: &mut Document, el: NodeId) -> Result<()> {
    for child in doc.children(el) {
        doc.remove_child(el, child)?;
    }
    Ok(())
}

/// Detach `el` from its parent.
///
/// Precondition: `el` is attached; a detached element is a caller error
/// ([`DomError::DetachedNode`]). Contrast with [`replace_element`], which
/// quietly no-ops instead.
pub fn remove_element(doc: &mut Document, el: NodeId) -> Result<()> {
    let parent = doc.parent(el).ok_or(DomError::DetachedNode(el))?;
    doc.remove_child(parent, el)
}

/// Swap `replacement` into `el`'s position. No-op when `el` is detached.
pub fn replace_element(doc: &mut Document, el: NodeId, replacement: NodeId) -> Result<()> {
    let Some(parent) = doc.parent(el) else {
        return Ok(());
    };
    doc.replace_child(parent, replacement, el)
}

/// Create one `wrapper_tag` element and move each target element into it,
/// preserving relative order. The wrapper is returned detached; attaching
/// it somewhere is the caller's business.
pub fn wrap_elements(
    doc: &mut Document,
    target: impl Into<WrapTarget>,
    wrapper_tag: &str,
) -> Result<NodeId> {
    let wrapper = doc.create_element(wrapper_tag);

    match target.into() {
        WrapTarget::Single(el) => {
            doc.append_child(wrapper, el)?;
        }
        WrapTarget::Snapshot(els) => {
            for el in els {
                doc.append_child(wrapper, el)?;
            }
        }
        WrapTarget::Live(parent) => {
            // The membership is re-read from the tree between moves, so
            // detaching entry i shifts the rest down and the walk skips
            // every other element.
            let mut index = 0;
            loop {
                let live = element_children(doc, parent);
                let Some(&el) = live.get(index) else {
                    break;
                };
                doc.append_child(wrapper, el)?;
                index += 1;
            }
        }
    }

    tracing::trace!(wrapper, tag = wrapper_tag, "wrapped elements");
    Ok(wrapper)
}

/// Move every child of `wrapper` to the end of `parent` (original order),
/// then remove the emptied `wrapper` from `parent`.
pub fn unwrap_elements(doc: &mut Document, parent: NodeId, wrapper: NodeId) -> Result<()> {
    // Appending a node elsewhere implicitly detaches it, so repeatedly
    // taking the wrapper's current first child drains it completely.
    while let Some(&child) = doc.children(wrapper).first() {
        doc.append_child(parent, child)?;
    }
    doc.remove_child(parent, wrapper)
}

fn element_children(doc: &Document, parent: NodeId) -> Vec<NodeId> {
    doc.children(parent)
        .into_iter()
        .filter(|&child| doc.is_element(child))
        .collect()
}
