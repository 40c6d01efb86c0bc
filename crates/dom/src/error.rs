//! Error types for document operations.
//!
//! Two families only: invalid arguments (bad selector, bad markup,
//! detached preconditions) surface as errors; "not found" results are
//! `Option`/empty collections and never reach this enum.

use crate::types::NodeId;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("node {child} is not a child of node {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("node {0} cannot be inserted into itself or its own subtree")]
    HierarchyViolation(NodeId),

    #[error("invalid selector: {0:?}")]
    InvalidSelector(String),

    #[error("node {0} has no parent")]
    DetachedNode(NodeId),

    #[error("markup error: {0}")]
    Markup(String),

    #[error("observer not found: {0}")]
    ObserverNotFound(Uuid),
}
