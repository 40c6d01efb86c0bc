//! Convenience wrappers around document-tree primitives.
//!
//! A small, flat collection of element lookup, traversal, insertion,
//! removal, wrap/unwrap, and one-shot removal-observation helpers. There
//! is no internal state: every function takes an explicit
//! [`dom::Document`] handle plus the nodes it operates on, which keeps
//! the whole surface testable against the simulated host in the `dom`
//! crate.
//!
//! Conventions:
//! - absence is `None` / an empty `Vec`, never an error;
//! - invalid arguments (empty selector for [`closest`], bad markup) fail
//!   fast with a [`dom::DomError`] before touching the tree;
//! - anything else a mutation primitive rejects propagates unchanged.

pub mod mutate;
pub mod observe;
pub mod page;
pub mod query;

pub use dom::{
    Document, DomError, DomNode, DomRect, Event, MutationRecord, NodeId, ObserveOptions,
    ObserverId, Result, Viewport,
};
pub use mutate::{
    clear_children, insert_after, insert_before, prepend_child, remove_element, replace_element,
    unwrap_elements, wrap_elements, WrapTarget,
};
pub use observe::{create_remove_node_handler, on_remove, HandlerState, RemoveNodeHandler};
pub use page::{create_element, get_pos, page_uri, prevent_default, uri, Position};
pub use query::{closest, find, find_all, get_first_child_element, matches};
