//! Simulated host document environment.
//!
//! This crate stands in for the browser-provided side of a DOM utility
//! library: an arena-backed node tree, selector query and match
//! primitives, tree mutation with batched mutation-record notification,
//! viewport/scroll state, and a small markup-fragment parser. The
//! [`Document`] handle is the explicit context callers thread through
//! utility functions instead of touching globals, which is also what makes
//! the whole thing testable without a real browser.
//!
//! ## Core Design
//!
//! ```text
//! Document
//!   ├── NodeArena        Vec<DomNode>, u32 indices, id index
//!   ├── ObserverRegistry batched MutationRecords, drained by the host loop
//!   ├── Viewport         scroll-offset fallback sources
//!   └── selector engine  parse → match right-to-left
//! ```

pub mod arena;
pub mod document;
pub mod error;
pub mod markup;
pub mod observer;
pub mod selector;
pub mod types;

pub use document::Document;
pub use error::{DomError, Result};
pub use markup::parse_fragment;
pub use observer::{MutationRecord, ObserveOptions, ObserverId};
pub use types::{DomNode, DomRect, Event, HostCaps, NodeId, NodeType, Viewport};
