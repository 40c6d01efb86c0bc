//! Batched mutation notification.
//!
//! Registration is synchronous; delivery is not. Every mutation primitive
//! on [`crate::Document`] queues a [`MutationRecord`] into the buffer of
//! each observer watching the affected target, and records sit there until
//! the host loop (or a test) drains them with `take_records`/`flush`.
//! `flush` visits observers in registration order, which is the ordering
//! guarantee callers get relative to other observers on the same target.

use crate::error::{DomError, Result};
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription token handed out by [`ObserverRegistry::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObserverId(Uuid);

impl ObserverId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// What an observer wants to hear about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub subtree: bool,
}

impl ObserveOptions {
    /// Direct child-list changes only.
    pub fn child_list() -> Self {
        Self {
            child_list: true,
            subtree: false,
        }
    }

    /// Child-list changes anywhere in the subtree.
    pub fn subtree() -> Self {
        Self {
            child_list: true,
            subtree: true,
        }
    }
}

/// One child-list change on one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

impl MutationRecord {
    pub fn added(target: NodeId, node: NodeId) -> Self {
        Self {
            target,
            added: vec![node],
            removed: Vec::new(),
        }
    }

    pub fn removed(target: NodeId, node: NodeId) -> Self {
        Self {
            target,
            added: Vec::new(),
            removed: vec![node],
        }
    }
}

#[derive(Debug)]
struct Registration {
    id: ObserverId,
    target: NodeId,
    options: ObserveOptions,
    buffer: Vec<MutationRecord>,
    connected: bool,
}

/// All observers registered on one document.
#[derive(Debug, Default)]
pub struct ObserverRegistry {
    registrations: Vec<Registration>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, target: NodeId, options: ObserveOptions) -> ObserverId {
        let id = ObserverId::new();
        tracing::debug!(observer = %id, node = target, "observer registered");
        self.registrations.push(Registration {
            id,
            target,
            options,
            buffer: Vec::new(),
            connected: true,
        });
        id
    }

    /// Queue a record for every connected observer interested in it.
    /// `target_ancestors` is the ancestor chain of the record's target,
    /// used for subtree subscriptions.
    pub fn queue(&mut self, record: &MutationRecord, target_ancestors: &[NodeId]) {
        for reg in &mut self.registrations {
            if !reg.connected || !reg.options.child_list {
                continue;
            }
            let interested = reg.target == record.target
                || (reg.options.subtree && target_ancestors.contains(&reg.target));
            if interested {
                tracing::trace!(observer = %reg.id, node = record.target, "record queued");
                reg.buffer.push(record.clone());
            }
        }
    }

    /// Drain one observer's pending records. Yields an empty batch for a
    /// disconnected observer, so delivery loops need no special case.
    pub fn take_records(&mut self, id: ObserverId) -> Result<Vec<MutationRecord>> {
        let reg = self.registration_mut(id)?;
        Ok(std::mem::take(&mut reg.buffer))
    }

    /// Stop delivery and discard anything still buffered. Idempotent.
    pub fn disconnect(&mut self, id: ObserverId) -> Result<()> {
        let reg = self.registration_mut(id)?;
        if reg.connected {
            tracing::debug!(observer = %id, "observer disconnected");
        }
        reg.connected = false;
        reg.buffer.clear();
        Ok(())
    }

    pub fn is_connected(&self, id: ObserverId) -> bool {
        self.registrations
            .iter()
            .any(|reg| reg.id == id && reg.connected)
    }

    pub fn has_pending(&self) -> bool {
        self.registrations.iter().any(|reg| !reg.buffer.is_empty())
    }

    /// Drain every connected observer with pending records, in
    /// registration order.
    pub fn flush(&mut self) -> Vec<(ObserverId, Vec<MutationRecord>)> {
        self.registrations
            .iter_mut()
            .filter(|reg| reg.connected && !reg.buffer.is_empty())
            .map(|reg| (reg.id, std::mem::take(&mut reg.buffer)))
            .collect()
    }

    fn registration_mut(&mut self, id: ObserverId) -> Result<&mut Registration> {
        self.registrations
            .iter_mut()
            .find(|reg| reg.id == id)
            .ok_or(DomError::ObserverNotFound(id.as_uuid()))
    }
}
