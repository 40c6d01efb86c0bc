//! One-shot removal observation.
//!
//! [`RemoveNodeHandler`] is an explicit two-state machine ({Armed, Fired})
//! around a callback: the first mutation batch whose removed set contains
//! the watched node fires the callback, disconnects the backing observer,
//! and permanently disarms the handler. Replayed or duplicate batches are
//! no-ops after that.

use dom::{Document, DomError, MutationRecord, NodeId, ObserveOptions, ObserverId, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    Armed,
    Fired,
}

/// Handler wired between a mutation observer and a removal callback.
pub struct RemoveNodeHandler<F: FnMut()> {
    target: NodeId,
    observer: ObserverId,
    callback: F,
    state: HandlerState,
}

/// Build a handler that fires `callback` at most once, when `target`
/// shows up in a removed-node set delivered to `observer`.
pub fn create_remove_node_handler<F: FnMut()>(
    target: NodeId,
    observer: ObserverId,
    callback: F,
) -> RemoveNodeHandler<F> {
    RemoveNodeHandler {
        target,
        observer,
        callback,
        state: HandlerState::Armed,
    }
}

impl<F: FnMut()> RemoveNodeHandler<F> {
    pub fn observer(&self) -> ObserverId {
        self.observer
    }

    pub fn state(&self) -> HandlerState {
        self.state
    }

    pub fn has_fired(&self) -> bool {
        self.state == HandlerState::Fired
    }

    /// Process one mutation batch. Fires and self-cancels on the first
    /// batch containing the watched node; every later call is a no-op
    /// regardless of content.
    pub fn handle(&mut self, doc: &mut Document, records: &[MutationRecord]) -> Result<()> {
        if self.state == HandlerState::Fired {
            return Ok(());
        }
        if records
            .iter()
            .any(|record| record.removed.contains(&self.target))
        {
            self.state = HandlerState::Fired;
            (self.callback)();
            tracing::debug!(node = self.target, observer = %self.observer, "removal handler fired");
            doc.disconnect(self.observer)?;
        }
        Ok(())
    }

    /// Pull the backing observer's pending batch and process it. This is
    /// the host-loop delivery step; tests call it directly.
    pub fn deliver(&mut self, doc: &mut Document) -> Result<()> {
        if self.state == HandlerState::Fired {
            return Ok(());
        }
        let records = doc.take_records(self.observer)?;
        self.handle(doc, &records)
    }
}

/// Watch for `el` leaving its parent's child list; `callback` fires once
/// when it does, then the subscription cancels itself.
///
/// `el` must be attached, since the parent is what gets observed.
pub fn on_remove<F: FnMut()>(
    doc: &mut Document,
    el: NodeId,
    callback: F,
) -> Result<RemoveNodeHandler<F>> {
    let parent = doc.parent(el).ok_or(DomError::DetachedNode(el))?;
    let observer = doc.observe(parent, ObserveOptions::child_list());
    Ok(create_remove_node_handler(el, observer, callback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutate::remove_element;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl FnMut()) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn fires_once_on_removal() {
        let mut doc = Document::new_page("about:blank");
        let body = doc.body();
        let el = doc.create_element("div");
        doc.append_child(body, el).unwrap();

        let (count, callback) = counter();
        let mut handler = on_remove(&mut doc, el, callback).unwrap();
        assert_eq!(handler.state(), HandlerState::Armed);

        remove_element(&mut doc, el).unwrap();
        handler.deliver(&mut doc).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(handler.has_fired());
        assert!(!doc.is_observer_connected(handler.observer()));
    }

    #[test]
    fn unrelated_mutations_do_not_fire() {
        let mut doc = Document::new_page("about:blank");
        let body = doc.body();
        let el = doc.create_element("div");
        let sibling = doc.create_element("div");
        doc.append_child(body, el).unwrap();
        doc.append_child(body, sibling).unwrap();

        let (count, callback) = counter();
        let mut handler = on_remove(&mut doc, el, callback).unwrap();

        remove_element(&mut doc, sibling).unwrap();
        handler.deliver(&mut doc).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(handler.state(), HandlerState::Armed);
        assert!(doc.is_observer_connected(handler.observer()));
    }

    #[test]
    fn replayed_and_duplicate_batches_fire_once() {
        let mut doc = Document::new_page("about:blank");
        let body = doc.body();
        let el = doc.create_element("div");
        doc.append_child(body, el).unwrap();

        let (count, callback) = counter();
        let mut handler = on_remove(&mut doc, el, callback).unwrap();

        // A batch with duplicate matching records.
        let batch = vec![
            MutationRecord::removed(body, el),
            MutationRecord::removed(body, el),
        ];
        handler.handle(&mut doc, &batch).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!doc.is_observer_connected(handler.observer()));

        // Replaying the batch, and pumping delivery again, are no-ops.
        handler.handle(&mut doc, &batch).unwrap();
        handler.deliver(&mut doc).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fires_even_when_element_is_moved_not_discarded() {
        let mut doc = Document::new_page("about:blank");
        let body = doc.body();
        let home = doc.create_element("div");
        let away = doc.create_element("div");
        let el = doc.create_element("span");
        doc.append_child(body, home).unwrap();
        doc.append_child(body, away).unwrap();
        doc.append_child(home, el).unwrap();

        let (count, callback) = counter();
        let mut handler = on_remove(&mut doc, el, callback).unwrap();

        // Moving out of `home` is a removal from the observed parent.
        doc.append_child(away, el).unwrap();
        handler.deliver(&mut doc).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn on_remove_rejects_detached_element() {
        let mut doc = Document::new_page("about:blank");
        let loner = doc.create_element("div");
        let (_, callback) = counter();
        assert!(matches!(
            on_remove(&mut doc, loner, callback),
            Err(DomError::DetachedNode(_))
        ));
    }
}
