//! Subscriber registry for decoded push events.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use beacon_protocol::events::{InboundEvent, PushEventKind};

/// Opaque handle returned by [`HandlerRegistry::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

type Handler = Arc<dyn Fn(&InboundEvent) + Send + Sync>;

/// Registry of event handlers keyed by event kind.
///
/// Multiple handlers per kind are permitted; dispatch invokes them in
/// registration order.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: DashMap<PushEventKind, Vec<(HandlerId, Handler)>>,
    next_id: AtomicU64,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a handler for an event kind.
    pub fn on<F>(&self, kind: PushEventKind, handler: F) -> HandlerId
    where
        F: Fn(&InboundEvent) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Removes a previously registered handler.
    ///
    /// Removing an id that is not registered is a silent no-op.
    pub fn off(&self, kind: PushEventKind, id: HandlerId) {
        if let Some(mut entry) = self.handlers.get_mut(&kind) {
            entry.retain(|(registered, _)| *registered != id);
        }
    }

    /// Removes every registered handler.
    pub fn clear(&self) {
        self.handlers.clear();
    }

    /// Invokes all handlers registered for the event's kind, in
    /// registration order.
    pub fn dispatch(&self, event: &InboundEvent) {
        // Snapshot outside the map so a handler can re-enter on()/off().
        let snapshot: Vec<Handler> = self
            .handlers
            .get(&event.event.kind())
            .map(|entry| entry.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();

        for handler in snapshot {
            handler(event);
        }
    }

    /// Number of handlers registered for a kind.
    pub fn count(&self, kind: PushEventKind) -> usize {
        self.handlers.get(&kind).map(|entry| entry.len()).unwrap_or(0)
    }
}
