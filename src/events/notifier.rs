//! Publish/subscribe dispatch for lifecycle events.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::{Event, EventKind};

/// Error returned by a listener to abort the operation that emitted.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

type Listener = Arc<dyn Fn(&Event) -> Result<(), ListenerError> + Send + Sync>;

/// A listener failed while handling an event.
#[derive(thiserror::Error, Debug)]
#[error("Listener for `{event}` failed: {source}")]
pub struct EmitError {
    /// Event being dispatched.
    pub event: EventKind,
    /// The listener's own error, unchanged.
    #[source]
    pub source: ListenerError,
}

impl EmitError {
    /// Unwrap the listener's original error.
    #[must_use]
    pub fn into_source(self) -> ListenerError {
        self.source
    }
}

/// Registry of listeners keyed by event kind.
///
/// Clones share the same registry, so the orchestrator and its callers see
/// one set of listeners.
#[derive(Clone, Default)]
pub struct EventNotifier {
    listeners: Arc<RwLock<HashMap<EventKind, Vec<Listener>>>>,
}

impl std::fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&EventKind, usize> =
            listeners.iter().map(|(kind, l)| (kind, l.len())).collect();
        f.debug_struct("EventNotifier")
            .field("listeners", &counts)
            .finish()
    }
}

impl EventNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `kind`. Listeners run in registration order.
    pub fn on<F>(&self, kind: EventKind, listener: F)
    where
        F: Fn(&Event) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Invoke every listener for the event's kind, synchronously.
    ///
    /// Stops at the first listener error. Listeners may register further
    /// listeners; those take effect from the next emit.
    ///
    /// # Errors
    ///
    /// Returns `EmitError` wrapping the first listener error.
    pub fn emit(&self, event: &Event) -> Result<(), EmitError> {
        let kind = event.kind();
        let snapshot: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        for listener in snapshot {
            listener(event).map_err(|source| EmitError { event: kind, source })?;
        }
        Ok(())
    }

    /// Number of listeners registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Remove every listener for `kind`.
    pub fn remove_all(&self, kind: EventKind) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&kind);
    }
}
