//! Ordered subscriber registry with synchronous emission.
//!
//! Handlers are registered per event kind and invoked in registration order.
//! The same handler may be registered more than once and then fires once per
//! registration. A failing handler stops the emission: its error is returned
//! from [`EventBus::emit`] and later handlers do not run.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::errors::{BusError, HandlerError, Result};

/// An event that can be routed by kind.
pub trait BusEvent {
    /// Key subscribers register under.
    type Kind: Copy + Eq + Hash + fmt::Display;

    /// The kind of this event.
    fn kind(&self) -> Self::Kind;
}

/// A shared subscriber callback.
///
/// Identity for [`EventBus::unsubscribe`] is the `Arc` allocation, so keep a
/// clone of the handler you registered.
pub type Handler<E> = Arc<dyn Fn(&E) -> std::result::Result<(), HandlerError> + Send + Sync>;

/// Registry mapping event kinds to ordered handler lists.
pub struct EventBus<E: BusEvent> {
    handlers: HashMap<E::Kind, Vec<Handler<E>>>,
}

impl<E: BusEvent> EventBus<E> {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Append a handler for `kind`.
    pub fn subscribe(&mut self, kind: E::Kind, handler: Handler<E>) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Wrap `f` in a [`Handler`], register it, and return it for later
    /// unsubscription.
    pub fn on<F>(&mut self, kind: E::Kind, f: F) -> Handler<E>
    where
        F: Fn(&E) -> std::result::Result<(), HandlerError> + Send + Sync + 'static,
    {
        let handler: Handler<E> = Arc::new(f);
        self.subscribe(kind, Arc::clone(&handler));
        handler
    }

    /// Remove the first registration of `handler` for `kind`.
    ///
    /// Returns `false` when it was not registered.
    pub fn unsubscribe(&mut self, kind: E::Kind, handler: &Handler<E>) -> bool {
        let Some(list) = self.handlers.get_mut(&kind) else {
            return false;
        };
        let Some(index) = list.iter().position(|h| Arc::ptr_eq(h, handler)) else {
            return false;
        };
        let _ = list.remove(index);
        if list.is_empty() {
            let _ = self.handlers.remove(&kind);
        }
        true
    }

    /// Invoke every handler registered for the event's kind, in order.
    pub fn emit(&self, event: &E) -> Result<()> {
        let kind = event.kind();
        let Some(list) = self.handlers.get(&kind) else {
            return Ok(());
        };
        for handler in list {
            handler(event).map_err(|source| BusError::Subscriber {
                event: kind.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Number of registrations for `kind`.
    pub fn handler_count(&self, kind: E::Kind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> fmt::Debug for EventBus<E>
where
    E::Kind: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&E::Kind, usize> =
            self.handlers.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
