//! Multicast event sources exposed by domain objects.

use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// One raised event: the declared payload type and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPayload {
    pub type_name: String,
    pub value: Value,
}

impl EventPayload {
    #[must_use]
    pub fn new(type_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            type_name: type_name.into(),
            value: value.into(),
        }
    }
}

/// Handler attached to an [`EventSource`].
pub type EventCallback = Arc<dyn Fn(&EventPayload) + Send + Sync>;

/// Identifies one attached handler for later detachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventToken(u64);

#[derive(Default)]
struct SourceInner {
    next_token: AtomicU64,
    handlers: Mutex<Vec<(EventToken, EventCallback)>>,
}

/// A thread-safe multicast event.
///
/// Cloning yields another handle to the same handler list, so an object can
/// hand its source to the registry and keep firing it.
#[derive(Clone, Default)]
pub struct EventSource {
    inner: Arc<SourceInner>,
}

impl EventSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, callback: EventCallback) -> EventToken {
        let token = EventToken(self.inner.next_token.fetch_add(1, Ordering::Relaxed));
        self.handlers().push((token, callback));
        token
    }

    /// Remove a handler. Returns false if the token was not attached.
    pub fn detach(&self, token: EventToken) -> bool {
        let mut handlers = self.handlers();
        let before = handlers.len();
        handlers.retain(|(t, _)| *t != token);
        handlers.len() != before
    }

    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers().len()
    }

    /// Invoke every attached handler and return how many ran.
    ///
    /// Handlers run outside the internal lock and may attach or detach.
    pub fn fire(&self, payload: &EventPayload) -> usize {
        let handlers: Vec<EventCallback> =
            self.handlers().iter().map(|(_, cb)| Arc::clone(cb)).collect();
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    fn handlers(&self) -> std::sync::MutexGuard<'_, Vec<(EventToken, EventCallback)>> {
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSource")
            .field("handlers", &self.handler_count())
            .finish()
    }
}
