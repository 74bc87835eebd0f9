//! Event Feedback Cache.
//!
//! Tracks which requestors subscribed to which event of which live instance
//! and turns every fire of such an event into a feedback tree delivered to
//! each of them. All entries share one lock; feedback is always delivered
//! after it has been released.
//!
//! The cache never owns the instances or the requestors it tracks. Entries
//! whose instance was dropped, or whose requestors were all dropped, are
//! pruned by [`FeedbackCache::sweep`] and opportunistically on subscribe
//! and on fire.

use crate::registry::{
    address_of, CapabilityRegistry, EventCallback, EventDescriptor, EventPayload, EventToken,
    Fault, Instance,
};
use crate::requestor::{requestor_id, Requestor};
use graphwire_proto::path::{self, PathStep};
use graphwire_proto::{ClassInfo, InfoResult, SubscribeAction};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EntryKey {
    instance: usize,
    event: String,
}

impl EntryKey {
    fn new(instance: &Instance, event: &str) -> Self {
        Self {
            instance: address_of(instance),
            event: event.to_string(),
        }
    }
}

struct Entry {
    instance: Weak<dyn Any + Send + Sync>,
    descriptor: Arc<EventDescriptor>,
    token: EventToken,
    /// Minimal request tree addressing the event, materialized once.
    path: ClassInfo,
    requestors: HashMap<usize, Weak<dyn Requestor>>,
}

impl Entry {
    fn live_requestors(&self) -> Vec<Arc<dyn Requestor>> {
        self.requestors.values().filter_map(Weak::upgrade).collect()
    }

    fn prune_requestors(&mut self) {
        self.requestors.retain(|_, r| r.strong_count() > 0);
    }
}

struct Inner {
    registry: Arc<dyn CapabilityRegistry>,
    entries: Mutex<HashMap<EntryKey, Entry>>,
}

/// Subscriptions keyed by (instance, event name).
///
/// Cloning yields another handle to the same cache.
#[derive(Clone)]
pub struct FeedbackCache {
    inner: Arc<Inner>,
}

impl FeedbackCache {
    #[must_use]
    pub fn new(registry: Arc<dyn CapabilityRegistry>) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Subscribe `requestor` to `event` on `instance`.
    ///
    /// `path` addresses the event from the session root and ends in the
    /// event leaf. The first subscriber attaches the event callback; later
    /// ones only join the requestor set.
    pub fn subscribe(
        &self,
        requestor: &Arc<dyn Requestor>,
        instance: &Instance,
        event: &Arc<EventDescriptor>,
        path: &[PathStep],
    ) -> Result<(), Fault> {
        let key = EntryKey::new(instance, &event.name);
        let mut entries = self.lock();
        let dead = Self::take_dead(&mut entries);
        if !dead.is_empty() {
            drop(entries);
            self.detach_all(&dead);
            entries = self.lock();
        }

        if let Some(entry) = entries.get_mut(&key) {
            entry
                .requestors
                .insert(requestor_id(requestor), Arc::downgrade(requestor));
            debug!(
                event = %event.name,
                requestor = requestor.label(),
                subscribers = entry.requestors.len(),
                "Joined subscription"
            );
            return Ok(());
        }

        let mut path = path::materialize(path).map_err(|e| Fault::from_error(&e))?;
        if let Some(leaf) = path::leaf_event_mut(&mut path) {
            leaf.subscribe_action = SubscribeAction::None;
            leaf.header.result = None;
        }

        let callback = self.callback_for(key.clone());
        let token = self.inner.registry.attach_event(event, instance, callback)?;
        debug!(event = %event.name, requestor = requestor.label(), "Attached event callback");

        let mut requestors = HashMap::new();
        requestors.insert(requestor_id(requestor), Arc::downgrade(requestor));
        entries.insert(
            key,
            Entry {
                instance: Arc::downgrade(instance),
                descriptor: Arc::clone(event),
                token,
                path,
                requestors,
            },
        );
        Ok(())
    }

    /// Remove `requestor` from the subscription; the last one out detaches
    /// the callback. Unsubscribing twice is not an error.
    pub fn unsubscribe(
        &self,
        requestor: &Arc<dyn Requestor>,
        instance: &Instance,
        event: &EventDescriptor,
    ) -> Result<(), Fault> {
        let key = EntryKey::new(instance, &event.name);
        let removed = {
            let mut entries = self.lock();
            let Some(entry) = entries.get_mut(&key) else {
                debug!(event = %event.name, "Unsubscribe without subscription");
                return Ok(());
            };
            entry.requestors.remove(&requestor_id(requestor));
            entry.prune_requestors();
            if !entry.requestors.is_empty() {
                return Ok(());
            }
            entries.remove(&key)
        };

        match removed {
            Some(entry) => self.detach(&entry),
            None => Ok(()),
        }
    }

    /// Remove `requestor` from every subscription, detaching those left
    /// without subscribers. Returns how many subscriptions it left.
    pub fn unsubscribe_all(&self, requestor: &Arc<dyn Requestor>) -> usize {
        let id = requestor_id(requestor);
        let mut left = 0;
        let emptied = {
            let mut entries = self.lock();
            let mut emptied = Vec::new();
            for (key, entry) in entries.iter_mut() {
                if entry.requestors.remove(&id).is_some() {
                    left += 1;
                }
                entry.prune_requestors();
                if entry.requestors.is_empty() {
                    emptied.push(key.clone());
                }
            }
            emptied
                .iter()
                .filter_map(|key| entries.remove(key))
                .collect::<Vec<_>>()
        };

        self.detach_all(&emptied);
        debug!(requestor = requestor.label(), left, "Unsubscribed from all");
        left
    }

    /// Drop entries whose instance or requestors are gone. Returns how many
    /// entries were removed.
    pub fn sweep(&self) -> usize {
        let dead = Self::take_dead(&mut self.lock());
        self.detach_all(&dead);
        dead.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Live requestors subscribed to `event` on `instance`.
    #[must_use]
    pub fn subscriber_count(&self, instance: &Instance, event: &str) -> usize {
        self.lock()
            .get(&EntryKey::new(instance, event))
            .map_or(0, |entry| entry.live_requestors().len())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EntryKey, Entry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove dead entries from the map. The caller detaches them once the
    /// lock is released.
    fn take_dead(entries: &mut HashMap<EntryKey, Entry>) -> Vec<Entry> {
        let mut dead = Vec::new();
        for (key, entry) in entries.iter_mut() {
            entry.prune_requestors();
            if entry.requestors.is_empty() || entry.instance.strong_count() == 0 {
                dead.push(key.clone());
            }
        }
        dead.iter().filter_map(|key| entries.remove(key)).collect()
    }

    /// Must be called without the lock held: upgrading the instance may make
    /// this thread the one that drops it.
    fn detach_all(&self, entries: &[Entry]) {
        for entry in entries {
            debug!(event = %entry.descriptor.name, "Dropped subscription");
            if let Err(fault) = self.detach(entry) {
                warn!(event = %entry.descriptor.name, %fault, "Failed to detach event callback");
            }
        }
    }

    /// Detach the entry's callback if its instance is still alive.
    fn detach(&self, entry: &Entry) -> Result<(), Fault> {
        let Some(instance) = entry.instance.upgrade() else {
            return Ok(());
        };
        self.inner
            .registry
            .detach_event(&entry.descriptor, &instance, entry.token)?;
        debug!(event = %entry.descriptor.name, "Detached event callback");
        Ok(())
    }

    fn callback_for(&self, key: EntryKey) -> EventCallback {
        let cache = Arc::downgrade(&self.inner);
        Arc::new(move |payload: &EventPayload| {
            if let Some(inner) = cache.upgrade() {
                FeedbackCache { inner }.deliver(&key, payload);
            }
        })
    }

    /// Build one feedback tree for a fire and hand it to every subscriber.
    ///
    /// The payload is reported with the event's declared type; a value that
    /// does not coerce to it is dropped.
    fn deliver(&self, key: &EntryKey, payload: &EventPayload) -> usize {
        let (mut feedback, descriptor, requestors) = {
            let mut entries = self.lock();
            let Some(entry) = entries.get(key) else {
                debug!(event = %key.event, "Ignoring unmatched event");
                return 0;
            };
            let requestors = entry.live_requestors();
            if requestors.is_empty() {
                let removed = entries.remove(key);
                drop(entries);
                if let Some(entry) = removed {
                    debug!(event = %key.event, "Pruned subscription on fire");
                    if let Err(fault) = self.detach(&entry) {
                        warn!(event = %key.event, %fault, "Failed to detach event callback");
                    }
                }
                return 0;
            }
            (entry.path.clone(), Arc::clone(&entry.descriptor), requestors)
        };

        let payload_type = &descriptor.payload_type;
        let value = match payload_type.coerce(&payload.value) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    event = %key.event,
                    fired = %payload.type_name,
                    %err,
                    "Dropping event payload"
                );
                return 0;
            }
        };
        if let Some(leaf) = path::leaf_event_mut(&mut feedback) {
            leaf.header.result = Some(InfoResult::ok_value(payload_type.name(), value));
        }
        for requestor in &requestors {
            requestor.deliver_feedback(feedback.clone());
        }
        requestors.len()
    }
}

impl fmt::Debug for FeedbackCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedbackCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
