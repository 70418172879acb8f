//! Per-key listener fan-out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::types::SaveState;

/// Listener callback. `None` means the key was unregistered or destroyed.
pub type Listener = dyn Fn(Option<&SaveState>) + Send + Sync;

#[derive(Clone)]
struct Slot {
    id: u64,
    active: Arc<AtomicBool>,
    callback: Arc<Listener>,
}

type Slots = HashMap<String, Vec<Slot>>;

/// Registry of listeners keyed by document.
///
/// Callbacks are invoked after the internal lock is released, so a listener
/// may call back into the service.
#[derive(Default)]
pub struct NotificationBus {
    slots: Arc<Mutex<Slots>>,
    next_id: AtomicU64,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener for `key`.
    pub fn subscribe(&self, key: &str, callback: Arc<Listener>) -> ListenerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));
        lock(&self.slots)
            .entry(key.to_string())
            .or_default()
            .push(Slot {
                id,
                active: Arc::clone(&active),
                callback,
            });

        ListenerHandle {
            key: key.to_string(),
            id,
            active,
            slots: Arc::downgrade(&self.slots),
        }
    }

    /// Call every active listener for `key` once.
    pub fn notify(&self, key: &str, state: Option<&SaveState>) {
        let slots: Vec<Slot> = lock(&self.slots).get(key).cloned().unwrap_or_default();
        for slot in slots {
            if slot.active.load(Ordering::Acquire) {
                (slot.callback)(state);
            }
        }
    }

    /// Drop every listener for `key` without calling them.
    pub fn clear(&self, key: &str) {
        if let Some(slots) = lock(&self.slots).remove(key) {
            for slot in slots {
                slot.active.store(false, Ordering::Release);
            }
        }
    }

    pub fn listener_count(&self, key: &str) -> usize {
        lock(&self.slots).get(key).map_or(0, Vec::len)
    }
}

/// Handle returned by `add_listener`.
///
/// Dropping the handle keeps the listener subscribed; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[derive(Debug)]
pub struct ListenerHandle {
    key: String,
    id: u64,
    active: Arc<AtomicBool>,
    slots: Weak<Mutex<Slots>>,
}

impl ListenerHandle {
    /// Stop delivering events to this listener. Safe to call repeatedly.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        let Some(slots) = self.slots.upgrade() else {
            return;
        };
        let mut slots = lock(&slots);
        if let Some(list) = slots.get_mut(&self.key) {
            list.retain(|slot| slot.id != self.id);
            if list.is_empty() {
                slots.remove(&self.key);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

fn lock(slots: &Mutex<Slots>) -> MutexGuard<'_, Slots> {
    slots.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, Arc<Listener>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let callback: Arc<Listener> = Arc::new(move |_state: Option<&SaveState>| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn test_each_listener_called_once_per_event() {
        let bus = NotificationBus::new();
        let (a, cb_a) = counter();
        let (b, cb_b) = counter();
        bus.subscribe("doc", cb_a);
        bus.subscribe("doc", cb_b);

        bus.notify("doc", Some(&SaveState::fresh()));

        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let bus = NotificationBus::new();
        let (count, callback) = counter();
        bus.subscribe("doc", callback);

        bus.notify("other", None);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_is_idempotent_and_isolated() {
        let bus = NotificationBus::new();
        let (a, cb_a) = counter();
        let (b, cb_b) = counter();
        let handle = bus.subscribe("doc", cb_a);
        bus.subscribe("doc", cb_b);

        handle.unsubscribe();
        handle.unsubscribe();
        assert!(!handle.is_active());

        bus.notify("doc", None);
        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert_eq!(b.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count("doc"), 1);
    }

    #[test]
    fn test_unsubscribe_after_bus_dropped() {
        let bus = NotificationBus::new();
        let (_, callback) = counter();
        let handle = bus.subscribe("doc", callback);
        drop(bus);
        handle.unsubscribe();
    }

    #[test]
    fn test_clear_deactivates_handles() {
        let bus = NotificationBus::new();
        let (count, callback) = counter();
        let handle = bus.subscribe("doc", callback);

        bus.clear("doc");
        bus.notify("doc", None);

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!handle.is_active());
        assert_eq!(bus.listener_count("doc"), 0);
    }
}
