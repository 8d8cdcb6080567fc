//! Multicast notification bus with handle-scoped subscriptions.
//!
//! A [`Signal`] only keeps weak references to its callbacks. The strong reference lives in the
//! [`Subscriber`] returned by [`Signal::subscribe`]; once the last clone of that handle is
//! dropped the callback is unregistered and no publication issued afterwards will reach it.
//!
//! Publishing snapshots the registered weak references under the registry lock and invokes the
//! callbacks with the lock released, so callbacks may subscribe or unsubscribe (on this signal or
//! any other) while they run. Each weak reference is upgraded right before its callback is
//! called; a callback whose handle was released earlier in the same publication is skipped. Only
//! an invocation already running on another thread when the handle is released can outlast it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

struct Slot<F: ?Sized> {
    id: u64,
    callback: Weak<F>,
}

struct Registry<F: ?Sized> {
    next_id: AtomicU64,
    slots: Mutex<Vec<Slot<F>>>,
}

impl<F: ?Sized> Registry<F> {
    fn slots(&self) -> MutexGuard<'_, Vec<Slot<F>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: u64) {
        self.slots().retain(|slot| slot.id != id);
    }
}

/// Thread-safe multicast dispatcher over callbacks of type `F`.
///
/// `F` is usually a `dyn Fn(..) + Send + Sync` type; [`Signal::publish`] hands each registered
/// callback to an invoker closure, which lets the signal stay agnostic of the argument list.
pub struct Signal<F: ?Sized> {
    registry: Arc<Registry<F>>,
}

impl<F: ?Sized> Default for Signal<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for Signal<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<F: ?Sized> Signal<F> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(0),
                slots: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Registers `callback`. It stays registered for as long as the returned handle (or any
    /// clone of it) is alive.
    pub fn subscribe(&self, callback: Arc<F>) -> Subscriber<F> {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.slots().push(Slot {
            id,
            callback: Arc::downgrade(&callback),
        });

        Subscriber {
            registration: Arc::new(Registration {
                id,
                _callback: callback,
                registry: Arc::downgrade(&self.registry),
            }),
        }
    }

    /// Invokes every currently registered callback in subscription order.
    ///
    /// Returns the number of callbacks invoked.
    pub fn publish(&self, mut invoke: impl FnMut(&F)) -> usize {
        let snapshot: Vec<Weak<F>> = {
            let mut slots = self.registry.slots();
            slots.retain(|slot| slot.callback.strong_count() > 0);
            slots.iter().map(|slot| Weak::clone(&slot.callback)).collect()
        };

        let mut invoked = 0;
        for weak in &snapshot {
            if let Some(callback) = weak.upgrade() {
                invoke(&*callback);
                invoked += 1;
            }
        }
        invoked
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry
            .slots()
            .iter()
            .filter(|slot| slot.callback.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriber_count() == 0
    }
}

struct Registration<F: ?Sized> {
    id: u64,
    // The only strong reference; the registry holds a `Weak`.
    _callback: Arc<F>,
    registry: Weak<Registry<F>>,
}

impl<F: ?Sized> Drop for Registration<F> {
    fn drop(&mut self) {
        // The signal may already be gone; then there is nothing to unregister from.
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

/// Lifetime token for a [`Signal`] subscription.
///
/// Clones share the same registration; the callback is unregistered when the last one drops.
pub struct Subscriber<F: ?Sized> {
    registration: Arc<Registration<F>>,
}

impl<F: ?Sized> Clone for Subscriber<F> {
    fn clone(&self) -> Self {
        Self {
            registration: Arc::clone(&self.registration),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Subscriber<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.registration.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl<F: ?Sized> Subscriber<F> {
    /// Releases this handle. Equivalent to dropping it.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Whether the signal this handle was issued by still exists.
    pub fn is_connected(&self) -> bool {
        self.registration.registry.strong_count() > 0
    }
}
