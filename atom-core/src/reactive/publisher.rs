//! Publisher Implementation
//!
//! A Publisher is the replaying subject that backs every atom. It holds the
//! current value and an ordered registry of subscriber callbacks.
//!
//! # How Publishers Work
//!
//! 1. `subscribe` registers a callback and immediately invokes it with the
//!    current value, before returning.
//!
//! 2. `next` compares the incoming value with the current one. Equal values
//!    are dropped; anything else replaces the value and is delivered to every
//!    registered callback in registration order.
//!
//! 3. The [`Subscription`] returned by `subscribe` removes the callback when
//!    released.
//!
//! # Reentrancy
//!
//! No lock is held while a callback runs. Callbacks may read the publisher,
//! push new values into it, or subscribe and unsubscribe. A callback removed
//! while a delivery is in flight is skipped for the rest of that delivery.
//!
//! A value pushed from inside a callback is delivered to every callback
//! before the push returns. The outer delivery then stops, so no callback
//! sees the superseded value after the newer one.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::trace;

use super::subscriber::{Sink, SubscriberId, Subscription};
use crate::stream::Subscribable;

/// Counter for generating unique publisher IDs.
static PUBLISHER_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique publisher ID.
fn next_publisher_id() -> u64 {
    PUBLISHER_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Equality used to decide whether a new value is distinct from the current one.
pub type Equality<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

struct PublisherInner<T> {
    /// Unique identifier for this publisher.
    id: u64,

    /// The current value.
    value: RwLock<T>,

    /// Registered callbacks, in registration order.
    subscribers: Mutex<IndexMap<SubscriberId, Sink<T>>>,

    /// Distinct-until-changed check.
    equals: Equality<T>,

    /// Bumped on every accepted value.
    version: AtomicU64,

    /// Upstream registration feeding a derived publisher.
    /// Released together with the publisher.
    upstream: Mutex<Option<Subscription>>,
}

/// A current value plus the callbacks observing it.
///
/// Cloning a `Publisher` creates a new handle to the same value and
/// registry.
///
/// # Example
///
/// ```rust
/// use atom_core::reactive::Publisher;
///
/// let publisher = Publisher::new(1);
/// let sub = publisher.subscribe(|v| println!("value: {v}")); // prints 1
///
/// publisher.next(2); // prints 2
/// publisher.next(2); // equal, nothing delivered
/// sub.unsubscribe();
/// ```
pub struct Publisher<T> {
    inner: Arc<PublisherInner<T>>,
}

impl<T> Publisher<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a publisher that compares values with `PartialEq`.
    pub fn new(value: T) -> Self
    where
        T: PartialEq,
    {
        Self::with_equality(value, |a: &T, b: &T| a == b)
    }

    /// Create a publisher with a custom equality check.
    ///
    /// Passing `|a, b| Arc::ptr_eq(a, b)` gives reference-identity
    /// semantics for `Arc` values.
    pub fn with_equality<E>(value: T, equals: E) -> Self
    where
        E: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(PublisherInner {
                id: next_publisher_id(),
                value: RwLock::new(value),
                subscribers: Mutex::new(IndexMap::new()),
                equals: Arc::new(equals),
                version: AtomicU64::new(0),
                upstream: Mutex::new(None),
            }),
        }
    }

    /// Get the publisher's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get a clone of the current value.
    pub fn get_value(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Run `f` against the current value without cloning it.
    ///
    /// The value is read-locked while `f` runs, so `f` must not push into
    /// this publisher.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.inner.value.read();
        f(&*guard)
    }

    /// Push a new value.
    ///
    /// Returns `true` if the value was distinct and subscribers were notified.
    pub fn next(&self, value: T) -> bool {
        let delivered = {
            let mut guard = self.inner.value.write();
            if (self.inner.equals)(&*guard, &value) {
                None
            } else {
                *guard = value.clone();
                let version = self.inner.version.fetch_add(1, Ordering::AcqRel) + 1;
                Some((value, version))
            }
        };

        match delivered {
            Some((value, version)) => {
                self.deliver(&value, version);
                true
            }
            None => {
                trace!(publisher = self.inner.id, "value unchanged, skipping delivery");
                false
            }
        }
    }

    /// Register `callback` and replay the current value to it.
    ///
    /// The callback has been invoked once by the time this returns.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe_with(Arc::new(callback))
    }

    /// Register a shared callback and replay the current value to it.
    pub fn subscribe_with(&self, sink: Sink<T>) -> Subscription {
        let current = self.get_value();
        let subscription = self.register(Arc::clone(&sink));
        sink(&current);
        subscription
    }

    /// Register a callback without replaying the current value.
    pub(crate) fn listen<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.register(Arc::new(callback))
    }

    /// Get the number of registered callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Keep `subscription` alive for as long as this publisher lives.
    pub(crate) fn hold(&self, subscription: Subscription) {
        let previous = self.inner.upstream.lock().replace(subscription);
        drop(previous);
    }

    pub(crate) fn downgrade(&self) -> WeakPublisher<T> {
        WeakPublisher {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn register(&self, sink: Sink<T>) -> Subscription {
        let id = SubscriberId::new();
        self.inner.subscribers.lock().insert(id, sink);
        trace!(publisher = self.inner.id, subscriber = ?id, "subscribed");

        let inner = Arc::clone(&self.inner);
        Subscription::new(move || {
            let removed = inner.subscribers.lock().shift_remove(&id);
            if removed.is_some() {
                trace!(publisher = inner.id, subscriber = ?id, "unsubscribed");
            }
        })
    }

    /// Deliver `value` to every registered callback, in registration order.
    ///
    /// Stops early once a newer value has been accepted.
    fn deliver(&self, value: &T, version: u64) {
        let sinks: Vec<(SubscriberId, Sink<T>)> = self
            .inner
            .subscribers
            .lock()
            .iter()
            .map(|(id, sink)| (*id, Arc::clone(sink)))
            .collect();

        trace!(publisher = self.inner.id, subscribers = sinks.len(), "delivering value");

        for (id, sink) in sinks {
            if self.inner.version.load(Ordering::Acquire) != version {
                trace!(publisher = self.inner.id, "value superseded, stopping delivery");
                return;
            }
            // An earlier callback may have unsubscribed this one
            if self.inner.subscribers.lock().contains_key(&id) {
                sink(value);
            }
        }
    }
}

impl<T> Subscribable<T> for Publisher<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn subscribe_with(&self, sink: Sink<T>) -> Subscription {
        Publisher::subscribe_with(self, sink)
    }
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Publisher<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.read())
            .field("subscriber_count", &self.inner.subscribers.lock().len())
            .finish()
    }
}

/// Non-owning handle to a publisher.
///
/// Derived publishers are fed through one of these so that the upstream
/// registry does not keep them alive.
pub(crate) struct WeakPublisher<T> {
    inner: Weak<PublisherInner<T>>,
}

impl<T> WeakPublisher<T> {
    pub(crate) fn upgrade(&self) -> Option<Publisher<T>> {
        self.inner.upgrade().map(|inner| Publisher { inner })
    }
}
