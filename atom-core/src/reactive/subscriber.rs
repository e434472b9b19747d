//! Subscriber types for the reactive system.
//!
//! A subscriber is a callback registered with a publisher. Registration hands
//! back a [`Subscription`], the ownership handle that must be released to
//! deregister the callback.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Callback invoked with each delivered value.
pub type Sink<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Unique identifier for a registered subscriber.
///
/// Publishers key their registry by this ID, so two registrations of the
/// same closure are still two independent subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

type Teardown = Box<dyn FnOnce() + Send>;

/// Handle to an active callback registration.
///
/// Calling [`unsubscribe`](Self::unsubscribe) or dropping the handle removes
/// the registration. Unsubscribing is idempotent: only the first call runs
/// the teardown.
///
/// A subscription keeps its source alive. Dropping every handle to a mapped
/// atom does not stop delivery to subscriptions that are still open.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    teardown: Mutex<Option<Teardown>>,
}

impl Subscription {
    /// Create a subscription that runs `teardown` when released.
    ///
    /// Custom [`Subscribable`](crate::stream::Subscribable) sources use this
    /// to hand back their own deregistration logic.
    pub fn new<F>(teardown: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            teardown: Mutex::new(Some(Box::new(teardown))),
        }
    }

    /// A subscription with nothing to release.
    pub fn empty() -> Self {
        Self {
            teardown: Mutex::new(None),
        }
    }

    /// Release the registration. Calling this more than once is a no-op.
    pub fn unsubscribe(&self) {
        // Taken under the lock, run outside it: teardown may drop the last
        // handle to a derived atom, which releases further subscriptions.
        let teardown = self.teardown.lock().take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }

    /// Whether the registration has already been released.
    pub fn is_closed(&self) -> bool {
        self.teardown.lock().is_none()
    }

    /// Give up the handle without deregistering.
    ///
    /// The callback stays registered for as long as its source lives.
    pub fn detach(self) {
        drop(self.teardown.lock().take());
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}
