//! Streams and Operators
//!
//! A [`Stream`] is a cold subscribable: it does nothing until subscribed, and
//! every subscription runs its own copy of the operator chain, so stateful
//! operators such as [`scan`](operators::scan) keep per-subscriber state.
//!
//! Streams are what [`Atom::pipe`](crate::reactive::Atom::pipe) returns. A
//! stream piped from an atom inherits the atom's synchronous replay for as
//! long as every operator in the chain forwards the replayed value. `map`,
//! `scan`, `tap` and `distinct_until_changed` always do; `filter` and `skip`
//! may swallow it, in which case [`get`](crate::get()) reports
//! [`Error::NotSynchronous`](crate::Error::NotSynchronous).

pub mod operators;

use std::fmt::Debug;
use std::sync::Arc;

use crate::reactive::{Sink, Subscription};

/// Anything a callback can be registered with.
pub trait Subscribable<T> {
    /// Register `sink`. The returned handle deregisters it when released.
    fn subscribe_with(&self, sink: Sink<T>) -> Subscription;
}

/// Transformation from one stream to another.
///
/// Any `FnOnce(Stream<T>) -> Stream<U>` is an operator.
pub trait Operator<T, U> {
    /// Apply the operator to `source`.
    fn apply(self, source: Stream<T>) -> Stream<U>;
}

impl<T, U, F> Operator<T, U> for F
where
    F: FnOnce(Stream<T>) -> Stream<U>,
{
    fn apply(self, source: Stream<T>) -> Stream<U> {
        self(source)
    }
}

type SubscribeFn<T> = Arc<dyn Fn(Sink<T>) -> Subscription + Send + Sync>;

/// A cold, generic subscribable.
///
/// # Example
///
/// ```rust
/// use atom_core::reactive::atom;
/// use atom_core::stream::operators::{filter, map};
///
/// let count = atom(3);
/// let evens = count
///     .pipe(map(|i: &i32| i * 2))
///     .pipe(filter(|i: &i32| i % 4 == 0));
///
/// let sub = evens.subscribe(|v| println!("{v}"));
/// count.set(4); // prints 8
/// sub.unsubscribe();
/// ```
pub struct Stream<T> {
    subscribe: SubscribeFn<T>,
}

impl<T> Stream<T>
where
    T: Send + Sync + 'static,
{
    /// Create a stream from its subscribe function.
    ///
    /// `subscribe` is called once per subscriber with that subscriber's
    /// sink, and returns the handle that tears the registration down.
    pub fn new<F>(subscribe: F) -> Self
    where
        F: Fn(Sink<T>) -> Subscription + Send + Sync + 'static,
    {
        Self {
            subscribe: Arc::new(subscribe),
        }
    }

    /// A stream that delivers `value` synchronously to each subscriber.
    pub fn of(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(move |sink| {
            sink(&value);
            Subscription::empty()
        })
    }

    /// A stream that never delivers anything.
    pub fn never() -> Self {
        Self::new(|_| Subscription::empty())
    }

    /// Register `callback` with this stream.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        (self.subscribe)(Arc::new(callback))
    }

    /// Apply `operator`, producing a new stream.
    ///
    /// Chain further operators with repeated `pipe` calls.
    pub fn pipe<U, O>(&self, operator: O) -> Stream<U>
    where
        O: Operator<T, U>,
    {
        operator.apply(self.clone())
    }
}

impl<T> Subscribable<T> for Stream<T>
where
    T: Send + Sync + 'static,
{
    fn subscribe_with(&self, sink: Sink<T>) -> Subscription {
        (self.subscribe)(sink)
    }
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            subscribe: Arc::clone(&self.subscribe),
        }
    }
}

impl<T> Debug for Stream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}
