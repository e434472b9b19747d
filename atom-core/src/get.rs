//! Universal Getter
//!
//! [`get`] reads the current value out of anything that has one, whether it
//! exposes the value directly, through a `get` method, or only through
//! `subscribe`.
//!
//! # Shapes
//!
//! A type opts in by implementing [`Gettable`], which names exactly one
//! [`Shape`]. Types with several capabilities pick the first that applies in
//! this order:
//!
//! 1. [`Shape::Value`]: the type holds its value ([`GetValue`]).
//! 2. [`Shape::Get`]: the type computes or clones its value ([`Get`]).
//! 3. [`Shape::Subscribe`]: the value is only observable
//!    ([`Subscribable`]); it is read by subscribing and immediately
//!    unsubscribing, which only works if the source delivers synchronously.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::reactive::{Atom, Publisher, ReadonlyAtom, Sink, Subscription};
use crate::stream::{Stream, Subscribable};

/// A type holding a current value.
pub trait GetValue<T> {
    /// Get the held value.
    fn get_value(&self) -> T;
}

/// A type that can produce its current value on demand.
pub trait Get<T> {
    /// Get the current value.
    fn get(&self) -> T;
}

/// How a value is read out of a [`Gettable`].
pub enum Shape<'a, T> {
    /// Read with [`GetValue::get_value`].
    Value(&'a dyn GetValue<T>),

    /// Read with [`Get::get`].
    Get(&'a dyn Get<T>),

    /// Read by subscribing and unsubscribing.
    Subscribe(&'a dyn Subscribable<T>),
}

/// Anything [`get`] can read.
pub trait Gettable<T> {
    /// The capability [`get`] should use.
    fn shape(&self) -> Shape<'_, T>;
}

/// Read the current value of `source`.
///
/// # Errors
///
/// Returns [`Error::NotSynchronous`] if `source` is only subscribable and
/// does not call its subscriber during `subscribe`.
///
/// # Example
///
/// ```rust
/// use atom_core::get;
/// use atom_core::reactive::atom;
/// use atom_core::stream::operators::map;
///
/// let count = atom(7);
/// let square = count.pipe(map(|i: &i32| i * i)).pipe(map(|i: &i32| i + 1));
/// assert_eq!(get(&square), Ok(50));
/// ```
pub fn get<T, G>(source: &G) -> Result<T>
where
    T: Clone + Send + 'static,
    G: Gettable<T> + ?Sized,
{
    match source.shape() {
        Shape::Value(holder) => Ok(holder.get_value()),
        Shape::Get(getter) => Ok(getter.get()),
        Shape::Subscribe(subscribable) => read_synchronously(subscribable),
    }
}

fn read_synchronously<T>(source: &dyn Subscribable<T>) -> Result<T>
where
    T: Clone + Send + 'static,
{
    let slot: Arc<Mutex<Option<T>>> = Arc::new(Mutex::new(None));
    let sink_slot = Arc::clone(&slot);
    let sink: Sink<T> = Arc::new(move |value: &T| {
        *sink_slot.lock() = Some(value.clone());
    });

    let subscription = source.subscribe_with(sink);
    subscription.unsubscribe();

    let value = slot.lock().take();
    value.ok_or_else(|| {
        debug!("subscribable did not deliver during subscribe");
        Error::NotSynchronous
    })
}

// ----------------------------------------------------------------------------
// Adapters
// ----------------------------------------------------------------------------

/// Gettable wrapper around a closure returning a held value.
#[derive(Debug, Clone)]
pub struct ValueFn<F>(F);

/// Gettable wrapper around a closure computing the current value.
#[derive(Debug, Clone)]
pub struct GetFn<F>(F);

/// Wrap `f` as a [`Shape::Value`] gettable.
pub fn value_fn<T, F: Fn() -> T>(f: F) -> ValueFn<F> {
    ValueFn(f)
}

/// Wrap `f` as a [`Shape::Get`] gettable.
pub fn get_fn<T, F: Fn() -> T>(f: F) -> GetFn<F> {
    GetFn(f)
}

/// Wrap a subscribe function as a [`Shape::Subscribe`] gettable.
///
/// This is [`Stream::new`] under another name.
pub fn subscribe_fn<T, F>(f: F) -> Stream<T>
where
    T: Send + Sync + 'static,
    F: Fn(Sink<T>) -> Subscription + Send + Sync + 'static,
{
    Stream::new(f)
}

impl<T, F: Fn() -> T> GetValue<T> for ValueFn<F> {
    fn get_value(&self) -> T {
        (self.0)()
    }
}

impl<T, F: Fn() -> T> Gettable<T> for ValueFn<F> {
    fn shape(&self) -> Shape<'_, T> {
        Shape::Value(self)
    }
}

impl<T, F: Fn() -> T> Get<T> for GetFn<F> {
    fn get(&self) -> T {
        (self.0)()
    }
}

impl<T, F: Fn() -> T> Gettable<T> for GetFn<F> {
    fn shape(&self) -> Shape<'_, T> {
        Shape::Get(self)
    }
}

// ----------------------------------------------------------------------------
// Crate types
// ----------------------------------------------------------------------------

impl<T> GetValue<T> for Publisher<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn get_value(&self) -> T {
        Publisher::get_value(self)
    }
}

impl<T> Gettable<T> for Publisher<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn shape(&self) -> Shape<'_, T> {
        Shape::Value(self)
    }
}

impl<T> Get<T> for Atom<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn get(&self) -> T {
        Atom::get(self)
    }
}

impl<T> Gettable<T> for Atom<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn shape(&self) -> Shape<'_, T> {
        Shape::Get(self)
    }
}

impl<T> Get<T> for ReadonlyAtom<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn get(&self) -> T {
        ReadonlyAtom::get(self)
    }
}

impl<T> Gettable<T> for ReadonlyAtom<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn shape(&self) -> Shape<'_, T> {
        Shape::Get(self)
    }
}

impl<T> Gettable<T> for Stream<T>
where
    T: Send + Sync + 'static,
{
    fn shape(&self) -> Shape<'_, T> {
        Shape::Subscribe(self)
    }
}
