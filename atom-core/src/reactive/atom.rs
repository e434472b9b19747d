//! Atom Implementation
//!
//! An atom is a publisher with a friendlier surface: read it with `get`,
//! write it with `set` or `update`, observe it with `subscribe`, and derive
//! new values from it with `map` and `pipe`.
//!
//! # Capabilities
//!
//! [`Atom`] can be written; [`ReadonlyAtom`] cannot. The readonly type simply
//! has no mutation methods, so handing out a `ReadonlyAtom` is enough to
//! guarantee the receiver cannot change the value. Both implement
//! [`Readable`] for code that only needs to observe.
//!
//! # Derived Atoms
//!
//! `map` produces a readonly atom fed by the source. The derived atom holds
//! its registration with the source and releases it once the last handle
//! and the last subscription to it are gone.

use std::fmt::Debug;
use std::sync::Arc;

use super::publisher::Publisher;
use super::subscriber::{Sink, Subscription};
use crate::stream::{Operator, Stream, Subscribable};

/// Create a writable atom holding `initial`.
pub fn atom<T>(initial: T) -> Atom<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    Atom::new(initial)
}

/// Create a readonly atom together with the function that writes it.
///
/// The creator keeps the setter and hands out only the view.
///
/// ```rust
/// use atom_core::reactive::readonly_atom;
///
/// let (count, set_count) = readonly_atom(4);
/// set_count(7);
/// assert_eq!(count.get(), 7);
/// ```
pub fn readonly_atom<T>(initial: T) -> (ReadonlyAtom<T>, impl Fn(T) + Clone + Send + Sync + 'static)
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let atom = Atom::new(initial);
    let view = atom.readonly();
    (view, move |value: T| {
        atom.set(value);
    })
}

/// Read access shared by [`Atom`] and [`ReadonlyAtom`].
pub trait Readable<T>: Subscribable<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Get a clone of the current value.
    fn get(&self) -> T;

    /// Register `callback`, replaying the current value to it.
    fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe_with(Arc::new(callback))
    }

    /// Derive a readonly atom holding `f` of the current value.
    fn map<U, F>(&self, f: F) -> ReadonlyAtom<U>
    where
        U: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static;

    /// Derive a readonly atom whose distinct check is `equals`.
    fn map_with_equality<U, F, E>(&self, f: F, equals: E) -> ReadonlyAtom<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
        E: Fn(&U, &U) -> bool + Send + Sync + 'static;

    /// Apply a stream operator to this atom's values.
    fn pipe<U, O>(&self, operator: O) -> Stream<U>
    where
        O: Operator<T, U>;

    /// Get a view without mutation capability.
    fn readonly(&self) -> ReadonlyAtom<T>;
}

/// A writable reactive value.
///
/// Cloning an `Atom` creates a new handle to the same value.
///
/// # Example
///
/// ```rust
/// use atom_core::reactive::atom;
///
/// let count = atom(3);
/// let square = count.map(|i| i * i);
/// assert_eq!(square.get(), 9);
///
/// count.update(|i| i + 1);
/// assert_eq!(square.get(), 16);
/// ```
pub struct Atom<T> {
    publisher: Publisher<T>,
}

impl<T> Atom<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an atom that suppresses `PartialEq`-equal writes.
    pub fn new(initial: T) -> Self
    where
        T: PartialEq,
    {
        Self {
            publisher: Publisher::new(initial),
        }
    }

    /// Create an atom with a custom equality check.
    pub fn with_equality<E>(initial: T, equals: E) -> Self
    where
        E: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            publisher: Publisher::with_equality(initial, equals),
        }
    }

    /// Get the atom's unique ID. Views and clones share it.
    pub fn id(&self) -> u64 {
        self.publisher.id()
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.publisher.get_value()
    }

    /// Run `f` against the current value without cloning it.
    ///
    /// `f` must not write to this atom.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.publisher.with(f)
    }

    /// Replace the value.
    ///
    /// Subscribers are notified synchronously, in subscription order, unless
    /// `value` equals the current value. Returns whether they were notified.
    pub fn set(&self, value: T) -> bool {
        self.publisher.next(value)
    }

    /// Replace the value with `f` of the current one.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> T,
    {
        let current = self.get();
        self.set(f(&current))
    }

    /// Register `callback`.
    ///
    /// `callback` receives the current value before this returns, then every
    /// distinct value written afterwards.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.publisher.subscribe(callback)
    }

    /// Derive a readonly atom holding `f` of the current value.
    ///
    /// `f` runs once now and once per distinct change of this atom. The
    /// derived atom only notifies when the result of `f` changes.
    pub fn map<U, F>(&self, f: F) -> ReadonlyAtom<U>
    where
        U: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        derive(&self.publisher, f)
    }

    /// Derive a readonly atom that compares results with `equals`.
    ///
    /// Use `|a, b| Arc::ptr_eq(a, b)` to notify whenever `f` returns a new
    /// allocation, even one with equal contents.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use atom_core::reactive::atom;
    ///
    /// let store = atom((0, Arc::new(vec!["a"])));
    /// let names = store.map_with_equality(|(_, n)| Arc::clone(n), |a, b| Arc::ptr_eq(a, b));
    ///
    /// let before = names.get();
    /// store.set((1, Arc::new(vec!["a"])));
    /// assert!(!Arc::ptr_eq(&before, &names.get()));
    /// ```
    pub fn map_with_equality<U, F, E>(&self, f: F, equals: E) -> ReadonlyAtom<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
        E: Fn(&U, &U) -> bool + Send + Sync + 'static,
    {
        derive_with(&self.publisher, f, equals)
    }

    /// Apply a stream operator to this atom's values.
    ///
    /// The result is a plain [`Stream`]. It replays synchronously only while
    /// every operator in the chain forwards the replayed value.
    pub fn pipe<U, O>(&self, operator: O) -> Stream<U>
    where
        O: Operator<T, U>,
    {
        self.to_stream().pipe(operator)
    }

    /// Get a view without mutation capability.
    pub fn readonly(&self) -> ReadonlyAtom<T> {
        ReadonlyAtom {
            publisher: self.publisher.clone(),
        }
    }

    /// View this atom as a stream.
    pub fn to_stream(&self) -> Stream<T> {
        to_stream(&self.publisher)
    }

    /// Get the number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.publisher.subscriber_count()
    }
}

/// A reactive value that cannot be written through this handle.
///
/// Obtained from [`Atom::readonly`], [`Atom::map`] or [`readonly_atom`].
///
/// There is no `set`:
///
/// ```compile_fail
/// use atom_core::reactive::atom;
///
/// let counter = atom(4);
/// counter.readonly().set(7);
/// ```
///
/// and no `update`, including on the view from [`readonly_atom`]:
///
/// ```compile_fail
/// use atom_core::reactive::readonly_atom;
///
/// let (count, _set_count) = readonly_atom(4);
/// count.update(|i| i + 1);
/// ```
pub struct ReadonlyAtom<T> {
    publisher: Publisher<T>,
}

impl<T> ReadonlyAtom<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Get the atom's unique ID.
    pub fn id(&self) -> u64 {
        self.publisher.id()
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.publisher.get_value()
    }

    /// Run `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.publisher.with(f)
    }

    /// Register `callback`, replaying the current value to it.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.publisher.subscribe(callback)
    }

    /// Derive a readonly atom holding `f` of the current value.
    pub fn map<U, F>(&self, f: F) -> ReadonlyAtom<U>
    where
        U: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        derive(&self.publisher, f)
    }

    /// Derive a readonly atom that compares results with `equals`.
    pub fn map_with_equality<U, F, E>(&self, f: F, equals: E) -> ReadonlyAtom<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
        E: Fn(&U, &U) -> bool + Send + Sync + 'static,
    {
        derive_with(&self.publisher, f, equals)
    }

    /// Apply a stream operator to this atom's values.
    pub fn pipe<U, O>(&self, operator: O) -> Stream<U>
    where
        O: Operator<T, U>,
    {
        self.to_stream().pipe(operator)
    }

    /// Get another readonly handle to the same value.
    pub fn readonly(&self) -> ReadonlyAtom<T> {
        self.clone()
    }

    /// View this atom as a stream.
    pub fn to_stream(&self) -> Stream<T> {
        to_stream(&self.publisher)
    }

    /// Get the number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.publisher.subscriber_count()
    }
}

fn derive<T, U, F>(source: &Publisher<T>, f: F) -> ReadonlyAtom<U>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + PartialEq + Send + Sync + 'static,
    F: Fn(&T) -> U + Send + Sync + 'static,
{
    derive_with(source, f, |a: &U, b: &U| a == b)
}

fn derive_with<T, U, F, E>(source: &Publisher<T>, f: F, equals: E) -> ReadonlyAtom<U>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
    F: Fn(&T) -> U + Send + Sync + 'static,
    E: Fn(&U, &U) -> bool + Send + Sync + 'static,
{
    let derived = Publisher::with_equality(f(&source.get_value()), equals);

    let target = derived.downgrade();
    let link = source.listen(move |value| {
        if let Some(target) = target.upgrade() {
            target.next(f(value));
        }
    });
    derived.hold(link);

    ReadonlyAtom { publisher: derived }
}

fn to_stream<T>(publisher: &Publisher<T>) -> Stream<T>
where
    T: Clone + Send + Sync + 'static,
{
    let publisher = publisher.clone();
    Stream::new(move |sink| publisher.subscribe_with(sink))
}

impl<T> Readable<T> for Atom<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn get(&self) -> T {
        Atom::get(self)
    }

    fn map<U, F>(&self, f: F) -> ReadonlyAtom<U>
    where
        U: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        Atom::map(self, f)
    }

    fn map_with_equality<U, F, E>(&self, f: F, equals: E) -> ReadonlyAtom<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
        E: Fn(&U, &U) -> bool + Send + Sync + 'static,
    {
        Atom::map_with_equality(self, f, equals)
    }

    fn pipe<U, O>(&self, operator: O) -> Stream<U>
    where
        O: Operator<T, U>,
    {
        Atom::pipe(self, operator)
    }

    fn readonly(&self) -> ReadonlyAtom<T> {
        Atom::readonly(self)
    }
}

impl<T> Readable<T> for ReadonlyAtom<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn get(&self) -> T {
        ReadonlyAtom::get(self)
    }

    fn map<U, F>(&self, f: F) -> ReadonlyAtom<U>
    where
        U: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        ReadonlyAtom::map(self, f)
    }

    fn map_with_equality<U, F, E>(&self, f: F, equals: E) -> ReadonlyAtom<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
        E: Fn(&U, &U) -> bool + Send + Sync + 'static,
    {
        ReadonlyAtom::map_with_equality(self, f, equals)
    }

    fn pipe<U, O>(&self, operator: O) -> Stream<U>
    where
        O: Operator<T, U>,
    {
        ReadonlyAtom::pipe(self, operator)
    }

    fn readonly(&self) -> ReadonlyAtom<T> {
        ReadonlyAtom::readonly(self)
    }
}

impl<T> Subscribable<T> for Atom<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn subscribe_with(&self, sink: Sink<T>) -> Subscription {
        self.publisher.subscribe_with(sink)
    }
}

impl<T> Subscribable<T> for ReadonlyAtom<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn subscribe_with(&self, sink: Sink<T>) -> Subscription {
        self.publisher.subscribe_with(sink)
    }
}

impl<T> From<Atom<T>> for ReadonlyAtom<T> {
    fn from(atom: Atom<T>) -> Self {
        Self {
            publisher: atom.publisher,
        }
    }
}

impl<T> From<&Atom<T>> for Stream<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from(atom: &Atom<T>) -> Self {
        atom.to_stream()
    }
}

impl<T> From<&ReadonlyAtom<T>> for Stream<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from(atom: &ReadonlyAtom<T>) -> Self {
        atom.to_stream()
    }
}

impl<T> Clone for Atom<T> {
    fn clone(&self) -> Self {
        Self {
            publisher: self.publisher.clone(),
        }
    }
}

impl<T> Clone for ReadonlyAtom<T> {
    fn clone(&self) -> Self {
        Self {
            publisher: self.publisher.clone(),
        }
    }
}

impl<T> Debug for Atom<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Atom").field(&self.publisher).finish()
    }
}

impl<T> Debug for ReadonlyAtom<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ReadonlyAtom").field(&self.publisher).finish()
    }
}

// ----------------------------------------------------------------------------
// Serde
// ----------------------------------------------------------------------------

#[cfg(feature = "serde")]
mod serde_impls {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{Atom, ReadonlyAtom};

    impl<T> Serialize for Atom<T>
    where
        T: Serialize + Clone + Send + Sync + 'static,
    {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            self.with(|value| value.serialize(serializer))
        }
    }

    impl<T> Serialize for ReadonlyAtom<T>
    where
        T: Serialize + Clone + Send + Sync + 'static,
    {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            self.with(|value| value.serialize(serializer))
        }
    }

    impl<'de, T> Deserialize<'de> for Atom<T>
    where
        T: Deserialize<'de> + Clone + PartialEq + Send + Sync + 'static,
    {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            T::deserialize(deserializer).map(Atom::new)
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn atom_get_set_update() {
        let count = atom(10);
        assert_eq!(count.get(), 10);

        assert!(count.set(42));
        assert_eq!(count.get(), 42);

        assert!(count.update(|v| v + 5));
        assert_eq!(count.get(), 47);

        assert!(!count.update(|v| *v));
    }

    #[test]
    fn map_evaluates_once_per_distinct_change() {
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        let count = atom(2);
        let doubled = count.map(move |i| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            i * 2
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        count.set(2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        count.set(3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(doubled.get(), 6);
    }

    #[test]
    fn dropping_derived_atom_releases_source() {
        let count = atom(1);
        let doubled = count.map(|i| i * 2);
        assert_eq!(count.subscriber_count(), 1);

        drop(doubled);
        assert_eq!(count.subscriber_count(), 0);
    }

    #[test]
    fn subscription_keeps_derived_atom_alive() {
        let count = atom(1);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let sub = count.map(|i| i * 2).subscribe(move |v| seen_clone.lock().push(*v));

        count.set(5);
        assert_eq!(*seen.lock(), vec![2, 10]);

        sub.unsubscribe();
        assert_eq!(count.subscriber_count(), 0);
    }

    #[test]
    fn chained_maps() {
        let count = atom(1);
        let plus_ten = count.map(|i| i * 2).map(|i| i + 10);
        assert_eq!(plus_ten.get(), 12);

        count.set(10);
        assert_eq!(plus_ten.get(), 30);
    }

    #[test]
    fn clone_shares_state() {
        let a1 = atom(0);
        let a2 = a1.clone();

        a1.set(42);
        assert_eq!(a2.get(), 42);
        assert_eq!(a1.id(), a2.id());
    }

    #[test]
    fn readonly_from_atom() {
        let count = atom(1);
        let view: ReadonlyAtom<i32> = count.clone().into();

        count.set(2);
        assert_eq!(view.get(), 2);
        assert_eq!(view.id(), count.id());
    }

    #[test]
    fn atoms_convert_to_streams() {
        let count = atom(3);
        let stream: Stream<i32> = (&count).into();
        let view_stream = Stream::from(&count.readonly());

        count.set(4);
        assert_eq!(crate::get(&stream), Ok(4));
        assert_eq!(crate::get(&view_stream), Ok(4));
    }

    #[test]
    fn readable_is_generic_over_views() {
        fn describe<R: Readable<i32>>(source: &R) -> String {
            source.map(|i| format!("#{i}")).get()
        }

        let count = atom(3);
        assert_eq!(describe(&count), "#3");
        assert_eq!(describe(&count.readonly()), "#3");
    }

    #[test]
    fn map_with_pointer_equality_notifies_on_new_allocation() {
        let store = atom((0, "a".to_string()));
        let name = store.map_with_equality(|(_, n)| Arc::new(n.clone()), |a, b| Arc::ptr_eq(a, b));

        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();
        let _sub = name.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        // Same name, new allocation
        store.set((1, "a".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Equal source values are still filtered upstream
        store.set((1, "a".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*name.get(), "a");
    }

    #[test]
    fn readable_subscribe_replays_and_follows() {
        fn record<R: Readable<i32>>(source: &R, log: Arc<Mutex<Vec<i32>>>) -> Subscription {
            source.subscribe(move |v| log.lock().push(*v))
        }

        let count = atom(1);
        let log = Arc::new(Mutex::new(Vec::new()));
        let _sub = record(&count.readonly(), log.clone());

        count.set(2);
        assert_eq!(*log.lock(), vec![1, 2]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_current_value() {
        let count = atom(vec![1, 2, 3]);
        assert_eq!(serde_json::to_string(&count).unwrap(), "[1,2,3]");

        let restored: Atom<Vec<i32>> = serde_json::from_str("[4,5]").unwrap();
        assert_eq!(restored.get(), vec![4, 5]);
    }
}
