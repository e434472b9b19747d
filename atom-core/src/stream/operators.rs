//! Stream operators.
//!
//! Each function returns an [`Operator`] for use with `pipe`. Stateful
//! operators allocate their state per subscription.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Operator, Stream};
use crate::reactive::Sink;

/// Transform every value with `f`.
pub fn map<T, U, F>(f: F) -> impl Operator<T, U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
    F: Fn(&T) -> U + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |source: Stream<T>| -> Stream<U> {
        Stream::new(move |sink: Sink<U>| {
            let f = Arc::clone(&f);
            source.subscribe(move |value| sink(&f(value)))
        })
    }
}

/// Forward only the values for which `predicate` returns `true`.
pub fn filter<T, P>(predicate: P) -> impl Operator<T, T>
where
    T: Send + Sync + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    let predicate = Arc::new(predicate);
    move |source: Stream<T>| -> Stream<T> {
        Stream::new(move |sink: Sink<T>| {
            let predicate = Arc::clone(&predicate);
            source.subscribe(move |value| {
                if predicate(value) {
                    sink(value);
                }
            })
        })
    }
}

/// Drop values equal to the previously forwarded one.
pub fn distinct_until_changed<T>() -> impl Operator<T, T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    move |source: Stream<T>| -> Stream<T> {
        Stream::new(move |sink: Sink<T>| {
            let last: Mutex<Option<T>> = Mutex::new(None);
            source.subscribe(move |value| {
                {
                    let mut last = last.lock();
                    if last.as_ref() == Some(value) {
                        return;
                    }
                    *last = Some(value.clone());
                }
                sink(value);
            })
        })
    }
}

/// Fold values into an accumulator, forwarding each intermediate result.
pub fn scan<T, U, F>(seed: U, f: F) -> impl Operator<T, U>
where
    T: Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
    F: Fn(&U, &T) -> U + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |source: Stream<T>| -> Stream<U> {
        Stream::new(move |sink: Sink<U>| {
            let f = Arc::clone(&f);
            let acc = Mutex::new(seed.clone());
            source.subscribe(move |value| {
                let next = {
                    let mut acc = acc.lock();
                    let next = f(&*acc, value);
                    *acc = next.clone();
                    next
                };
                sink(&next);
            })
        })
    }
}

/// Ignore the first `count` values.
pub fn skip<T>(count: usize) -> impl Operator<T, T>
where
    T: Send + Sync + 'static,
{
    move |source: Stream<T>| -> Stream<T> {
        Stream::new(move |sink: Sink<T>| {
            let seen = AtomicUsize::new(0);
            source.subscribe(move |value| {
                if seen.fetch_add(1, Ordering::Relaxed) >= count {
                    sink(value);
                }
            })
        })
    }
}

/// Run `f` on every value, forwarding it unchanged.
pub fn tap<T, F>(f: F) -> impl Operator<T, T>
where
    T: Send + Sync + 'static,
    F: Fn(&T) + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |source: Stream<T>| -> Stream<T> {
        Stream::new(move |sink: Sink<T>| {
            let f = Arc::clone(&f);
            source.subscribe(move |value| {
                f(value);
                sink(value);
            })
        })
    }
}
