//! Property tests for delivery semantics.

use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;

use atom_core::get;
use atom_core::reactive::atom;

proptest! {
    /// A distinct write reaches every subscriber exactly once; an equal
    /// write reaches none.
    #[test]
    fn distinct_writes_notify_each_subscriber_once(
        a in any::<i64>(),
        b in any::<i64>(),
        subscribers in 1usize..8,
    ) {
        let value = atom(a);
        let seen: Vec<Arc<Mutex<Vec<i64>>>> = (0..subscribers)
            .map(|_| Arc::new(Mutex::new(Vec::new())))
            .collect();
        let subs: Vec<_> = seen
            .iter()
            .map(|log| {
                let log = log.clone();
                value.subscribe(move |v| log.lock().push(*v))
            })
            .collect();

        value.set(b);
        value.set(b);

        for log in &seen {
            let log = log.lock();
            if a == b {
                prop_assert_eq!(&*log, &vec![a]);
            } else {
                prop_assert_eq!(&*log, &vec![a, b]);
            }
        }
        drop(subs);
        prop_assert_eq!(value.subscriber_count(), 0);
    }

    /// Mapping and reading agree with applying the function directly.
    #[test]
    fn map_get_matches_function(v in -10_000i64..10_000) {
        let f = |x: &i64| x * 3 - 1;
        let mapped = atom(v).map(f);
        prop_assert_eq!(mapped.get(), f(&v));
        prop_assert_eq!(get(&mapped), Ok(f(&v)));
    }

    /// The last write wins, regardless of the order of intermediate values.
    #[test]
    fn get_returns_last_write(writes in proptest::collection::vec(any::<u8>(), 1..32)) {
        let value = atom(0u8);
        for w in &writes {
            value.set(*w);
        }
        prop_assert_eq!(value.get(), *writes.last().unwrap());
    }
}
