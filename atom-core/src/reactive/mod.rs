//! Reactive Primitives
//!
//! This module implements atoms: containers for a single value that can be
//! read synchronously and observed for changes.
//!
//! # Concepts
//!
//! ## Publishers
//!
//! A [`Publisher`] holds the current value and an ordered list of subscriber
//! callbacks. Subscribing replays the current value immediately. Pushing a
//! value equal to the current one is a no-op.
//!
//! ## Atoms
//!
//! An [`Atom`] wraps a publisher and adds `set`, `update`, `map` and `pipe`.
//! [`ReadonlyAtom`] is the same thing without the ability to write.
//!
//! ## Subscriptions
//!
//! Every `subscribe` call returns a [`Subscription`]. Releasing it, either
//! explicitly or by dropping it, deregisters the callback.
//!
//! # Delivery
//!
//! Delivery is synchronous and inline: by the time `set` returns, every
//! subscriber has seen the new value. There is no queue and no scheduler.

mod atom;
mod publisher;
mod subscriber;

pub use atom::{atom, readonly_atom, Atom, Readable, ReadonlyAtom};
pub use publisher::{Equality, Publisher};
pub use subscriber::{Sink, SubscriberId, Subscription};
