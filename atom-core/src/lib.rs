//! Atom Core
//!
//! This crate provides reactive atoms: single-value containers that can be
//! read synchronously and observed for changes. It implements:
//!
//! - Atoms with `get`, `set`, `update`, `subscribe`, `map`, `pipe`, `readonly`
//! - A replaying publisher with distinct-until-changed delivery
//! - Cold streams with a small operator library
//! - A universal getter that reads any value holder, readable or
//!   synchronous subscribable
//!
//! The crate is designed to be used both as a native Rust library and, with
//! the `python` feature, as a Python extension module via PyO3.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: atoms, the publisher behind them, and subscriptions
//! - `stream`: generic subscribables and the operators used by `pipe`
//! - `get`: the universal getter and the shapes it accepts
//!
//! # Example
//!
//! ```rust
//! use atom_core::get;
//! use atom_core::reactive::{atom, readonly_atom};
//! use atom_core::stream::operators::map;
//!
//! // Create an atom
//! let count = atom(3);
//!
//! // Derive a value
//! let square = count.map(|i| i * i);
//!
//! // Observe it
//! let sub = square.subscribe(|v| println!("square: {v}")); // prints 9
//!
//! // Update the atom
//! count.set(4); // prints 16
//! sub.unsubscribe();
//!
//! // Hand out read access only
//! let (total, set_total) = readonly_atom(0);
//! set_total(7);
//! assert_eq!(get(&total), Ok(7));
//!
//! // Pipe through stream operators
//! let next = count.pipe(map(|i: &i32| i + 1));
//! assert_eq!(get(&next), Ok(5));
//! ```

pub mod error;
pub mod get;
pub mod reactive;
pub mod stream;

#[cfg(feature = "python")]
mod python;

pub use error::{Error, Result};
pub use get::{get, Gettable};
pub use reactive::{atom, readonly_atom, Atom, Readable, ReadonlyAtom, Subscription};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module definition.
///
/// This function is called by Python when importing the module.
/// It registers all Python-exposed types and functions.
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python::register(m)?;

    // Add version info
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
