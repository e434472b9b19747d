//! Error types for atom-core.

use thiserror::Error;

/// Errors raised while reading values out of reactive sources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A subscribable source did not invoke its subscriber during the
    /// `subscribe` call, so there is no current value to return.
    #[error("Cannot get value from a stream that doesn't call its subscriber synchronously")]
    NotSynchronous,
}

/// Result type alias for atom-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_synchronous_message() {
        assert_eq!(
            Error::NotSynchronous.to_string(),
            "Cannot get value from a stream that doesn't call its subscriber synchronously"
        );
    }
}
