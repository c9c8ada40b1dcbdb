//! Error types for respcache

use std::collections::TryReserveError;
use std::fmt;

/// Result type alias for respcache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache operations
#[derive(Debug)]
pub enum Error {
    /// Storage for a cache structure could not be reserved
    Allocation {
        /// What was being allocated (entry key, payload, list slot, ...)
        what: &'static str,
        /// Requested size in bytes (or slots, for list/index reservations)
        bytes: usize,
    },
}

impl Error {
    pub(crate) fn alloc(what: &'static str, bytes: usize) -> impl FnOnce(TryReserveError) -> Error {
        move |_| Error::Allocation { what, bytes }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Allocation { what, bytes } => {
                write!(f, "Allocation failed: {} ({} requested)", what, bytes)
            }
        }
    }
}

impl std::error::Error for Error {}
