//! Error types for cache construction and reconfiguration.
//!
//! Lookups never fail: a missing key is `None`. Errors only arise when a
//! configuration value is rejected, before any state is changed.

extern crate alloc;

use alloc::string::String;

/// Errors reported by the LIRS caches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LirsError {
    /// A limit or tuning value is outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Internal bookkeeping disagrees with the list structure.
    ///
    /// Only produced by `check_invariants`, which exists for tests and
    /// debugging.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl LirsError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        LirsError::InvalidConfiguration(message.into())
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        LirsError::Invariant(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, LirsError>;
