//! Error types for the kv crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `KvError`: failures talking to or decoding from a store
//! - `CacheError`: failures on the read-through path, from the store or the
//!   miss handler

use std::fmt;

/// Errors from key-value store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvError {
    /// The backing store could not be reached.
    Unavailable { reason: String },
    /// The store answered with an unexpected status.
    RequestFailed { key: String, status: u16, body: String },
    /// A stored value could not be encoded or decoded.
    Serialization { key: String, reason: String },
}

impl fmt::Display for KvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => {
                write!(f, "key-value store unavailable: {reason}")
            }
            Self::RequestFailed { key, status, body } => {
                write!(f, "key-value request for '{key}' failed with {status}: {body}")
            }
            Self::Serialization { key, reason } => {
                write!(f, "value for '{key}' could not be (de)serialized: {reason}")
            }
        }
    }
}

impl std::error::Error for KvError {}

/// Errors from a read-through cache lookup.
///
/// Cloneable so that a single-flight leader can hand the same failure to
/// every waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Reading or writing the store failed.
    Store { key: String, reason: String },
    /// The miss handler failed.
    Fetch { reason: String },
}

impl CacheError {
    /// Builds a `Fetch` error from anything displayable.
    pub fn fetch(reason: impl fmt::Display) -> Self {
        Self::Fetch {
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store { key, reason } => {
                write!(f, "cache store error for '{key}': {reason}")
            }
            Self::Fetch { reason } => {
                write!(f, "cache miss handler failed: {reason}")
            }
        }
    }
}

impl std::error::Error for CacheError {}
