//! Error types for the cachefront library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: the single error enum crossing the library boundary.
//!   Policies treat every cache-side kind as a miss; only [`CacheError::Source`]
//!   is policy-dependent.
//!
//! All variants are `Clone` so a single-flight batch can deliver the identical
//! `(value, error)` tuple to every waiter.
//!
//! ## Example Usage
//!
//! ```
//! use cachefront::error::CacheError;
//!
//! let err = CacheError::source("upstream unavailable");
//! assert!(matches!(err, CacheError::Source(_)));
//! assert!(err.to_string().contains("upstream unavailable"));
//! ```

use std::sync::Arc;

use thiserror::Error;

/// Boxed error type accepted from caller-supplied source functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by stores, loaders, policies, and the controller.
///
/// The cache-side kinds (`KeyMissing`, `Nil`, `Unpacking`, `Transport`,
/// `CircuitOpen`) are all treated as a cache miss by the policies: they fall
/// through to the source. `Source` wraps the caller-supplied function's error
/// and is returned or absorbed according to the active policy.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The store reports the key absent.
    #[error("cachefront: key does not exist")]
    KeyMissing,

    /// A loader produced a logically-nil value.
    #[error("cachefront: nil value")]
    Nil,

    /// Type downcast or deserialization failed.
    #[error("cachefront: unpacking failed: {0}")]
    Unpacking(String),

    /// A resilience plugin's circuit breaker is open.
    #[error("cachefront: circuit breaker open")]
    CircuitOpen,

    /// The store failed for a reason other than absence.
    #[error("cachefront: store transport: {0}")]
    Transport(String),

    /// The caller-supplied source function failed.
    ///
    /// Shared behind an `Arc` so the same error clones across all waiters of
    /// a single-flight batch.
    #[error("cachefront: source: {0}")]
    Source(#[source] Arc<dyn std::error::Error + Send + Sync + 'static>),
}

impl CacheError {
    /// Wraps a caller-side error as a [`CacheError::Source`].
    pub fn source(err: impl Into<BoxError>) -> Self {
        CacheError::Source(Arc::from(err.into()))
    }

    /// Whether this error came from the caller-supplied source function.
    pub fn is_source(&self) -> bool {
        matches!(self, CacheError::Source(_))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Unpacking(err.to_string())
    }
}
