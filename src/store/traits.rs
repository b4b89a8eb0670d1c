//! Store contract consumed by the controller.
//!
//! Stores hold opaque payloads under opaque string keys. They know nothing
//! about boxed records, policies, or value types — the controller handles
//! packaging, and a policy decides when the store is authoritative. This
//! keeps coordination logic independent of where bytes live (process
//! memory, a remote key-value server, a hash field).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Payload ownership                            │
//! │                                                                     │
//! │   direct store (is_direct = true)                                   │
//! │   ┌───────────────────────────────────────────────┐                 │
//! │   │ Payload::Direct(Arc<dyn Any + Send + Sync>)   │                 │
//! │   │ get() returns the same shared reference       │                 │
//! │   │ that set() received — no codec involved       │                 │
//! │   └───────────────────────────────────────────────┘                 │
//! │                                                                     │
//! │   serializing store (is_direct = false)                             │
//! │   ┌───────────────────────────────────────────────┐                 │
//! │   │ Payload::Text(String)                         │                 │
//! │   │ controller encodes the boxed record to JSON   │                 │
//! │   │ on write and parses it on read                │                 │
//! │   └───────────────────────────────────────────────┘                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Contract
//!
//! - `get` on an absent key returns [`CacheError::KeyMissing`]; any other
//!   failure is [`CacheError::Transport`].
//! - `del` is best-effort; absence is not an error.
//!
//! ## TTL Contract
//!
//! [`Ttl::Keep`] means "do not expire at the store layer". Adapters that
//! speak a remote protocol send sub-second expiries in milliseconds and
//! whole-second expiries in seconds (see [`crate::ttl`]).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::CacheError;
use crate::ttl::Ttl;

/// Shared in-process value held by a direct store.
pub type DirectValue = Arc<dyn Any + Send + Sync>;

/// The value a store holds for one key.
#[derive(Clone)]
pub enum Payload {
    /// A native in-process value, stored and returned by shared reference.
    Direct(DirectValue),
    /// A serialized record.
    Text(String),
}

impl Payload {
    /// Unwraps a text payload.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Unpacking`] for a direct payload.
    pub fn into_text(self) -> Result<String, CacheError> {
        match self {
            Payload::Text(text) => Ok(text),
            Payload::Direct(_) => Err(CacheError::Unpacking(
                "expected a text payload but got a direct value".into(),
            )),
        }
    }

    /// Unwraps a direct payload.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Unpacking`] for a text payload.
    pub fn into_direct(self) -> Result<DirectValue, CacheError> {
        match self {
            Payload::Direct(value) => Ok(value),
            Payload::Text(_) => Err(CacheError::Unpacking(
                "expected a direct value but got a text payload".into(),
            )),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Direct(_) => f.write_str("Payload::Direct(..)"),
            Payload::Text(text) => f.debug_tuple("Payload::Text").field(text).finish(),
        }
    }
}

/// Backend holding cached payloads under opaque string keys.
///
/// Implementations must be safe for concurrent use; the controller shares
/// one store across every request.
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the payload previously stored under `key`.
    ///
    /// # Errors
    ///
    /// [`CacheError::KeyMissing`] when the key is absent;
    /// [`CacheError::Transport`] on any other failure.
    async fn get(&self, ctx: &Context, key: &str) -> Result<Payload, CacheError>;

    /// Writes a payload with the given store-layer expiry.
    async fn set(
        &self,
        ctx: &Context,
        key: &str,
        payload: Payload,
        ttl: Ttl,
    ) -> Result<(), CacheError>;

    /// Removes the key. Best-effort: absence is not an error.
    async fn del(&self, ctx: &Context, key: &str) -> Result<(), CacheError>;

    /// Whether this store holds native in-process values.
    ///
    /// `true` ⇒ `get` returns the same shared reference that `set`
    /// received, and the controller skips the codec entirely.
    fn is_direct(&self) -> bool;
}
