//! In-process store with lazy per-entry expiry.
//!
//! A direct store backed by a hash map under a `parking_lot::RwLock`.
//! Expiry is checked on read: an expired entry is removed and reported as
//! [`CacheError::KeyMissing`], so there is no background janitor to manage.
//! [`MemoryStore::purge_expired`] exists for callers that want to reclaim
//! memory eagerly.
//!
//! ## Example Usage
//!
//! ```
//! # async fn demo() -> Result<(), cachefront::error::CacheError> {
//! use std::sync::Arc;
//! use cachefront::context::Context;
//! use cachefront::store::{MemoryStore, Payload, Store};
//! use cachefront::ttl::KEEP_TTL;
//!
//! let store = MemoryStore::new();
//! let ctx = Context::new();
//!
//! store
//!     .set(&ctx, "k", Payload::Direct(Arc::new(42_u64)), KEEP_TTL)
//!     .await?;
//! assert!(store.get(&ctx, "k").await.is_ok());
//! # Ok(())
//! # }
//! ```

use std::time::Instant;

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::context::Context;
use crate::error::CacheError;
use crate::store::traits::{Payload, Store};
use crate::ttl::Ttl;

struct Entry {
    payload: Payload,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Thread-safe in-memory store with per-entry TTL.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<FxHashMap<String, Entry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, including not-yet-purged expired
    /// ones.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, _ctx: &Context, key: &str) -> Result<Payload, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Ok(entry.payload.clone()),
                Some(_) => {},
                None => return Err(CacheError::KeyMissing),
            }
        }
        // Expired: drop it so the map does not accumulate dead entries.
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        Err(CacheError::KeyMissing)
    }

    async fn set(
        &self,
        _ctx: &Context,
        key: &str,
        payload: Payload,
        ttl: Ttl,
    ) -> Result<(), CacheError> {
        let expires_at = match ttl {
            Ttl::Keep => None,
            Ttl::After(dur) => Some(Instant::now() + dur),
        };
        self.entries
            .write()
            .insert(key.to_string(), Entry { payload, expires_at });
        Ok(())
    }

    async fn del(&self, _ctx: &Context, key: &str) -> Result<(), CacheError> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn is_direct(&self) -> bool {
        true
    }
}
