//! The stale-always policy: serve whatever the cache holds, refresh
//! expired entries in the background.
//!
//! - Fresh hit ⇒ return it.
//! - Expired hit ⇒ try-lock the key's CRC-32 shard. Acquired ⇒ spawn a
//!   detached refresh (cancellation severed from the caller, deadline
//!   enforced) and return the stale value immediately. Not acquired ⇒ a
//!   refresh is already live for this (or a same-shard) key; return the
//!   stale value immediately.
//! - Miss or cache error ⇒ synchronous source call, degrading to the
//!   strict behavior for the cold-start case.
//!
//! The shard try-lock bounds live refreshes to one per key; refresh
//! failures only get logged, the next expired hit tries again.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::boxed::unix_now;
use crate::context::Context;
use crate::ds::{key_shard, ShardedMutex, SingleflightGroup};
use crate::error::CacheError;
use crate::loader::{CacheLoader, ErasedValue, SourceLoader};
use crate::policy::Policy;
use crate::ttl::KEEP_TTL;

/// Stale-always cache-through policy with asynchronous refresh.
pub struct FirstPolicy {
    expire: Duration,
    refresh_deadline: Duration,
    group: SingleflightGroup<ErasedValue>,
    locks: Arc<ShardedMutex>,
}

impl FirstPolicy {
    /// Creates a policy with the given business expiry.
    ///
    /// The background refresh deadline defaults to the same duration.
    pub fn new(expire: Duration) -> Self {
        Self {
            expire,
            refresh_deadline: expire,
            group: SingleflightGroup::new(),
            locks: Arc::new(ShardedMutex::new()),
        }
    }

    /// Overrides the background refresh deadline.
    ///
    /// Useful when the business expiry is short but the source is slow.
    pub fn with_refresh_deadline(mut self, deadline: Duration) -> Self {
        self.refresh_deadline = deadline;
        self
    }
}

#[async_trait]
impl Policy for FirstPolicy {
    async fn load(
        &self,
        ctx: Context,
        key: &str,
        cache: CacheLoader,
        source: SourceLoader,
    ) -> Result<ErasedValue, CacheError> {
        let expire_secs = self.expire.as_secs() as i64;
        let refresh_deadline = self.refresh_deadline;
        let locks = Arc::clone(&self.locks);
        let flight_key = key.to_string();
        self.group
            .run(key, async move {
                let (value, timestamp) = match cache(ctx.clone(), flight_key.clone()).await {
                    Ok(loaded) => loaded,
                    // Nothing to reuse: degrade to a synchronous load.
                    Err(_) => return source(ctx, flight_key, KEEP_TTL).await,
                };
                if unix_now() - timestamp < expire_secs {
                    return Ok(value);
                }

                if let Some(guard) = locks.try_lock(key_shard(&flight_key)) {
                    let refresh_ctx = ctx.detached().with_timeout(refresh_deadline);
                    tokio::spawn(async move {
                        let _guard = guard;
                        let refreshed = tokio::time::timeout(
                            refresh_deadline,
                            source(refresh_ctx.clone(), flight_key.clone(), KEEP_TTL),
                        )
                        .await;
                        match refreshed {
                            Ok(Ok(_)) => {},
                            Ok(Err(err)) => tracing::warn!(
                                key = %flight_key,
                                trace_id = ?refresh_ctx.trace_id(),
                                error = %err,
                                "background refresh failed"
                            ),
                            Err(_) => tracing::warn!(
                                key = %flight_key,
                                trace_id = ?refresh_ctx.trace_id(),
                                "background refresh timed out"
                            ),
                        }
                    });
                }

                Ok(value)
            })
            .await
    }
}
