//! The strict policy: cache hit or live source, never stale data.
//!
//! - Cache hit ⇒ return it. The box timestamp is ignored; the store's own
//!   TTL (set to this policy's duration on every write) bounds staleness.
//! - Miss or cache error ⇒ call the source with TTL = duration.
//! - Source failure ⇒ the caller sees the source error.
//!
//! Use when correctness requires data no older than the store's TTL
//! window.

use std::time::Duration;

use async_trait::async_trait;

use crate::context::Context;
use crate::ds::SingleflightGroup;
use crate::error::CacheError;
use crate::loader::{CacheLoader, ErasedValue, SourceLoader};
use crate::policy::Policy;
use crate::ttl::Ttl;

/// Strict cache-through policy.
pub struct EasyPolicy {
    ttl: Duration,
    group: SingleflightGroup<ErasedValue>,
}

impl EasyPolicy {
    /// Creates a policy writing store entries with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            group: SingleflightGroup::new(),
        }
    }
}

#[async_trait]
impl Policy for EasyPolicy {
    async fn load(
        &self,
        ctx: Context,
        key: &str,
        cache: CacheLoader,
        source: SourceLoader,
    ) -> Result<ErasedValue, CacheError> {
        let ttl = self.ttl;
        let flight_key = key.to_string();
        // The cache read happens inside the flight as well: joiners of a
        // batch observe the identical result even when it was a plain hit.
        self.group
            .run(key, async move {
                match cache(ctx.clone(), flight_key.clone()).await {
                    Ok((value, _timestamp)) => Ok(value),
                    Err(_) => source(ctx, flight_key, Ttl::After(ttl)).await,
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::loader::{cache_loader, source_loader};

    fn hit(value: u64, timestamp: i64) -> CacheLoader {
        cache_loader(move |_ctx, _key| async move {
            Ok((Arc::new(value) as ErasedValue, timestamp))
        })
    }

    fn miss() -> CacheLoader {
        cache_loader(|_ctx, _key| async { Err(CacheError::KeyMissing) })
    }

    fn counted_source(value: u64, calls: Arc<AtomicUsize>) -> SourceLoader {
        source_loader(move |_ctx, _key, _ttl| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(value) as ErasedValue)
            }
        })
    }

    #[tokio::test]
    async fn hit_skips_the_source() {
        let policy = EasyPolicy::new(Duration::from_secs(1));
        let calls = Arc::new(AtomicUsize::new(0));

        let value = policy
            .load(
                Context::new(),
                "k",
                hit(5, 0), // Easy never looks at the timestamp
                counted_source(9, Arc::clone(&calls)),
            )
            .await
            .unwrap();

        assert_eq!(*value.downcast::<u64>().unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn miss_falls_through_with_policy_ttl() {
        let policy = EasyPolicy::new(Duration::from_secs(7));
        let seen_ttl = Arc::new(parking_lot::Mutex::new(None));
        let record = Arc::clone(&seen_ttl);
        let source = source_loader(move |_ctx, _key, ttl| {
            let record = Arc::clone(&record);
            async move {
                *record.lock() = Some(ttl);
                Ok(Arc::new(3_u64) as ErasedValue)
            }
        });

        let value = policy
            .load(Context::new(), "k", miss(), source)
            .await
            .unwrap();

        assert_eq!(*value.downcast::<u64>().unwrap(), 3);
        assert_eq!(*seen_ttl.lock(), Some(Ttl::After(Duration::from_secs(7))));
    }

    #[tokio::test]
    async fn source_errors_reach_the_caller() {
        let policy = EasyPolicy::new(Duration::from_secs(1));
        let source = source_loader(|_ctx, _key, _ttl| async {
            Err(CacheError::source("db down"))
        });

        let err = policy
            .load(Context::new(), "k", miss(), source)
            .await
            .unwrap_err();
        assert!(err.is_source());
    }
}
