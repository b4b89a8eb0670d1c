//! Advisory call counters for both loader sides.
//!
//! Counters are plain atomics sampled into a [`MetricsSnapshot`]; they are
//! observational only and never affect control flow. Export to a metrics
//! registry is left to the embedding application.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::context::Context;
use crate::error::CacheError;
use crate::loader::{cache_loader, source_loader, CacheLoader, SourceLoader};
use crate::plugin::Plugin;

#[derive(Debug, Default)]
struct LoaderCounters {
    calls: AtomicU64,
    errors: AtomicU64,
    busy_nanos: AtomicU64,
}

impl LoaderCounters {
    fn record(&self, started: Instant, failed: bool) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        self.busy_nanos
            .fetch_add(started.elapsed().as_nanos() as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            busy: Duration::from_nanos(self.busy_nanos.load(Ordering::Relaxed)),
        }
    }
}

/// Point-in-time view of one loader side's counters.
///
/// All fields are cumulative since plugin creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Number of loader invocations.
    pub calls: u64,
    /// Number of invocations that returned an error.
    pub errors: u64,
    /// Total time spent inside the loader.
    pub busy: Duration,
}

/// Plugin counting calls, errors, and busy time per loader side.
#[derive(Clone, Default)]
pub struct MetricsPlugin {
    source: Arc<LoaderCounters>,
    cache: Arc<LoaderCounters>,
}

impl MetricsPlugin {
    /// Creates a plugin with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the source-side counters.
    pub fn source_snapshot(&self) -> MetricsSnapshot {
        self.source.snapshot()
    }

    /// Snapshot of the cache-side counters.
    pub fn cache_snapshot(&self) -> MetricsSnapshot {
        self.cache.snapshot()
    }
}

#[async_trait]
impl Plugin for MetricsPlugin {
    async fn intercept_source(
        &self,
        _ctx: &Context,
        _key: &str,
        next: SourceLoader,
    ) -> Result<(SourceLoader, bool), CacheError> {
        let counters = Arc::clone(&self.source);
        let wrapped = source_loader(move |ctx, key, ttl| {
            let counters = Arc::clone(&counters);
            let next = next.clone();
            async move {
                let started = Instant::now();
                let result = next(ctx, key, ttl).await;
                counters.record(started, result.is_err());
                result
            }
        });
        Ok((wrapped, true))
    }

    async fn intercept_cache(
        &self,
        _ctx: &Context,
        _key: &str,
        next: CacheLoader,
    ) -> Result<(CacheLoader, bool), CacheError> {
        let counters = Arc::clone(&self.cache);
        let wrapped = cache_loader(move |ctx, key| {
            let counters = Arc::clone(&counters);
            let next = next.clone();
            async move {
                let started = Instant::now();
                let result = next(ctx, key).await;
                counters.record(started, result.is_err());
                result
            }
        });
        Ok((wrapped, true))
    }
}
