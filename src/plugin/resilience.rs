//! Retry and circuit-breaking for both loader sides.
//!
//! Each key gets its own breaker: consecutive failures past a threshold
//! open the circuit, and while open both loaders short-circuit with
//! [`CacheError::CircuitOpen`] instead of touching the store or source.
//! After the reset window the circuit closes and counting starts over.
//! Every attempt that fails is retried up to `max_retries` times with a
//! fixed backoff between attempts.
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//! use cachefront::plugin::ResiliencePlugin;
//!
//! // 2 retries, 50ms apart; open after 5 straight failures; retry the
//! // circuit after 10s.
//! let plugin = ResiliencePlugin::new(2, Duration::from_millis(50), 5, Duration::from_secs(10));
//! # drop(plugin);
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::context::Context;
use crate::error::CacheError;
use crate::loader::{cache_loader, source_loader, CacheLoader, SourceLoader};
use crate::plugin::Plugin;

#[derive(Default)]
struct CircuitState {
    failures: u32,
    opened_at: Option<Instant>,
}

struct Shared {
    max_retries: u32,
    backoff: Duration,
    fail_threshold: u32,
    reset_after: Duration,
    circuits: DashMap<String, CircuitState>,
}

impl Shared {
    /// Whether the circuit for `key` is currently open. Closes an open
    /// circuit whose reset window has elapsed.
    fn circuit_open(&self, key: &str) -> bool {
        let Some(mut state) = self.circuits.get_mut(key) else {
            return false;
        };
        match state.opened_at {
            Some(opened) if opened.elapsed() >= self.reset_after => {
                state.opened_at = None;
                state.failures = 0;
                false
            },
            Some(_) => true,
            None => false,
        }
    }

    fn record_failure(&self, key: &str) {
        let mut state = self.circuits.entry(key.to_string()).or_default();
        state.failures += 1;
        if state.failures >= self.fail_threshold {
            state.opened_at = Some(Instant::now());
        }
    }

    fn record_success(&self, key: &str) {
        if let Some(mut state) = self.circuits.get_mut(key) {
            state.failures = 0;
            state.opened_at = None;
        }
    }
}

/// Plugin adding per-key retry and circuit breaking to both loaders.
#[derive(Clone)]
pub struct ResiliencePlugin {
    shared: Arc<Shared>,
}

impl ResiliencePlugin {
    /// Creates a plugin with the given retry and breaker parameters.
    pub fn new(
        max_retries: u32,
        backoff: Duration,
        fail_threshold: u32,
        reset_after: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                max_retries,
                backoff,
                fail_threshold: fail_threshold.max(1),
                reset_after,
                circuits: DashMap::new(),
            }),
        }
    }

    /// Whether the circuit for `key` is open right now. Advisory.
    pub fn is_open(&self, key: &str) -> bool {
        self.shared.circuit_open(key)
    }
}

#[async_trait]
impl Plugin for ResiliencePlugin {
    async fn intercept_source(
        &self,
        _ctx: &Context,
        _key: &str,
        next: SourceLoader,
    ) -> Result<(SourceLoader, bool), CacheError> {
        let shared = Arc::clone(&self.shared);
        let wrapped = source_loader(move |ctx, key, ttl| {
            let shared = Arc::clone(&shared);
            let next = next.clone();
            async move {
                if shared.circuit_open(&key) {
                    return Err(CacheError::CircuitOpen);
                }
                let mut last_err = CacheError::CircuitOpen;
                for attempt in 0..=shared.max_retries {
                    if attempt > 0 {
                        tokio::time::sleep(shared.backoff).await;
                    }
                    match next(ctx.clone(), key.clone(), ttl).await {
                        Ok(value) => {
                            shared.record_success(&key);
                            return Ok(value);
                        },
                        Err(err) => last_err = err,
                    }
                }
                shared.record_failure(&key);
                Err(last_err)
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
        let shared = Arc::clone(&self.shared);
        let wrapped = cache_loader(move |ctx, key| {
            let shared = Arc::clone(&shared);
            let next = next.clone();
            async move {
                if shared.circuit_open(&key) {
                    return Err(CacheError::CircuitOpen);
                }
                let mut last_err = CacheError::CircuitOpen;
                for attempt in 0..=shared.max_retries {
                    if attempt > 0 {
                        tokio::time::sleep(shared.backoff).await;
                    }
                    match next(ctx.clone(), key.clone()).await {
                        Ok(loaded) => {
                            shared.record_success(&key);
                            return Ok(loaded);
                        },
                        Err(err) => last_err = err,
                    }
                }
                shared.record_failure(&key);
                Err(last_err)
            }
        });
        Ok((wrapped, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::loader::ErasedValue;
    use crate::ttl::Ttl;

    fn failing_source(calls: Arc<AtomicUsize>) -> SourceLoader {
        source_loader(move |_ctx, _key, _ttl| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(CacheError::source("down"))
            }
        })
    }

    #[tokio::test]
    async fn retries_then_reports_last_error() {
        let plugin = ResiliencePlugin::new(
            2,
            Duration::from_millis(1),
            100,
            Duration::from_secs(60),
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let (loader, proceed) = plugin
            .intercept_source(&Context::new(), "k", failing_source(Arc::clone(&calls)))
            .await
            .unwrap();
        assert!(proceed);

        let err = loader(Context::new(), "k".into(), Ttl::Keep)
            .await
            .unwrap_err();
        assert!(err.is_source());
        assert_eq!(calls.load(Ordering::SeqCst), 3); // initial + 2 retries
    }

    #[tokio::test]
    async fn circuit_opens_after_threshold_and_resets() {
        let plugin = ResiliencePlugin::new(
            0,
            Duration::ZERO,
            2,
            Duration::from_millis(30),
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let (loader, _) = plugin
            .intercept_source(&Context::new(), "k", failing_source(Arc::clone(&calls)))
            .await
            .unwrap();

        // Two failing rounds trip the breaker.
        for _ in 0..2 {
            assert!(loader(Context::new(), "k".into(), Ttl::Keep).await.is_err());
        }
        let err = loader(Context::new(), "k".into(), Ttl::Keep)
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::CircuitOpen));
        assert_eq!(calls.load(Ordering::SeqCst), 2); // short-circuited

        // After the reset window the loader runs again.
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(loader(Context::new(), "k".into(), Ttl::Keep).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn success_resets_the_failure_count() {
        let plugin = ResiliencePlugin::new(
            0,
            Duration::ZERO,
            2,
            Duration::from_secs(60),
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let outcomes = Arc::new(AtomicUsize::new(0));
        let loader_calls = Arc::clone(&calls);
        let loader_outcomes = Arc::clone(&outcomes);
        let flaky = source_loader(move |_ctx, _key, _ttl| {
            let calls = Arc::clone(&loader_calls);
            let outcomes = Arc::clone(&loader_outcomes);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                // fail, succeed, fail, succeed, ...
                if outcomes.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                    Err(CacheError::source("down"))
                } else {
                    Ok(Arc::new(1_u8) as ErasedValue)
                }
            }
        });
        let (loader, _) = plugin
            .intercept_source(&Context::new(), "k", flaky)
            .await
            .unwrap();

        for round in 0..6 {
            let result = loader(Context::new(), "k".into(), Ttl::Keep).await;
            assert_eq!(result.is_err(), round % 2 == 0);
        }
        // Breaker never opened: every call reached the loader.
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }
}
