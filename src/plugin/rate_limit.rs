//! Source-side rate limiting.
//!
//! Wraps the source loader in a `governor` direct rate limiter: callers
//! wait for a permit before the source runs. The cache side is left
//! untouched — serving hits is exactly what should keep working while the
//! slow source is being protected.
//!
//! ## Example Usage
//!
//! ```
//! use std::num::NonZeroU32;
//! use governor::Quota;
//! use cachefront::plugin::RateLimitPlugin;
//!
//! // At most 50 source loads per second, bursts of 10.
//! let quota = Quota::per_second(NonZeroU32::new(50).unwrap())
//!     .allow_burst(NonZeroU32::new(10).unwrap());
//! let plugin = RateLimitPlugin::new(quota);
//! # drop(plugin);
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use crate::context::Context;
use crate::error::CacheError;
use crate::loader::{source_loader, SourceLoader};
use crate::plugin::Plugin;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Plugin throttling how often the source loader may run.
#[derive(Clone)]
pub struct RateLimitPlugin {
    limiter: Arc<DirectLimiter>,
}

impl RateLimitPlugin {
    /// Creates a plugin enforcing the given quota across all keys.
    pub fn new(quota: Quota) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

#[async_trait]
impl Plugin for RateLimitPlugin {
    async fn intercept_source(
        &self,
        _ctx: &Context,
        _key: &str,
        next: SourceLoader,
    ) -> Result<(SourceLoader, bool), CacheError> {
        let limiter = Arc::clone(&self.limiter);
        let wrapped = source_loader(move |ctx, key, ttl| {
            let limiter = Arc::clone(&limiter);
            let next = next.clone();
            async move {
                limiter.until_ready().await;
                next(ctx, key, ttl).await
            }
        });
        Ok((wrapped, true))
    }
}
