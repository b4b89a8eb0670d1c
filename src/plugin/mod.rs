//! Access-control plugins intercepting the loader closures.
//!
//! Before handing the loaders to the policy, the controller threads each of
//! them through its plugin chain in declaration order. A plugin may return
//! a replacement loader (wrapping or substituting the one it was given),
//! may stop the rest of the chain by returning `false`, or may abort the
//! whole `wrap` call with an error.
//!
//! ```text
//!   raw loader ──► plugin₁ ──► plugin₂ ──► … ──► policy
//!                    │            │
//!                    │            └─ (loader₂, false): chain frozen here
//!                    └─ Err(_): wrap aborts
//! ```
//!
//! Both hooks default to passing the loader through untouched, so a plugin
//! only overrides the side it cares about.

use async_trait::async_trait;

use crate::context::Context;
use crate::error::CacheError;
use crate::loader::{CacheLoader, SourceLoader};

#[cfg(feature = "metrics")]
pub mod metrics;
#[cfg(feature = "rate-limit")]
pub mod rate_limit;
pub mod resilience;

#[cfg(feature = "metrics")]
pub use metrics::{MetricsPlugin, MetricsSnapshot};
#[cfg(feature = "rate-limit")]
pub use rate_limit::RateLimitPlugin;
pub use resilience::ResiliencePlugin;

/// Intercepts loader construction ahead of every policy invocation.
///
/// Returned tuples are `(loader, continue)`: the loader the controller uses
/// from this plugin onward, and whether the remaining chain still runs.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Intercepts the source-side loader.
    async fn intercept_source(
        &self,
        _ctx: &Context,
        _key: &str,
        next: SourceLoader,
    ) -> Result<(SourceLoader, bool), CacheError> {
        Ok((next, true))
    }

    /// Intercepts the cache-side loader.
    async fn intercept_cache(
        &self,
        _ctx: &Context,
        _key: &str,
        next: CacheLoader,
    ) -> Result<(CacheLoader, bool), CacheError> {
        Ok((next, true))
    }
}
