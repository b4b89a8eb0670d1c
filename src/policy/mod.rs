//! Cache-access policies: the state machines deciding when the cache is
//! authoritative, when the source runs, and how failures are absorbed.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                 policy ⇄ loaders ⇄ single-flight                     │
//! │                                                                      │
//! │   wrap(ctx, key) ──► policy.load(ctx, key, cache, source)            │
//! │                             │                                        │
//! │                      single-flight on key                            │
//! │                             │                                        │
//! │              ┌──────────────┴──────────────┐                         │
//! │              ▼                             ▼                         │
//! │        cache loader                  source loader                   │
//! │     (store, timestamp)          (authoritative + write-back)         │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every policy wraps its body in a single-flight group keyed by the cache
//! key, so concurrent callers of the same key observe one execution and
//! share its result. Each policy instance owns fresh coordination state;
//! two controllers never contend with each other.
//!
//! ## Failure Semantics
//!
//! | Situation                          | Easy   | Reuse          | First                 |
//! |------------------------------------|--------|----------------|-----------------------|
//! | cache hit, fresh                   | hit    | hit            | hit                   |
//! | cache hit, expired, source ok      | —      | source         | stale + async refresh |
//! | cache hit, expired, source fails   | —      | stale, no err  | stale, no err         |
//! | cache miss, source ok              | source | source         | source                |
//! | cache miss, source fails           | error  | error          | error                 |
//!
//! (Easy ignores timestamps entirely: any hit is returned as-is.)

use async_trait::async_trait;

use crate::context::Context;
use crate::error::CacheError;
use crate::loader::{CacheLoader, ErasedValue, SourceLoader};

pub mod easy;
pub mod first;
pub mod reuse;

pub use easy::EasyPolicy;
pub use first::FirstPolicy;
pub use reuse::ReusePolicy;

/// One cache-access state machine.
///
/// Implementations receive the two loaders already threaded through the
/// controller's plugin chain and return the type-erased value the
/// controller will downcast.
#[async_trait]
pub trait Policy: Send + Sync {
    /// Resolves `key` to a value via the cache and/or the source.
    async fn load(
        &self,
        ctx: Context,
        key: &str,
        cache: CacheLoader,
        source: SourceLoader,
    ) -> Result<ErasedValue, CacheError>;
}
