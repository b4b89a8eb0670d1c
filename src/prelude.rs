pub use crate::boxed::Boxed;
pub use crate::context::Context;
pub use crate::controller::{Controller, ControllerBuilder};
pub use crate::ds::{key_shard, ShardedMutex, SingleflightGroup};
pub use crate::error::{BoxError, CacheError};
pub use crate::loader::{CacheLoader, ErasedValue, SourceLoader};
pub use crate::plugin::{Plugin, ResiliencePlugin};
pub use crate::policy::{EasyPolicy, FirstPolicy, Policy, ReusePolicy};
pub use crate::registry::{
    wrap, wrap_first, wrap_first_with_ttl, wrap_reuse, wrap_reuse_with_ttl, wrap_with_ttl,
};
pub use crate::store::{MemoryStore, Payload, Store};
pub use crate::ttl::{Ttl, KEEP_TTL};
pub use crate::value::CacheValue;

#[cfg(feature = "metrics")]
pub use crate::plugin::{MetricsPlugin, MetricsSnapshot};
#[cfg(feature = "rate-limit")]
pub use crate::plugin::RateLimitPlugin;
#[cfg(feature = "redis")]
pub use crate::store::{RedisHashStore, RedisStore};
