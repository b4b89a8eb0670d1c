//! The stale-on-error policy: long-lived store entries, business expiry in
//! the box timestamp, stale data served when the source is down.
//!
//! - Fresh hit (`now − timestamp < duration`) ⇒ return it.
//! - Expired hit ⇒ remember the stale value, call the source with
//!   [`KEEP_TTL`]. Source success ⇒ new value; source failure ⇒ the
//!   remembered stale value with no error.
//! - Miss or cache error ⇒ source with [`KEEP_TTL`]; its error surfaces.
//!
//! Store entries never expire at the store layer, so stale data stays
//! available for as long as the source keeps failing.

use std::time::Duration;

use async_trait::async_trait;

use crate::boxed::unix_now;
use crate::context::Context;
use crate::ds::SingleflightGroup;
use crate::error::CacheError;
use crate::loader::{CacheLoader, ErasedValue, SourceLoader};
use crate::policy::Policy;
use crate::ttl::KEEP_TTL;

/// Stale-on-error cache-through policy.
pub struct ReusePolicy {
    expire: Duration,
    group: SingleflightGroup<ErasedValue>,
}

impl ReusePolicy {
    /// Creates a policy with the given business expiry.
    pub fn new(expire: Duration) -> Self {
        Self {
            expire,
            group: SingleflightGroup::new(),
        }
    }
}

#[async_trait]
impl Policy for ReusePolicy {
    async fn load(
        &self,
        ctx: Context,
        key: &str,
        cache: CacheLoader,
        source: SourceLoader,
    ) -> Result<ErasedValue, CacheError> {
        let expire_secs = self.expire.as_secs() as i64;
        let flight_key = key.to_string();
        self.group
            .run(key, async move {
                let mut stale = None;
                if let Ok((value, timestamp)) = cache(ctx.clone(), flight_key.clone()).await {
                    if unix_now() - timestamp < expire_secs {
                        return Ok(value);
                    }
                    stale = Some(value);
                }

                match source(ctx, flight_key, KEEP_TTL).await {
                    Ok(value) => Ok(value),
                    // A remembered stale value absorbs the failure.
                    Err(err) => stale.ok_or(err),
                }
            })
            .await
    }
}
