//! One-shot entry points backed by a process-wide controller registry.
//!
//! Callers that don't want to construct a [`Controller`] can go through
//! these functions: the first use of a name lazily creates a controller
//! with the matching policy, later uses reuse it. A name binds to exactly
//! one value type — looking it up with a different type is an error for
//! that call, never a silent reconstruction or a cast.
//!
//! The explicit [`Controller`] path is primary; prefer it anywhere you can
//! hold on to the controller. The registry exists for call sites too far
//! from construction to share one.
//!
//! ## Example Usage
//!
//! ```
//! # async fn demo() -> Result<(), cachefront::error::CacheError> {
//! use std::sync::Arc;
//! use cachefront::context::Context;
//! use cachefront::registry;
//! use cachefront::store::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let value: u64 = registry::wrap(
//!     &Context::new(),
//!     "user-names",
//!     store,
//!     "user:1",
//!     |_ctx| async { Ok(7) },
//! )
//! .await?;
//! assert_eq!(value, 7);
//! # Ok(())
//! # }
//! ```

use std::any::Any;
use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::context::Context;
use crate::controller::Controller;
use crate::error::CacheError;
use crate::policy::{EasyPolicy, FirstPolicy, ReusePolicy};
use crate::store::Store;
use crate::value::CacheValue;

/// Default business expiry for [`wrap_reuse`].
const DEFAULT_REUSE_EXPIRE: Duration = Duration::from_secs(30);
/// Default business expiry for [`wrap_first`].
const DEFAULT_FIRST_EXPIRE: Duration = Duration::from_secs(60);

static CONTROLLERS: LazyLock<DashMap<String, Arc<dyn Any + Send + Sync>>> =
    LazyLock::new(DashMap::new);

/// Fetches the controller registered under `name`, creating it with `make`
/// on first use.
fn controller_for<T, F>(name: &str, make: F) -> Result<Arc<Controller<T>>, CacheError>
where
    T: CacheValue + Serialize + DeserializeOwned,
    F: FnOnce() -> Controller<T>,
{
    let stored = match CONTROLLERS.get(name) {
        Some(existing) => Arc::clone(existing.value()),
        None => {
            let entry = CONTROLLERS
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(make()) as Arc<dyn Any + Send + Sync>);
            Arc::clone(entry.value())
        },
    };
    stored.downcast::<Controller<T>>().map_err(|_| {
        CacheError::Unpacking(format!(
            "controller {name:?} is registered with a different value type"
        ))
    })
}

/// Strict lookup through the registry (15s store TTL).
pub async fn wrap<T, Q, F>(
    ctx: &Context,
    name: &str,
    store: Arc<dyn Store>,
    key: &str,
    query: Q,
) -> Result<T, CacheError>
where
    T: CacheValue + Serialize + DeserializeOwned,
    Q: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Result<T, CacheError>> + Send + 'static,
{
    let controller = controller_for(name, || Controller::new(name, store))?;
    controller.wrap(ctx, key, query).await
}

/// Stale-on-error lookup through the registry (30s business expiry).
pub async fn wrap_reuse<T, Q, F>(
    ctx: &Context,
    name: &str,
    store: Arc<dyn Store>,
    key: &str,
    query: Q,
) -> Result<T, CacheError>
where
    T: CacheValue + Serialize + DeserializeOwned,
    Q: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Result<T, CacheError>> + Send + 'static,
{
    let controller = controller_for(name, || {
        Controller::<T>::builder(name, store)
            .policy(ReusePolicy::new(DEFAULT_REUSE_EXPIRE))
            .build()
    })?;
    controller.wrap(ctx, key, query).await
}

/// Stale-always lookup through the registry (60s business expiry).
pub async fn wrap_first<T, Q, F>(
    ctx: &Context,
    name: &str,
    store: Arc<dyn Store>,
    key: &str,
    query: Q,
) -> Result<T, CacheError>
where
    T: CacheValue + Serialize + DeserializeOwned,
    Q: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Result<T, CacheError>> + Send + 'static,
{
    let controller = controller_for(name, || {
        Controller::<T>::builder(name, store)
            .policy(FirstPolicy::new(DEFAULT_FIRST_EXPIRE))
            .build()
    })?;
    controller.wrap(ctx, key, query).await
}

/// Strict lookup with an explicit TTL; the controller name is derived from
/// the value type.
///
/// All calls sharing a value type share one controller, so the TTL of the
/// first call wins for the lifetime of the process.
pub async fn wrap_with_ttl<T, Q, F>(
    ctx: &Context,
    store: Arc<dyn Store>,
    key: &str,
    ttl: Duration,
    query: Q,
) -> Result<T, CacheError>
where
    T: CacheValue + Serialize + DeserializeOwned,
    Q: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Result<T, CacheError>> + Send + 'static,
{
    let name = format!("cachefront-easy-default-{}", std::any::type_name::<T>());
    let controller = controller_for(&name, || {
        Controller::<T>::builder(name.clone(), store)
            .policy(EasyPolicy::new(ttl))
            .build()
    })?;
    controller.wrap(ctx, key, query).await
}

/// Stale-on-error lookup with an explicit business expiry; the controller
/// name is derived from the value type (first expiry wins).
pub async fn wrap_reuse_with_ttl<T, Q, F>(
    ctx: &Context,
    store: Arc<dyn Store>,
    key: &str,
    expire: Duration,
    query: Q,
) -> Result<T, CacheError>
where
    T: CacheValue + Serialize + DeserializeOwned,
    Q: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Result<T, CacheError>> + Send + 'static,
{
    let name = format!("cachefront-reuse-default-{}", std::any::type_name::<T>());
    let controller = controller_for(&name, || {
        Controller::<T>::builder(name.clone(), store)
            .policy(ReusePolicy::new(expire))
            .build()
    })?;
    controller.wrap(ctx, key, query).await
}

/// Stale-always lookup with an explicit business expiry; the controller
/// name is derived from the value type (first expiry wins).
pub async fn wrap_first_with_ttl<T, Q, F>(
    ctx: &Context,
    store: Arc<dyn Store>,
    key: &str,
    expire: Duration,
    query: Q,
) -> Result<T, CacheError>
where
    T: CacheValue + Serialize + DeserializeOwned,
    Q: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Result<T, CacheError>> + Send + 'static,
{
    let name = format!("cachefront-first-default-{}", std::any::type_name::<T>());
    let controller = controller_for(&name, || {
        Controller::<T>::builder(name.clone(), store)
            .policy(FirstPolicy::new(expire))
            .build()
    })?;
    controller.wrap(ctx, key, query).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn name_binds_to_one_value_type() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let ctx = Context::new();

        let value: u64 = wrap(
            &ctx,
            "registry-collision",
            Arc::clone(&store),
            "k",
            |_ctx| async { Ok(1) },
        )
        .await
        .unwrap();
        assert_eq!(value, 1);

        // Same name, different value type: loud failure, no reconstruction.
        let err = wrap::<String, _, _>(&ctx, "registry-collision", store, "k", |_ctx| async {
            Ok("x".to_string())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, CacheError::Unpacking(_)));
    }

    #[tokio::test]
    async fn names_are_created_once() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let ctx = Context::new();

        for expected in [5_u64, 5, 5] {
            let value: u64 = wrap_reuse(
                &ctx,
                "registry-once",
                Arc::clone(&store),
                "k",
                |_ctx| async { Ok(5) },
            )
            .await
            .unwrap();
            assert_eq!(value, expected);
        }
        assert!(CONTROLLERS.contains_key("registry-once"));
    }
}
