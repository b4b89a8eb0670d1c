//! The controller: boxes values, builds the loader closures, applies the
//! plugin chain, and delegates to its policy.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                         Controller<T>                                 │
//! │                                                                       │
//! │  wrap(ctx, key, query)                                                │
//! │      │                                                                │
//! │      ├─► source loader: query ─► box ─► store.set (errors swallowed)  │
//! │      ├─► cache loader:  store.get ─► unbox ─► (value, timestamp)      │
//! │      │          │                                                     │
//! │      │   plugin chain (declaration order, may replace / freeze)       │
//! │      │          │                                                     │
//! │      └─► policy.load(ctx, key, cache, source)                         │
//! │                 │                                                     │
//! │            downcast to T ──► caller                                   │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A controller is identified by `(name, value type)`. The store consulted
//! for any single call is the context override when present, the
//! controller's default otherwise.
//!
//! ## Example Usage
//!
//! ```
//! # async fn demo() -> Result<(), cachefront::error::CacheError> {
//! use std::sync::Arc;
//! use std::time::Duration;
//! use cachefront::context::Context;
//! use cachefront::controller::Controller;
//! use cachefront::policy::ReusePolicy;
//! use cachefront::store::MemoryStore;
//!
//! let controller: Controller<u64> = Controller::builder("prices", Arc::new(MemoryStore::new()))
//!     .policy(ReusePolicy::new(Duration::from_secs(30)))
//!     .build();
//!
//! let price = controller
//!     .wrap(&Context::new(), "sku-1", |_ctx| async { Ok(199) })
//!     .await?;
//! assert_eq!(price, 199);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::boxed::Boxed;
use crate::context::Context;
use crate::error::CacheError;
use crate::loader::{CacheLoader, ErasedValue, SourceLoader};
use crate::plugin::Plugin;
use crate::policy::{EasyPolicy, Policy};
use crate::store::{Payload, Store};
use crate::ttl::Ttl;
use crate::value::CacheValue;

/// Store-layer TTL used by [`Controller::new`]'s default policy.
const DEFAULT_EASY_TTL: Duration = Duration::from_secs(15);

/// Drives the cache-through protocol for one `(name, value type)` pair.
pub struct Controller<T> {
    name: Arc<str>,
    store: Arc<dyn Store>,
    plugins: Arc<[Arc<dyn Plugin>]>,
    policy: Arc<dyn Policy>,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for Controller<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            store: Arc::clone(&self.store),
            plugins: Arc::clone(&self.plugins),
            policy: Arc::clone(&self.policy),
            _value: PhantomData,
        }
    }
}

/// Builds a [`Controller`] with a custom policy and plugins.
pub struct ControllerBuilder<T> {
    name: String,
    store: Arc<dyn Store>,
    plugins: Vec<Arc<dyn Plugin>>,
    policy: Arc<dyn Policy>,
    _value: PhantomData<T>,
}

impl<T> ControllerBuilder<T>
where
    T: CacheValue,
{
    /// Replaces the policy (default: [`EasyPolicy`] with a 15s TTL).
    pub fn policy(mut self, policy: impl Policy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Appends a plugin. Plugins intercept loaders in the order added.
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Finishes construction.
    pub fn build(self) -> Controller<T> {
        Controller {
            name: Arc::from(self.name),
            store: self.store,
            plugins: self.plugins.into(),
            policy: self.policy,
            _value: PhantomData,
        }
    }
}

impl<T> Controller<T>
where
    T: CacheValue + Serialize + DeserializeOwned,
{
    /// Creates a controller with the default strict policy (15s TTL).
    pub fn new(name: impl Into<String>, store: Arc<dyn Store>) -> Self {
        Self::builder(name, store).build()
    }

    /// Starts building a controller.
    pub fn builder(name: impl Into<String>, store: Arc<dyn Store>) -> ControllerBuilder<T> {
        ControllerBuilder {
            name: name.into(),
            store,
            plugins: Vec::new(),
            policy: Arc::new(EasyPolicy::new(DEFAULT_EASY_TTL)),
            _value: PhantomData,
        }
    }

    /// This controller's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Boxes and writes a value without consulting the policy.
    ///
    /// Meant for warmers and refreshers that already hold fresh data.
    pub async fn set_store(
        &self,
        ctx: &Context,
        key: &str,
        value: T,
        ttl: Ttl,
    ) -> Result<(), CacheError> {
        write_through(&self.store, ctx, key, value, ttl).await
    }

    /// Reads and unboxes a value without consulting the policy.
    ///
    /// Returns the value together with its box timestamp (seconds since
    /// epoch at write time).
    pub async fn get_store(&self, ctx: &Context, key: &str) -> Result<(T, i64), CacheError> {
        read_through(&self.store, ctx, &self.name, key).await
    }

    /// Best-effort removal of a key from the resolved store.
    pub async fn delete(&self, ctx: &Context, key: &str) -> Result<(), CacheError> {
        resolve_store(&self.store, ctx).del(ctx, key).await
    }

    /// The main entry point: resolves `key` through this controller's
    /// policy, calling `query` for at most one source load.
    ///
    /// `query` receives the request context; it may be invoked from a
    /// detached background refresh, after the calling task has returned.
    pub async fn wrap<Q, F>(&self, ctx: &Context, key: &str, query: Q) -> Result<T, CacheError>
    where
        Q: Fn(Context) -> F + Send + Sync + 'static,
        F: Future<Output = Result<T, CacheError>> + Send + 'static,
    {
        let mut source = self.raw_source_loader(query);
        for plugin in self.plugins.iter() {
            let (next, proceed) = plugin.intercept_source(ctx, key, source).await?;
            source = next;
            if !proceed {
                break;
            }
        }

        let mut cache = self.raw_cache_loader();
        for plugin in self.plugins.iter() {
            let (next, proceed) = plugin.intercept_cache(ctx, key, cache).await?;
            cache = next;
            if !proceed {
                break;
            }
        }

        let result = self.policy.load(ctx.clone(), key, cache, source).await?;
        match result.downcast::<T>() {
            Ok(value) => Ok((*value).clone()),
            Err(_) => {
                tracing::error!(
                    name = %self.name,
                    key = %key,
                    trace_id = ?ctx.trace_id(),
                    "policy result does not match controller value type"
                );
                Err(CacheError::Unpacking(
                    "policy result does not match controller value type".into(),
                ))
            },
        }
    }

    /// The cache-side loader before plugins: read, unbox, nil-screen.
    fn raw_cache_loader(&self) -> CacheLoader {
        let store = Arc::clone(&self.store);
        let name = Arc::clone(&self.name);
        Arc::new(move |ctx: Context, key: String| {
            let store = Arc::clone(&store);
            let name = Arc::clone(&name);
            async move {
                let (value, timestamp) = read_through::<T>(&store, &ctx, &name, &key).await?;
                if timestamp == 0 {
                    // Reserved for "never written"; treat the record as
                    // absent rather than serving it.
                    return Err(CacheError::KeyMissing);
                }
                if value.is_nil() {
                    return Err(CacheError::Nil);
                }
                Ok((Arc::new(value) as ErasedValue, timestamp))
            }
            .boxed()
        })
    }

    /// The source-side loader before plugins: query, write-back,
    /// nil-screen. Cache-write failures are logged and swallowed — a fresh
    /// source value must not be masked by a failing store.
    fn raw_source_loader<Q, F>(&self, query: Q) -> SourceLoader
    where
        Q: Fn(Context) -> F + Send + Sync + 'static,
        F: Future<Output = Result<T, CacheError>> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let name = Arc::clone(&self.name);
        let query = Arc::new(query);
        Arc::new(move |ctx: Context, key: String, ttl: Ttl| {
            let store = Arc::clone(&store);
            let name = Arc::clone(&name);
            let query = Arc::clone(&query);
            async move {
                let value = query(ctx.clone()).await?;
                if let Err(err) = write_through(&store, &ctx, &key, value.clone(), ttl).await {
                    tracing::warn!(
                        name = %name,
                        key = %key,
                        trace_id = ?ctx.trace_id(),
                        error = %err,
                        "cache write failed after source load"
                    );
                }
                if value.is_nil() {
                    return Err(CacheError::Nil);
                }
                Ok(Arc::new(value) as ErasedValue)
            }
            .boxed()
        })
    }
}

fn resolve_store<'a>(default: &'a Arc<dyn Store>, ctx: &'a Context) -> &'a Arc<dyn Store> {
    ctx.store_override().unwrap_or(default)
}

async fn write_through<T>(
    default: &Arc<dyn Store>,
    ctx: &Context,
    key: &str,
    value: T,
    ttl: Ttl,
) -> Result<(), CacheError>
where
    T: CacheValue + Serialize,
{
    let store = resolve_store(default, ctx);
    let boxed = Boxed::now(value);
    if store.is_direct() {
        store.set(ctx, key, Payload::Direct(Arc::new(boxed)), ttl).await
    } else {
        let text = boxed.to_json()?;
        store.set(ctx, key, Payload::Text(text), ttl).await
    }
}

async fn read_through<T>(
    default: &Arc<dyn Store>,
    ctx: &Context,
    name: &str,
    key: &str,
) -> Result<(T, i64), CacheError>
where
    T: CacheValue + DeserializeOwned,
{
    let store = resolve_store(default, ctx);
    let payload = store.get(ctx, key).await?;

    let boxed: Boxed<T> = if store.is_direct() {
        let direct = payload.into_direct()?;
        match direct.downcast::<Boxed<T>>() {
            Ok(shared) => (*shared).clone(),
            Err(_) => {
                tracing::error!(
                    name = %name,
                    key = %key,
                    trace_id = ?ctx.trace_id(),
                    "direct payload does not match controller value type"
                );
                return Err(CacheError::Unpacking(
                    "direct payload does not match controller value type".into(),
                ));
            },
        }
    } else {
        let text = payload.into_text()?;
        match Boxed::from_json(&text) {
            Ok(boxed) => boxed,
            Err(err) => {
                tracing::error!(
                    name = %name,
                    key = %key,
                    trace_id = ?ctx.trace_id(),
                    error = %err,
                    "failed to parse boxed record"
                );
                return Err(err);
            },
        }
    };
    Ok((boxed.value, boxed.timestamp))
}
