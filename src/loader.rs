//! Type-erased loader closures handed from the controller to a policy.
//!
//! The controller is generic over its value type; everything downstream
//! (plugins, policies, single-flight) is not. Values travel as
//! [`ErasedValue`] and the controller downcasts after the policy returns.
//! Both loader shapes are `Arc`ed so a plugin can wrap one and a policy can
//! move one into a detached refresh task.
//!
//! - [`CacheLoader`]: `(ctx, key) → (value, timestamp)` — reads the store.
//! - [`SourceLoader`]: `(ctx, key, ttl) → value` — calls the authoritative
//!   source and writes the store.
//!
//! [`cache_loader`] and [`source_loader`] lift plain async closures into
//! these shapes; plugins use them to build replacements:
//!
//! ```
//! use cachefront::loader::{source_loader, SourceLoader};
//!
//! fn logged(next: SourceLoader) -> SourceLoader {
//!     source_loader(move |ctx, key, ttl| {
//!         let next = next.clone();
//!         async move {
//!             tracing::debug!(%key, "loading from source");
//!             next(ctx, key, ttl).await
//!         }
//!     })
//! }
//! ```

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::context::Context;
use crate::error::CacheError;
use crate::ttl::Ttl;

/// A type-erased cached value.
pub type ErasedValue = Arc<dyn Any + Send + Sync>;

/// Loads `(value, timestamp)` from the cache side.
pub type CacheLoader = Arc<
    dyn Fn(Context, String) -> BoxFuture<'static, Result<(ErasedValue, i64), CacheError>>
        + Send
        + Sync,
>;

/// Loads a value from the authoritative source, writing the cache with the
/// given TTL on success.
pub type SourceLoader =
    Arc<dyn Fn(Context, String, Ttl) -> BoxFuture<'static, Result<ErasedValue, CacheError>> + Send + Sync>;

/// Lifts an async closure into a [`CacheLoader`].
pub fn cache_loader<F, Fut>(f: F) -> CacheLoader
where
    F: Fn(Context, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(ErasedValue, i64), CacheError>> + Send + 'static,
{
    Arc::new(move |ctx, key| f(ctx, key).boxed())
}

/// Lifts an async closure into a [`SourceLoader`].
pub fn source_loader<F, Fut>(f: F) -> SourceLoader
where
    F: Fn(Context, String, Ttl) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ErasedValue, CacheError>> + Send + 'static,
{
    Arc::new(move |ctx, key, ttl| f(ctx, key, ttl).boxed())
}
