//! Redis-backed stores (string keys and hash fields).
//!
//! Both adapters are serializing stores (`is_direct` = false): payloads are
//! the controller's JSON-encoded boxed records. Expiry follows the wire
//! convention in [`crate::ttl`]: sub-second durations travel as `PX`
//! milliseconds, whole seconds as `EX` seconds, and [`Ttl::Keep`] sets no
//! expiry at all.
//!
//! [`RedisHashStore`] scopes every operation to one `(key, field)` pair of
//! a redis hash and ignores the controller's cache key. It exists for the
//! context-override path: bind one per request and attach it with
//! [`RedisHashStore::bind`]. Redis cannot expire individual hash fields, so
//! a TTL applies to the whole outer key.

use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::context::Context;
use crate::error::CacheError;
use crate::store::traits::{Payload, Store};
use crate::ttl::{format_ms, format_secs, use_precise, Ttl};

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Transport(err.to_string())
    }
}

/// Store over plain redis string keys.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connects a store through the client's connection manager.
    pub async fn connect(client: &redis::Client) -> Result<Self, CacheError> {
        Ok(Self {
            conn: client.get_connection_manager().await?,
        })
    }

    /// Wraps an existing connection manager.
    pub fn with_manager(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

fn apply_expiry(cmd: &mut redis::Cmd, ttl: Ttl) {
    if let Ttl::After(dur) = ttl {
        if use_precise(dur) {
            cmd.arg("PX").arg(format_ms(dur));
        } else {
            cmd.arg("EX").arg(format_secs(dur));
        }
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, _ctx: &Context, key: &str) -> Result<Payload, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        match value {
            Some(text) => Ok(Payload::Text(text)),
            None => Err(CacheError::KeyMissing),
        }
    }

    async fn set(
        &self,
        _ctx: &Context,
        key: &str,
        payload: Payload,
        ttl: Ttl,
    ) -> Result<(), CacheError> {
        let text = payload.into_text()?;
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(text);
        apply_expiry(&mut cmd, ttl);
        cmd.query_async::<()>(&mut conn).await?;
        Ok(())
    }

    async fn del(&self, _ctx: &Context, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL").arg(key).query_async::<()>(&mut conn).await?;
        Ok(())
    }

    fn is_direct(&self) -> bool {
        false
    }
}

/// Store over one field of a redis hash.
///
/// The outer key and field are fixed at construction; the cache key passed
/// by the controller is ignored. This is the per-request store meant to be
/// attached through the context override.
#[derive(Clone)]
pub struct RedisHashStore {
    conn: ConnectionManager,
    redis_key: String,
    hash_key: String,
}

impl RedisHashStore {
    /// Creates a store scoped to `redis_key`/`hash_key`.
    ///
    /// # Panics
    ///
    /// Panics if either key is empty — an empty key silently targets the
    /// wrong hash, so misconfiguration fails at construction.
    pub fn new(
        conn: ConnectionManager,
        redis_key: impl Into<String>,
        hash_key: impl Into<String>,
    ) -> Self {
        let redis_key = redis_key.into();
        let hash_key = hash_key.into();
        if redis_key.is_empty() || hash_key.is_empty() {
            panic!("redis key or hash key is empty");
        }
        Self {
            conn,
            redis_key,
            hash_key,
        }
    }

    /// Attaches this store to a request context as its store override.
    pub fn bind(&self, ctx: &Context) -> Context {
        ctx.clone().with_store(Arc::new(self.clone()))
    }

    /// Removes the entire hash this store writes into.
    pub async fn del_all(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(&self.redis_key)
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Store for RedisHashStore {
    async fn get(&self, _ctx: &Context, _key: &str) -> Result<Payload, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("HGET")
            .arg(&self.redis_key)
            .arg(&self.hash_key)
            .query_async(&mut conn)
            .await?;
        match value {
            Some(text) => Ok(Payload::Text(text)),
            None => Err(CacheError::KeyMissing),
        }
    }

    async fn set(
        &self,
        _ctx: &Context,
        _key: &str,
        payload: Payload,
        ttl: Ttl,
    ) -> Result<(), CacheError> {
        let text = payload.into_text()?;
        let mut conn = self.conn.clone();
        redis::cmd("HSET")
            .arg(&self.redis_key)
            .arg(&self.hash_key)
            .arg(text)
            .query_async::<()>(&mut conn)
            .await?;

        // Hash fields cannot carry their own expiry; the TTL applies to the
        // whole outer key. Failures here are not fatal to the write.
        if let Ttl::After(dur) = ttl {
            let expire = if use_precise(dur) {
                redis::cmd("PEXPIRE")
                    .arg(&self.redis_key)
                    .arg(format_ms(dur))
                    .query_async::<()>(&mut conn)
                    .await
            } else {
                redis::cmd("EXPIRE")
                    .arg(&self.redis_key)
                    .arg(format_secs(dur))
                    .query_async::<()>(&mut conn)
                    .await
            };
            if let Err(err) = expire {
                tracing::warn!(
                    redis_key = %self.redis_key,
                    error = %err,
                    "failed to set hash expiry"
                );
            }
        }
        Ok(())
    }

    async fn del(&self, _ctx: &Context, _key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("HDEL")
            .arg(&self.redis_key)
            .arg(&self.hash_key)
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    fn is_direct(&self) -> bool {
        false
    }
}
