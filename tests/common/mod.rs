//! Test doubles shared by the integration suites: a serializing in-memory
//! store and a hash-field store for the context-override scenarios.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::Mutex;

use cachefront::context::Context;
use cachefront::error::CacheError;
use cachefront::store::{Payload, Store};
use cachefront::ttl::Ttl;

/// Non-direct in-memory store: holds serialized text payloads, so the
/// controller exercises the JSON codec exactly as it would against a
/// remote store.
#[derive(Default)]
pub struct JsonStore {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
}

impl JsonStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for JsonStore {
    async fn get(&self, _ctx: &Context, key: &str) -> Result<Payload, CacheError> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((_, Some(expires_at))) if *expires_at <= Instant::now() => {},
            Some((text, _)) => return Ok(Payload::Text(text.clone())),
            None => return Err(CacheError::KeyMissing),
        }
        entries.remove(key);
        Err(CacheError::KeyMissing)
    }

    async fn set(
        &self,
        _ctx: &Context,
        key: &str,
        payload: Payload,
        ttl: Ttl,
    ) -> Result<(), CacheError> {
        let text = payload.into_text()?;
        let expires_at = match ttl {
            Ttl::Keep => None,
            Ttl::After(dur) => Some(Instant::now() + dur),
        };
        self.entries
            .lock()
            .insert(key.to_string(), (text, expires_at));
        Ok(())
    }

    async fn del(&self, _ctx: &Context, key: &str) -> Result<(), CacheError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn is_direct(&self) -> bool {
        false
    }
}

/// The shared "outer hash" a group of [`HashFieldStore`]s writes into.
#[derive(Clone, Default)]
pub struct HashTable {
    fields: Arc<Mutex<HashMap<String, String>>>,
}

impl HashTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.lock().len()
    }
}

/// Non-direct store scoped to one field of a [`HashTable`]. Mirrors a
/// remote hash-field store: the controller's cache key is ignored and every
/// operation targets the fixed field. Attach one per request through the
/// context override.
pub struct HashFieldStore {
    table: HashTable,
    field: String,
}

impl HashFieldStore {
    pub fn new(table: HashTable, field: impl Into<String>) -> Self {
        Self {
            table,
            field: field.into(),
        }
    }

    /// Attaches this store to a request context as its store override.
    pub fn bind(table: &HashTable, field: impl Into<String>, ctx: &Context) -> Context {
        ctx.clone()
            .with_store(Arc::new(Self::new(table.clone(), field)))
    }
}

#[async_trait]
impl Store for HashFieldStore {
    async fn get(&self, _ctx: &Context, _key: &str) -> Result<Payload, CacheError> {
        self.table
            .fields
            .lock()
            .get(&self.field)
            .map(|text| Payload::Text(text.clone()))
            .ok_or(CacheError::KeyMissing)
    }

    async fn set(
        &self,
        _ctx: &Context,
        _key: &str,
        payload: Payload,
        _ttl: Ttl,
    ) -> Result<(), CacheError> {
        let text = payload.into_text()?;
        self.table.fields.lock().insert(self.field.clone(), text);
        Ok(())
    }

    async fn del(&self, _ctx: &Context, _key: &str) -> Result<(), CacheError> {
        self.table.fields.lock().remove(&self.field);
        Ok(())
    }

    fn is_direct(&self) -> bool {
        false
    }
}
