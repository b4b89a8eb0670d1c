//! Keyed coalescing of concurrent identical calls.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                      SingleflightGroup<V>                          │
//! │                                                                    │
//! │   run("k", work₁) ──► no entry: spawn work₁ as a detached task     │
//! │                       register Shared handle under "k"            │
//! │                              │                                     │
//! │   run("k", work₂) ──► entry found: await the same Shared handle    │
//! │   run("k", work₃) ──► entry found: await the same Shared handle    │
//! │                              │                                     │
//! │                       work₁ completes:                             │
//! │                         1. entry removed                           │
//! │                         2. identical Result delivered to all       │
//! │                                                                    │
//! │   run("k", work₄) ──► no entry again: work₄ executes               │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Concepts
//!
//! - **One execution per flight**: while a call for a key is in flight,
//!   joiners never run their own closure; they receive a clone of the
//!   leader's result.
//! - **No caching across completions**: the entry is removed when the work
//!   completes, before delivery, so a later call re-executes.
//! - **Cancellation isolation**: the work runs as a detached task. A waiter
//!   dropping its future abandons only its own delivery.
//! - **Panic hygiene**: a panicking work future clears the entry and every
//!   waiter observes an error instead of hanging.
//!
//! ## Example Usage
//!
//! ```
//! # async fn demo() -> Result<(), cachefront::error::CacheError> {
//! use cachefront::ds::SingleflightGroup;
//!
//! let group: SingleflightGroup<u64> = SingleflightGroup::new();
//! let value = group.run("answer", async { Ok(42) }).await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::oneshot;

use crate::error::CacheError;

type FlightResult<V> = Result<V, CacheError>;
type SharedFlight<V> = Shared<BoxFuture<'static, FlightResult<V>>>;
type CallMap<V> = Arc<Mutex<FxHashMap<String, SharedFlight<V>>>>;

/// Deduplicates concurrent calls sharing a key.
///
/// `V` is the value delivered to every caller of a flight; it must be
/// cloneable since each waiter receives its own copy of the same result.
pub struct SingleflightGroup<V> {
    calls: CallMap<V>,
}

/// Removes the flight entry when dropped, so the entry is cleared both on
/// normal completion and on a panicking work future.
struct FlightGuard<V> {
    calls: CallMap<V>,
    key: String,
}

impl<V> Drop for FlightGuard<V> {
    fn drop(&mut self) {
        self.calls.lock().remove(&self.key);
    }
}

impl<V> Default for SingleflightGroup<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> SingleflightGroup<V> {
    /// Creates an empty group.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    /// Number of flights currently executing. Advisory.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

impl<V> SingleflightGroup<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Runs `work` unless a call for `key` is already in flight, in which
    /// case the in-flight result is awaited and returned instead.
    ///
    /// The first caller spawns `work` as a detached task; it runs to
    /// completion even if every waiter is cancelled.
    pub async fn run<F>(&self, key: &str, work: F) -> FlightResult<V>
    where
        F: Future<Output = FlightResult<V>> + Send + 'static,
    {
        let flight = {
            let mut calls = self.calls.lock();
            match calls.get(key) {
                Some(existing) => existing.clone(),
                None => {
                    let flight = launch(Arc::clone(&self.calls), key.to_string(), work);
                    calls.insert(key.to_string(), flight.clone());
                    flight
                },
            }
        };
        flight.await
    }
}

fn launch<V, F>(calls: CallMap<V>, key: String, work: F) -> SharedFlight<V>
where
    V: Clone + Send + Sync + 'static,
    F: Future<Output = FlightResult<V>> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let guard = FlightGuard { calls, key };

    tokio::spawn(async move {
        let result = work.await;
        // Clear the entry before delivery: a waiter that observes this
        // result and immediately re-calls must start a fresh flight.
        drop(guard);
        let _ = tx.send(result);
    });

    async move {
        match rx.await {
            Ok(result) => result,
            // The work task died without delivering (panicked).
            Err(_) => Err(CacheError::Transport("in-flight call aborted".into())),
        }
    }
    .boxed()
    .shared()
}
