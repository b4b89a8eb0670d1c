//! Per-request context: store override, trace id, and deadline.
//!
//! The controller consults the context before its own default store, which
//! enables per-request routing (for example to a hash-field-scoped store)
//! without touching the controller or its key space. The trace id rides
//! along into every log event the library emits.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use cachefront::context::Context;
//! use cachefront::store::MemoryStore;
//!
//! let ctx = Context::new()
//!     .with_trace_id("req-42")
//!     .with_store(Arc::new(MemoryStore::new()));
//!
//! assert_eq!(ctx.trace_id(), Some("req-42"));
//! assert!(ctx.store_override().is_some());
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::store::Store;

/// Cheap-to-clone request context threaded through every operation.
#[derive(Clone, Default)]
pub struct Context {
    store: Option<Arc<dyn Store>>,
    trace_id: Option<Arc<str>>,
    deadline: Option<Instant>,
}

impl Context {
    /// An empty context: default store, no trace id, no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a store that takes precedence over the controller default
    /// for this request.
    pub fn with_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// The store attached to this request, if any.
    pub fn store_override(&self) -> Option<&Arc<dyn Store>> {
        self.store.as_ref()
    }

    /// Attaches a trace id included in log events.
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(Arc::from(id.into()));
        self
    }

    /// The trace id attached to this request, if any.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Sets an absolute deadline for this request.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The deadline attached to this request, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// A copy of this context with the caller's deadline severed.
    ///
    /// Store override and trace id are kept. Background refresh runs on a
    /// detached context so it survives the spawning caller returning.
    pub fn detached(&self) -> Self {
        Self {
            store: self.store.clone(),
            trace_id: self.trace_id.clone(),
            deadline: None,
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("store_override", &self.store.is_some())
            .field("trace_id", &self.trace_id)
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn empty_context_has_no_attachments() {
        let ctx = Context::new();
        assert!(ctx.store_override().is_none());
        assert!(ctx.trace_id().is_none());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn detached_severs_only_the_deadline() {
        let ctx = Context::new()
            .with_store(Arc::new(MemoryStore::new()))
            .with_trace_id("t-1")
            .with_timeout(Duration::from_secs(5));

        let detached = ctx.detached();
        assert!(detached.deadline().is_none());
        assert!(detached.store_override().is_some());
        assert_eq!(detached.trace_id(), Some("t-1"));
        // The original keeps its deadline.
        assert!(ctx.deadline().is_some());
    }

    #[test]
    fn debug_does_not_require_store_debug() {
        let ctx = Context::new().with_store(Arc::new(MemoryStore::new()));
        let printed = format!("{ctx:?}");
        assert!(printed.contains("store_override: true"));
    }
}
