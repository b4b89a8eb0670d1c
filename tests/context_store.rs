// ==============================================
// CONTEXT-SCOPED STORE TESTS (integration)
// ==============================================
//
// Per-request store substitution: a hash-field store attached to the
// request context must take precedence over the controller default, route
// every read and write, and still benefit from single-flight coalescing.

mod common;

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use cachefront::context::Context;
use cachefront::controller::Controller;
use cachefront::error::CacheError;
use cachefront::policy::ReusePolicy;
use cachefront::store::MemoryStore;
use cachefront::ttl::KEEP_TTL;

use common::{HashFieldStore, HashTable};

#[tokio::test]
async fn context_store_routes_reads_and_writes() {
    let controller: Controller<i64> =
        Controller::new("ctx-routing", Arc::new(MemoryStore::new()));
    let table = HashTable::new();

    let ctx_a = HashFieldStore::bind(&table, "field-a", &Context::new());
    let ctx_b = HashFieldStore::bind(&table, "field-b", &Context::new());

    controller.set_store(&ctx_a, "k", 1, KEEP_TTL).await.unwrap();
    controller.set_store(&ctx_b, "k", 2, KEEP_TTL).await.unwrap();

    // Same cache key, two fields: the context decides which one is read.
    let (a, _) = controller.get_store(&ctx_a, "k").await.unwrap();
    let (b, _) = controller.get_store(&ctx_b, "k").await.unwrap();
    assert_eq!((a, b), (1, 2));
    assert_eq!(table.len(), 2);

    // The default store never saw any of it.
    assert!(matches!(
        controller.get_store(&Context::new(), "k").await,
        Err(CacheError::KeyMissing)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn hash_fields_partition_a_concurrent_workload() {
    const TASKS: usize = 10;
    const CALLS_PER_TASK: usize = 1000;
    const FIELDS: i64 = 5;

    let controller: Arc<Controller<i64>> = Arc::new(
        Controller::builder("ctx-partition", Arc::new(MemoryStore::new()))
            .policy(ReusePolicy::new(Duration::from_secs(10)))
            .build(),
    );
    let table = HashTable::new();
    let source_calls = Arc::new(AtomicI64::new(0));

    let tasks = (0..TASKS).map(|_| {
        let controller = Arc::clone(&controller);
        let table = table.clone();
        let source_calls = Arc::clone(&source_calls);
        tokio::spawn(async move {
            for j in 0..CALLS_PER_TASK {
                let field = j as i64 % FIELDS;
                let ctx = HashFieldStore::bind(&table, field.to_string(), &Context::new());
                let source_calls = Arc::clone(&source_calls);
                let value = controller
                    .wrap(&ctx, &format!("test-key-{field}"), move |_ctx| {
                        let source_calls = Arc::clone(&source_calls);
                        async move {
                            source_calls.fetch_add(1, Ordering::SeqCst);
                            Ok(field)
                        }
                    })
                    .await
                    .unwrap();
                assert_eq!(value, field);
            }
        })
    });
    for joined in join_all(tasks).await {
        joined.unwrap();
    }

    // One load per field, coalesced across tasks and iterations.
    assert!(source_calls.load(Ordering::SeqCst) <= FIELDS);
    assert_eq!(table.len(), FIELDS as usize);
}
