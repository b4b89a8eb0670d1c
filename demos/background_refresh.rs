use std::sync::Arc;
use std::time::Duration;

use cachefront::context::Context;
use cachefront::controller::Controller;
use cachefront::policy::FirstPolicy;
use cachefront::store::MemoryStore;
use cachefront::ttl::KEEP_TTL;

#[tokio::main]
async fn main() -> Result<(), cachefront::CacheError> {
    let controller: Controller<u64> = Controller::builder("counters", Arc::new(MemoryStore::new()))
        .policy(FirstPolicy::new(Duration::from_secs(1)).with_refresh_deadline(Duration::from_secs(5)))
        .build();
    let ctx = Context::new();

    // Seed the cache, then let the entry go stale.
    controller.set_store(&ctx, "visits", 100, KEEP_TTL).await?;
    tokio::time::sleep(Duration::from_millis(1100)).await;

    // The stale value comes back immediately; the slow reload happens in a
    // detached task that survives this call returning.
    let visits = controller
        .wrap(&ctx, "visits", |_ctx| async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(101)
        })
        .await?;
    println!("served immediately: {visits}");

    tokio::time::sleep(Duration::from_millis(300)).await;
    let (refreshed, _timestamp) = controller.get_store(&ctx, "visits").await?;
    println!("after refresh: {refreshed}");

    Ok(())
}

// Expected output:
// served immediately: 100
// after refresh: 101
