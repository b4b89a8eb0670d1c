use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cachefront::context::Context;
use cachefront::controller::Controller;
use cachefront::error::CacheError;
use cachefront::policy::ReusePolicy;
use cachefront::store::MemoryStore;

#[tokio::main]
async fn main() -> Result<(), CacheError> {
    let controller: Controller<u64> = Controller::builder("prices", Arc::new(MemoryStore::new()))
        .policy(ReusePolicy::new(Duration::from_secs(1)))
        .build();
    let ctx = Context::new();
    let source_down = Arc::new(AtomicBool::new(false));

    let query = {
        let source_down = Arc::clone(&source_down);
        move |_ctx: Context| {
            let source_down = Arc::clone(&source_down);
            async move {
                if source_down.load(Ordering::SeqCst) {
                    Err(CacheError::source("pricing service unavailable"))
                } else {
                    Ok(199)
                }
            }
        }
    };

    let price = controller.wrap(&ctx, "sku-1", query.clone()).await?;
    println!("loaded: {price}");

    // The source goes down and the entry crosses its business expiry...
    source_down.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(1100)).await;

    // ...but callers still get the stale price instead of an error.
    let price = controller.wrap(&ctx, "sku-1", query).await?;
    println!("served stale: {price}");

    Ok(())
}

// Expected output:
// loaded: 199
// served stale: 199
