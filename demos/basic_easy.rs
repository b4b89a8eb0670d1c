use std::sync::Arc;
use std::time::Duration;

use cachefront::context::Context;
use cachefront::controller::Controller;
use cachefront::policy::EasyPolicy;
use cachefront::store::MemoryStore;

#[tokio::main]
async fn main() -> Result<(), cachefront::CacheError> {
    let controller: Controller<String> =
        Controller::builder("greetings", Arc::new(MemoryStore::new()))
            .policy(EasyPolicy::new(Duration::from_secs(5)))
            .build();
    let ctx = Context::new();

    let first = controller
        .wrap(&ctx, "hello", |_ctx| async {
            println!("source consulted");
            Ok("hello, world".to_string())
        })
        .await?;
    println!("first: {first}");

    let second = controller
        .wrap(&ctx, "hello", |_ctx| async {
            println!("source consulted");
            Ok("hello, world".to_string())
        })
        .await?;
    println!("second: {second}");

    Ok(())
}

// Expected output:
// source consulted
// first: hello, world
// second: hello, world
//
// Explanation: the second call lands inside the 5s store TTL, so the value
// is served from the cache and the source runs exactly once.
