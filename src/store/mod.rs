pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod traits;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis::{RedisHashStore, RedisStore};
pub use traits::{DirectValue, Payload, Store};
