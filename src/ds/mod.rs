pub mod shard_mutex;
pub mod singleflight;

pub use shard_mutex::{key_shard, ShardedMutex, SHARD_COUNT};
pub use singleflight::SingleflightGroup;
