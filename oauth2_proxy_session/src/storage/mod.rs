mod errors;
mod memory;
mod redis;
mod types;

pub use errors::StorageError;
pub use memory::InMemoryCache;
pub use self::redis::{ClusterCache, RedisCache, SentinelCache, new_redis_cache};
pub use types::SessionCache;
