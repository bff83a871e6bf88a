use async_trait::async_trait;

use super::errors::StorageError;

/// Key-value capability the ticketed session store needs from its backing cache.
///
/// Implementations must make each single-key operation atomic. No multi-key
/// transactions are required.
#[async_trait]
pub trait SessionCache: Send + Sync + 'static {
    /// Fetch the bytes stored under `key`, `None` on a miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store `value` under `key`, expiring after `ttl` seconds. A TTL of zero stores without expiry.
    async fn set(&self, key: &str, value: &[u8], ttl: u64) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn del(&self, key: &str) -> Result<(), StorageError>;
}
