use async_trait::async_trait;
use redis::cluster::ClusterClient;
use redis::cluster_async::ClusterConnection;
use redis::sentinel::{SentinelClient, SentinelServerType};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};

use super::errors::StorageError;
use super::types::SessionCache;
use crate::config::RedisStoreOptions;

/// Bound a redis round trip by `timeout`. Dropping the returned future cancels the call.
async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, StorageError>
where
    F: Future<Output = RedisResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(StorageError::from),
        Err(_) => {
            tracing::warn!("Redis operation timed out after {:?}", timeout);
            Err(StorageError::Timeout(timeout))
        }
    }
}

async fn cmd_get<C: AsyncCommands>(conn: &mut C, key: &str) -> RedisResult<Option<Vec<u8>>> {
    conn.get(key).await
}

async fn cmd_set<C: AsyncCommands>(
    conn: &mut C,
    key: &str,
    value: &[u8],
    ttl: u64,
) -> RedisResult<()> {
    if ttl > 0 {
        conn.set_ex(key, value.to_vec(), ttl).await
    } else {
        conn.set(key, value.to_vec()).await
    }
}

async fn cmd_del<C: AsyncCommands>(conn: &mut C, key: &str) -> RedisResult<()> {
    conn.del(key).await
}

/// Single redis node, reached through a `redis://` or `rediss://` URL.
pub struct RedisCache {
    client: redis::Client,
    timeout: Duration,
}

impl RedisCache {
    pub fn new(opts: &RedisStoreOptions) -> Result<Self, StorageError> {
        let mut url = opts.connection_url.clone();
        if opts.insecure_skip_tls_verify && url.starts_with("rediss://") && !url.contains('#') {
            url.push_str("#insecure");
        }

        let client = match &opts.ca_path {
            Some(path) => {
                let root_cert = std::fs::read(path).map_err(|e| {
                    StorageError::Config(format!("failed to load {}: {e}", path.display()))
                })?;
                redis::Client::build_with_tls(
                    url.as_str(),
                    redis::TlsCertificates {
                        client_tls: None,
                        root_cert: Some(root_cert),
                    },
                )
            }
            None => redis::Client::open(url.as_str()),
        }
        .map_err(|e| StorageError::Config(format!("unable to parse redis url: {e}")))?;

        Ok(Self {
            client,
            timeout: opts.timeout,
        })
    }
}

#[async_trait]
impl SessionCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        with_timeout(self.timeout, async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            cmd_get(&mut conn, key).await
        })
        .await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: u64) -> Result<(), StorageError> {
        with_timeout(self.timeout, async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            cmd_set(&mut conn, key, value, ttl).await
        })
        .await
    }

    async fn del(&self, key: &str) -> Result<(), StorageError> {
        with_timeout(self.timeout, async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            cmd_del(&mut conn, key).await
        })
        .await
    }
}

/// Sentinel-monitored failover set.
///
/// The master is resolved once and its multiplexed connection shared by all
/// requests. Any failed or timed-out call drops the shared connection so the
/// next call resolves the master again, which picks up a failover.
pub struct SentinelCache {
    client: Mutex<SentinelClient>,
    conn: Mutex<Option<MultiplexedConnection>>,
    timeout: Duration,
}

impl SentinelCache {
    pub fn new(opts: &RedisStoreOptions) -> Result<Self, StorageError> {
        let client = SentinelClient::build(
            opts.sentinel_connection_urls.clone(),
            opts.sentinel_master_name.clone(),
            None,
            SentinelServerType::Master,
        )
        .map_err(|e| StorageError::Config(format!("unable to build sentinel client: {e}")))?;

        Ok(Self {
            client: Mutex::new(client),
            conn: Mutex::new(None),
            timeout: opts.timeout,
        })
    }

    async fn cached(&self) -> Option<MultiplexedConnection> {
        self.conn.lock().await.clone()
    }

    async fn connection(&self) -> RedisResult<MultiplexedConnection> {
        if let Some(conn) = self.cached().await {
            return Ok(conn);
        }

        // Only callers without a connection wait here.
        let mut client = self.client.lock().await;
        if let Some(conn) = self.cached().await {
            return Ok(conn);
        }
        tracing::debug!("Resolving redis master through sentinel");
        let master = client.async_get_client().await?;
        let conn = master.get_multiplexed_async_connection().await?;
        *self.conn.lock().await = Some(conn.clone());
        Ok(conn)
    }

    async fn forget_on_error<T>(
        &self,
        result: Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        if result.is_err() && self.conn.lock().await.take().is_some() {
            tracing::debug!("Dropped shared sentinel connection after error");
        }
        result
    }
}

#[async_trait]
impl SessionCache for SentinelCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let result = with_timeout(self.timeout, async {
            let mut conn = self.connection().await?;
            cmd_get(&mut conn, key).await
        })
        .await;
        self.forget_on_error(result).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: u64) -> Result<(), StorageError> {
        let result = with_timeout(self.timeout, async {
            let mut conn = self.connection().await?;
            cmd_set(&mut conn, key, value, ttl).await
        })
        .await;
        self.forget_on_error(result).await
    }

    async fn del(&self, key: &str) -> Result<(), StorageError> {
        let result = with_timeout(self.timeout, async {
            let mut conn = self.connection().await?;
            cmd_del(&mut conn, key).await
        })
        .await;
        self.forget_on_error(result).await
    }
}

/// Redis cluster. One multiplexed cluster connection is opened lazily and shared.
pub struct ClusterCache {
    client: ClusterClient,
    conn: OnceCell<ClusterConnection>,
    timeout: Duration,
}

impl ClusterCache {
    pub fn new(opts: &RedisStoreOptions) -> Result<Self, StorageError> {
        let client = ClusterClient::new(opts.cluster_connection_urls.clone())
            .map_err(|e| StorageError::Config(format!("unable to build cluster client: {e}")))?;

        Ok(Self {
            client,
            conn: OnceCell::new(),
            timeout: opts.timeout,
        })
    }

    async fn connection(&self) -> RedisResult<ClusterConnection> {
        self.conn
            .get_or_try_init(|| self.client.get_async_connection())
            .await
            .cloned()
    }
}

#[async_trait]
impl SessionCache for ClusterCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        with_timeout(self.timeout, async {
            let mut conn = self.connection().await?;
            cmd_get(&mut conn, key).await
        })
        .await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: u64) -> Result<(), StorageError> {
        with_timeout(self.timeout, async {
            let mut conn = self.connection().await?;
            cmd_set(&mut conn, key, value, ttl).await
        })
        .await
    }

    async fn del(&self, key: &str) -> Result<(), StorageError> {
        with_timeout(self.timeout, async {
            let mut conn = self.connection().await?;
            cmd_del(&mut conn, key).await
        })
        .await
    }
}

/// Build the redis backend selected by `opts`. No connection is opened here.
pub fn new_redis_cache(opts: &RedisStoreOptions) -> Result<Arc<dyn SessionCache>, StorageError> {
    if opts.use_sentinel && opts.use_cluster {
        return Err(StorageError::Config(
            "options redis-use-sentinel and redis-use-cluster are mutually exclusive".to_string(),
        ));
    }

    if opts.use_sentinel {
        tracing::info!(
            "Using redis sentinel master '{}' via {} sentinel(s)",
            opts.sentinel_master_name,
            opts.sentinel_connection_urls.len()
        );
        return Ok(Arc::new(SentinelCache::new(opts)?));
    }

    if opts.use_cluster {
        tracing::info!(
            "Using redis cluster with {} seed node(s)",
            opts.cluster_connection_urls.len()
        );
        return Ok(Arc::new(ClusterCache::new(opts)?));
    }

    tracing::info!("Using single redis node");
    Ok(Arc::new(RedisCache::new(opts)?))
}
