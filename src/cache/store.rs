//! Cache storage.
//!
//! [`MenuCache`] fronts a [`CacheBackend`] (Redis in production) and
//! absorbs every backend failure: a failed read is a miss, a failed write
//! or delete is a no-op. Callers never observe cache errors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use super::config::CacheConfig;
use super::keys::MENU_NAMESPACE;

const TARGET: &str = "piatto::cache";

#[derive(Debug, Error)]
pub enum CacheBackendError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache operation timed out")]
    Timeout,
}

impl From<redis::RedisError> for CacheBackendError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Raw key/value operations against the cache backend.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheBackendError>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheBackendError>;
    async fn delete(&self, key: &str) -> Result<(), CacheBackendError>;
    async fn delete_by_prefix(&self, prefix: &str) -> Result<(), CacheBackendError>;
}

/// Redis implementation. `ConnectionManager` multiplexes internally and is
/// cloned per operation.
pub struct RedisBackend {
    manager: ConnectionManager,
    op_timeout: Duration,
}

impl RedisBackend {
    pub async fn connect(url: &str, op_timeout: Duration) -> Result<Self, CacheBackendError> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self {
            manager,
            op_timeout,
        })
    }

    async fn deadline<T>(
        &self,
        op: impl Future<Output = Result<T, redis::RedisError>>,
    ) -> Result<T, CacheBackendError> {
        match tokio::time::timeout(self.op_timeout, op).await {
            Ok(result) => result.map_err(CacheBackendError::from),
            Err(_) => Err(CacheBackendError::Timeout),
        }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheBackendError> {
        let mut conn = self.manager.clone();
        self.deadline(async move { conn.get::<_, Option<String>>(key).await })
            .await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheBackendError> {
        let mut conn = self.manager.clone();
        let seconds = ttl.as_secs().max(1);
        self.deadline(async move { conn.set_ex::<_, _, ()>(key, value, seconds).await })
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheBackendError> {
        let mut conn = self.manager.clone();
        self.deadline(async move { conn.del::<_, ()>(key).await })
            .await
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<(), CacheBackendError> {
        let pattern = format!("{prefix}*");
        let mut conn = self.manager.clone();
        let op = async move {
            let mut keys = Vec::new();
            {
                let mut scan: redis::AsyncIter<'_, String> = conn.scan_match(&pattern).await?;
                while let Some(key) = scan.next_item().await {
                    keys.push(key);
                }
            }
            if !keys.is_empty() {
                conn.del::<_, ()>(keys).await?;
            }
            Ok(())
        };
        self.deadline(op).await
    }
}

/// Best-effort cache for menu views.
pub struct MenuCache {
    backend: Option<Arc<dyn CacheBackend>>,
}

impl MenuCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// A cache that never hits. Used when caching is disabled or the
    /// backend is unreachable at startup.
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    /// Connect the configured backend, or fall back to a disabled cache.
    pub async fn from_config(config: &CacheConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        let Some(url) = config.url.as_deref() else {
            warn!(target: TARGET, "cache enabled but no redis url configured; running uncached");
            return Self::disabled();
        };
        match RedisBackend::connect(url, config.op_timeout()).await {
            Ok(backend) => Self::new(Arc::new(backend)),
            Err(err) => {
                warn!(target: TARGET, error = %err, "redis unreachable at startup; running uncached");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let backend = self.backend.as_ref()?;
        match backend.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    counter!("piatto_cache_hit_total").increment(1);
                    Some(value)
                }
                Err(err) => {
                    // A corrupt entry is as good as a miss; drop it.
                    warn!(target: TARGET, key, error = %err, "discarding undecodable cache entry");
                    let _ = backend.delete(key).await;
                    counter!("piatto_cache_miss_total").increment(1);
                    None
                }
            },
            Ok(None) => {
                counter!("piatto_cache_miss_total").increment(1);
                None
            }
            Err(err) => {
                warn!(target: TARGET, key, error = %err, "cache get failed; treating as miss");
                counter!("piatto_cache_error_total").increment(1);
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(target: TARGET, key, error = %err, "cache value serialization failed");
                return;
            }
        };
        if let Err(err) = backend.set(key, raw, ttl).await {
            warn!(target: TARGET, key, error = %err, "cache set failed; skipping");
            counter!("piatto_cache_error_total").increment(1);
        }
    }

    pub async fn delete(&self, key: &str) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        if let Err(err) = backend.delete(key).await {
            warn!(target: TARGET, key, error = %err, "cache delete failed; skipping");
            counter!("piatto_cache_error_total").increment(1);
        }
    }

    /// Clear every cached menu view. Invoked after each successful
    /// mutation and by the admin cache-clear endpoint. Best-effort: on
    /// failure the entries age out within their TTLs.
    pub async fn clear_namespace(&self) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        match backend.delete_by_prefix(MENU_NAMESPACE).await {
            Ok(()) => {
                counter!("piatto_cache_invalidation_total").increment(1);
                debug!(target: TARGET, namespace = MENU_NAMESPACE, "cleared cached menu views");
            }
            Err(err) => {
                warn!(target: TARGET, error = %err, "cache invalidation failed; entries will expire by ttl");
                counter!("piatto_cache_error_total").increment(1);
            }
        }
    }
}
