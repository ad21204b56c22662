//! Opportunistic Redis read cache for catalog reads.
//!
//! Only book rows and book listings go through here. Stock figures and loan
//! state are never cached. Every Redis failure degrades to a cache miss and
//! is logged; the request itself never fails because of the cache.

use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::config::RedisConfig;

/// Key of a single book row
pub fn book_key(id: Uuid) -> String {
    format!("books:{}", id)
}

/// Key of one page of the book listing
pub fn book_list_key(page: i64, limit: i64) -> String {
    format!("{}{}:{}", BOOK_LIST_PREFIX, page, limit)
}

pub const BOOK_LIST_PREFIX: &str = "books:list:";

/// Holds one reconnecting Redis connection shared by every clone
#[derive(Clone)]
pub struct CacheService {
    manager: Option<ConnectionManager>,
    ttl_seconds: u64,
}

impl CacheService {
    /// Connect and PING once. An unreachable server disables the cache
    /// instead of preventing startup.
    pub async fn connect(config: &RedisConfig) -> Self {
        if !config.enabled {
            tracing::info!("Read cache disabled by configuration");
            return Self::disabled();
        }

        let client = match Client::open(config.url.as_str()) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("Invalid Redis URL, read cache disabled: {}", e);
                return Self::disabled();
            }
        };

        let connected = async {
            let mut manager = client.get_connection_manager().await?;
            redis::cmd("PING").query_async::<_, String>(&mut manager).await?;
            Ok::<_, redis::RedisError>(manager)
        };
        match connected.await {
            Ok(manager) => {
                tracing::info!("Connected to Redis read cache");
                Self {
                    manager: Some(manager),
                    ttl_seconds: config.ttl_seconds,
                }
            }
            Err(e) => {
                tracing::warn!("Redis unreachable, read cache disabled: {}", e);
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self {
            manager: None,
            ttl_seconds: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.manager.is_some()
    }

    /// Handle on the shared connection; the manager reconnects on its own
    fn connection(&self) -> Option<ConnectionManager> {
        self.manager.clone()
    }

    /// Cached value for `key`, `None` on miss, decode error or Redis failure
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.connection()?;
        let raw: Option<String> = match conn.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, "Cache read failed: {}", e);
                return None;
            }
        };
        let raw = raw?;
        match serde_json::from_str(&raw) {
            Ok(value) => {
                tracing::debug!(key, "cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(key, "Discarding undecodable cache entry: {}", e);
                None
            }
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let Some(mut conn) = self.connection() else {
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, "Failed to encode cache entry: {}", e);
                return;
            }
        };
        if let Err(e) = conn.set_ex::<_, _, ()>(key, raw, self.ttl_seconds).await {
            tracing::warn!(key, "Cache write failed: {}", e);
        }
    }

    pub async fn invalidate(&self, key: &str) {
        let Some(mut conn) = self.connection() else {
            return;
        };
        if let Err(e) = conn.del::<_, ()>(key).await {
            tracing::warn!(key, "Cache invalidation failed: {}", e);
        }
    }

    /// Drop every key starting with `prefix`. Uses SCAN so Redis is never
    /// blocked the way KEYS would.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        let Some(mut conn) = self.connection() else {
            return;
        };
        let pattern = format!("{}*", prefix);
        let mut cursor: u64 = 0;
        loop {
            let scanned = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async::<_, (u64, Vec<String>)>(&mut conn)
                .await;
            let (next, keys) = match scanned {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(prefix, "Cache scan failed: {}", e);
                    return;
                }
            };
            if !keys.is_empty() {
                if let Err(e) = conn.del::<_, ()>(keys).await {
                    tracing::warn!(prefix, "Cache invalidation failed: {}", e);
                    return;
                }
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
    }
}
