//! Response cache
//!
//! `find` responses are cached by request URL; mutations invalidate the URL
//! they were sent to.

mod memory;
mod redis;

pub use memory::MemoryCache;
pub use redis::RedisCache;

use async_trait::async_trait;
use restbridge_core::{CacheSettings, RestError};
use serde_json::Value;
use std::sync::Arc;

/// Key/value store for normalized responses
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Look up a cached value
    async fn get(&self, key: &str) -> Result<Option<Value>, RestError>;

    /// Store a value
    async fn set(&self, key: &str, value: Value) -> Result<(), RestError>;

    /// Remove a value
    async fn del(&self, key: &str) -> Result<(), RestError>;

    /// Get the backend name
    fn backend(&self) -> &'static str;
}

/// Create a cache backend from connection settings
pub async fn from_settings(settings: &CacheSettings) -> Result<Arc<dyn ResponseCache>, RestError> {
    match settings {
        CacheSettings::Memory => Ok(Arc::new(MemoryCache::new())),
        CacheSettings::Redis { url } => {
            let cache = RedisCache::new(url).await?;
            Ok(Arc::new(cache))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_from_settings() {
        let cache = from_settings(&CacheSettings::Memory).await.unwrap();
        assert_eq!(cache.backend(), "memory");
    }

    #[tokio::test]
    async fn test_invalid_redis_url() {
        let result = from_settings(&CacheSettings::Redis {
            url: "not a url".to_string(),
        })
        .await;
        assert!(matches!(result, Err(RestError::Cache(_))));
    }
}
