//! Redis cache backend

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisResult};
use restbridge_core::RestError;
use serde_json::Value;

use super::ResponseCache;

/// Cache stored in Redis, values serialized as JSON strings
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to a Redis server
    pub async fn new(url: &str) -> Result<Self, RestError> {
        let client = Client::open(url)
            .map_err(|e| RestError::Cache(format!("Redis client creation failed: {}", e)))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| RestError::Cache(format!("Redis connection failed: {}", e)))?;

        Ok(Self { conn })
    }

    /// Check that the server answers PING
    pub async fn health_check(&self) -> Result<(), RestError> {
        let mut conn = self.conn.clone();
        let result: RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        match result {
            Ok(response) if response == "PONG" => Ok(()),
            Ok(response) => Err(RestError::Cache(format!(
                "Unexpected PING response: {}",
                response
            ))),
            Err(e) => Err(RestError::Cache(format!("Redis health check failed: {}", e))),
        }
    }
}

#[async_trait]
impl ResponseCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Value>, RestError> {
        let mut conn = self.conn.clone();
        let result: RedisResult<Option<String>> = conn.get(key).await;
        match result {
            Ok(Some(raw)) => Ok(Some(serde_json::from_str(&raw)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(RestError::Cache(format!("GET failed: {}", e))),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), RestError> {
        let mut conn = self.conn.clone();
        let raw = serde_json::to_string(&value)?;
        let result: RedisResult<()> = conn.set(key, raw).await;
        result.map_err(|e| RestError::Cache(format!("SET failed: {}", e)))
    }

    async fn del(&self, key: &str) -> Result<(), RestError> {
        let mut conn = self.conn.clone();
        let result: RedisResult<i64> = conn.del(key).await;
        result
            .map(|_| ())
            .map_err(|e| RestError::Cache(format!("DEL failed: {}", e)))
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
