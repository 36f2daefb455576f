use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;

use crate::db::KeyValueStore;
use crate::error::AppResult;

const KEY_NAMESPACE: &str = "moviefindr";

/// Namespaced Redis key for a preference record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey<'a>(pub &'a str);

impl Display for StoreKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", KEY_NAMESPACE, self.0)
    }
}

/// Creates a Redis client for the preference store
pub fn create_redis_client(redis_url: &str) -> AppResult<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Preference store backed by Redis
///
/// Writes are applied before the call returns so a read right after a toggle
/// sees the new list. Records never expire.
#[derive(Clone)]
pub struct RedisStore {
    redis_client: Client,
}

impl RedisStore {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(StoreKey(key).to_string()).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(StoreKey(key).to_string(), value).await?;
        tracing::debug!(key = %key, "Preference written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(StoreKey(key).to_string()).await?;
        Ok(())
    }
}
