pub mod file;
pub mod memory;
pub mod redis;

use std::sync::Arc;

use crate::{config::Config, error::AppResult};

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use self::redis::RedisStore;

/// Persistent string key/value store
///
/// Every domain record is serialized to text by its owner before it reaches the
/// store. Implementations only move strings around.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    async fn remove(&self, key: &str) -> AppResult<()>;
}

/// Opens the configured backend: Redis when `REDIS_URL` is set, else the JSON file.
pub async fn open_store(config: &Config) -> AppResult<Arc<dyn KeyValueStore>> {
    match &config.redis_url {
        Some(url) => {
            let client = self::redis::create_redis_client(url)?;
            tracing::info!(backend = "redis", "Preference store opened");
            Ok(Arc::new(RedisStore::new(client)))
        }
        None => {
            let store = JsonFileStore::open(&config.store_path).await?;
            tracing::info!(backend = "file", path = %config.store_path, "Preference store opened");
            Ok(Arc::new(store))
        }
    }
}
