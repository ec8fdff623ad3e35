//! Redis storage backend.
//!
//! Key layout (`{prefix}` is `storage.redis.key_prefix`):
//!
//! ```text
//! {prefix}seq:{inventory}      hash: next_value, version, created_at, updated_at
//! {prefix}config:{inventory}   string: StoredConfiguration as JSON
//! ```
//!
//! Allocation is one `MULTI`/`EXEC` block: `HSETNX` seeds a fresh counter and
//! `HINCRBY` advances it, so the value before the increment belongs to exactly
//! one caller.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Pool, PoolConfig, Runtime};
use redis::AsyncCommands;

use crate::config::RedisStorageConfig;
use crate::domain::{InventoryId, SequenceState, StoredConfiguration};
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::{ConfigStorage, SequenceStorage, Storage};

/// Redis storage implementation.
pub struct RedisStorage {
    pool: Pool,
    key_prefix: String,
}

impl RedisStorage {
    /// Create the connection pool.
    ///
    /// Connections are opened lazily; call [`Storage::health_check`] to verify
    /// the server is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be built from the configuration.
    pub fn new(config: &RedisStorageConfig) -> StorageResult<Self> {
        let timeout = Duration::from_secs(config.connect_timeout);

        let mut pool_config = PoolConfig::new(config.pool_size);
        pool_config.timeouts.wait = Some(timeout);
        pool_config.timeouts.create = Some(timeout);

        let mut cfg = deadpool_redis::Config::from_url(config.url.clone());
        cfg.pool = Some(pool_config);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn sequence_key(&self, inventory_id: &InventoryId) -> String {
        format!("{}seq:{inventory_id}", self.key_prefix)
    }

    fn config_key(&self, inventory_id: &InventoryId) -> String {
        format!("{}config:{inventory_id}", self.key_prefix)
    }

    async fn connection(&self) -> StorageResult<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl SequenceStorage for RedisStorage {
    async fn allocate(&self, inventory_id: &InventoryId, start_value: u64) -> StorageResult<u64> {
        let key = self.sequence_key(inventory_id);
        let now = chrono::Utc::now().timestamp_millis();
        let mut conn = self.connection().await?;

        let (next,): (u64,) = redis::pipe()
            .atomic()
            .hset_nx(&key, "next_value", start_value)
            .ignore()
            .hset_nx(&key, "created_at", now)
            .ignore()
            .hincr(&key, "next_value", 1)
            .hincr(&key, "version", 1)
            .ignore()
            .hset(&key, "updated_at", now)
            .ignore()
            .query_async(&mut conn)
            .await?;

        next.checked_sub(1)
            .ok_or_else(|| StorageError::Query(format!("corrupt counter for {inventory_id}")))
    }

    async fn peek(&self, inventory_id: &InventoryId, start_value: u64) -> StorageResult<u64> {
        let mut conn = self.connection().await?;
        let next: Option<u64> = conn
            .hget(self.sequence_key(inventory_id), "next_value")
            .await?;
        Ok(next.unwrap_or(start_value))
    }

    async fn get_state(&self, inventory_id: &InventoryId) -> StorageResult<Option<SequenceState>> {
        let mut conn = self.connection().await?;
        let (next_value, version, created_at, updated_at): (
            Option<u64>,
            Option<u64>,
            Option<i64>,
            Option<i64>,
        ) = redis::cmd("HMGET")
            .arg(self.sequence_key(inventory_id))
            .arg(&["next_value", "version", "created_at", "updated_at"])
            .query_async(&mut conn)
            .await?;

        Ok(next_value.map(|next_value| SequenceState {
            inventory_id: inventory_id.clone(),
            next_value,
            version: version.unwrap_or_default(),
            created_at: created_at.unwrap_or_default(),
            updated_at: updated_at.unwrap_or_default(),
        }))
    }
}

#[async_trait]
impl ConfigStorage for RedisStorage {
    async fn save_configuration(&self, config: &StoredConfiguration) -> StorageResult<()> {
        let json = serde_json::to_string(config)?;
        let mut conn = self.connection().await?;
        let () = conn.set(self.config_key(&config.inventory_id), json).await?;
        Ok(())
    }

    async fn get_configuration(
        &self,
        inventory_id: &InventoryId,
    ) -> StorageResult<Option<StoredConfiguration>> {
        let mut conn = self.connection().await?;
        let json: Option<String> = conn.get(self.config_key(inventory_id)).await?;
        json.map(|j| serde_json::from_str(&j).map_err(StorageError::from))
            .transpose()
    }

    async fn delete_configuration(&self, inventory_id: &InventoryId) -> StorageResult<bool> {
        let mut conn = self.connection().await?;
        let removed: u64 = conn.del(self.config_key(inventory_id)).await?;
        Ok(removed > 0)
    }
}

#[async_trait]
impl Storage for RedisStorage {
    async fn health_check(&self) -> StorageResult<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
