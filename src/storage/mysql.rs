//! `MySQL` storage backend.
//!
//! `MySQL` has no `RETURNING`; the upsert stores the new counter value through
//! `LAST_INSERT_ID(expr)`, which is connection-scoped, and the allocated value
//! is read back on the same connection.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::info;

use super::sql::{SequenceRow, to_db_value};
use crate::config::SqlStorageConfig;
use crate::domain::{InventoryId, SequenceState, StoredConfiguration};
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::{ConfigStorage, SequenceStorage, Storage};

const CREATE_SEQUENCES: &str = r"
CREATE TABLE IF NOT EXISTS customid_sequences (
    inventory_id VARCHAR(255) NOT NULL PRIMARY KEY,
    next_value   BIGINT NOT NULL,
    version      BIGINT NOT NULL,
    created_at   BIGINT NOT NULL,
    updated_at   BIGINT NOT NULL
)";

const CREATE_CONFIGURATIONS: &str = r"
CREATE TABLE IF NOT EXISTS customid_configurations (
    inventory_id VARCHAR(255) NOT NULL PRIMARY KEY,
    body         TEXT NOT NULL,
    updated_at   BIGINT NOT NULL
)";

const ALLOCATE: &str = r"
INSERT INTO customid_sequences (inventory_id, next_value, version, created_at, updated_at)
VALUES (?, LAST_INSERT_ID(? + 1), 1, ?, ?)
ON DUPLICATE KEY UPDATE
    next_value = LAST_INSERT_ID(next_value + 1),
    version    = version + 1,
    updated_at = VALUES(updated_at)";

/// `MySQL` storage implementation.
pub struct MySqlStorage {
    pool: MySqlPool,
}

impl MySqlStorage {
    /// Connect and create the tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable or the schema cannot be
    /// created.
    pub async fn connect(config: &SqlStorageConfig) -> StorageResult<Self> {
        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to MySQL"
        );

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .connect(&config.url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let storage = Self { pool };
        storage.migrate().await?;
        Ok(storage)
    }

    async fn migrate(&self) -> StorageResult<()> {
        sqlx::query(CREATE_SEQUENCES).execute(&self.pool).await?;
        sqlx::query(CREATE_CONFIGURATIONS)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SequenceStorage for MySqlStorage {
    async fn allocate(&self, inventory_id: &InventoryId, start_value: u64) -> StorageResult<u64> {
        let start = to_db_value(inventory_id, start_value)?;
        let now = chrono::Utc::now().timestamp_millis();

        // LAST_INSERT_ID is per connection; both statements must share one.
        let mut conn = self.pool.acquire().await?;

        sqlx::query(ALLOCATE)
            .bind(inventory_id.as_str())
            .bind(start)
            .bind(now)
            .bind(now)
            .execute(&mut *conn)
            .await?;

        let next: u64 = sqlx::query_scalar("SELECT LAST_INSERT_ID()")
            .fetch_one(&mut *conn)
            .await?;

        next.checked_sub(1)
            .ok_or_else(|| StorageError::Query(format!("corrupt counter for {inventory_id}")))
    }

    async fn peek(&self, inventory_id: &InventoryId, start_value: u64) -> StorageResult<u64> {
        let next: Option<i64> =
            sqlx::query_scalar("SELECT next_value FROM customid_sequences WHERE inventory_id = ?")
                .bind(inventory_id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        next.map_or(Ok(start_value), |n| {
            u64::try_from(n).map_err(|_| StorageError::Overflow(inventory_id.to_string()))
        })
    }

    async fn get_state(&self, inventory_id: &InventoryId) -> StorageResult<Option<SequenceState>> {
        let row: Option<SequenceRow> = sqlx::query_as(
            "SELECT next_value, version, created_at, updated_at \
             FROM customid_sequences WHERE inventory_id = ?",
        )
        .bind(inventory_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_state(inventory_id)).transpose()
    }
}

#[async_trait]
impl ConfigStorage for MySqlStorage {
    async fn save_configuration(&self, config: &StoredConfiguration) -> StorageResult<()> {
        let body = serde_json::to_string(config)?;
        sqlx::query(
            "INSERT INTO customid_configurations (inventory_id, body, updated_at) \
             VALUES (?, ?, ?) \
             ON DUPLICATE KEY UPDATE body = VALUES(body), updated_at = VALUES(updated_at)",
        )
        .bind(config.inventory_id.as_str())
        .bind(body)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_configuration(
        &self,
        inventory_id: &InventoryId,
    ) -> StorageResult<Option<StoredConfiguration>> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM customid_configurations WHERE inventory_id = ?")
                .bind(inventory_id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        body.map(|b| serde_json::from_str(&b).map_err(StorageError::from))
            .transpose()
    }

    async fn delete_configuration(&self, inventory_id: &InventoryId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM customid_configurations WHERE inventory_id = ?")
            .bind(inventory_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Storage for MySqlStorage {
    async fn health_check(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mysql"
    }
}
