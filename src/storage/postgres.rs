//! `PostgreSQL` storage backend.
//!
//! Allocation is a single upsert: the row lock taken by
//! `INSERT .. ON CONFLICT DO UPDATE` serialises concurrent allocations for one
//! inventory, while rows of other inventories stay untouched.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use super::sql::{SequenceRow, to_db_value};
use crate::config::SqlStorageConfig;
use crate::domain::{InventoryId, SequenceState, StoredConfiguration};
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::{ConfigStorage, SequenceStorage, Storage};

const CREATE_SEQUENCES: &str = r"
CREATE TABLE IF NOT EXISTS customid_sequences (
    inventory_id VARCHAR(255) PRIMARY KEY,
    next_value   BIGINT NOT NULL,
    version      BIGINT NOT NULL,
    created_at   BIGINT NOT NULL,
    updated_at   BIGINT NOT NULL
)";

const CREATE_CONFIGURATIONS: &str = r"
CREATE TABLE IF NOT EXISTS customid_configurations (
    inventory_id VARCHAR(255) PRIMARY KEY,
    body         TEXT NOT NULL,
    updated_at   BIGINT NOT NULL
)";

const ALLOCATE: &str = r"
INSERT INTO customid_sequences (inventory_id, next_value, version, created_at, updated_at)
VALUES ($1, $2 + 1, 1, $3, $3)
ON CONFLICT (inventory_id) DO UPDATE
SET next_value = customid_sequences.next_value + 1,
    version    = customid_sequences.version + 1,
    updated_at = EXCLUDED.updated_at
RETURNING next_value - 1";

/// `PostgreSQL` storage implementation.
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
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
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
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
impl SequenceStorage for PostgresStorage {
    async fn allocate(&self, inventory_id: &InventoryId, start_value: u64) -> StorageResult<u64> {
        let start = to_db_value(inventory_id, start_value)?;
        let now = chrono::Utc::now().timestamp_millis();

        let allocated: i64 = sqlx::query_scalar(ALLOCATE)
            .bind(inventory_id.as_str())
            .bind(start)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(allocated).map_err(|_| StorageError::Overflow(inventory_id.to_string()))
    }

    async fn peek(&self, inventory_id: &InventoryId, start_value: u64) -> StorageResult<u64> {
        let next: Option<i64> =
            sqlx::query_scalar("SELECT next_value FROM customid_sequences WHERE inventory_id = $1")
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
             FROM customid_sequences WHERE inventory_id = $1",
        )
        .bind(inventory_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_state(inventory_id)).transpose()
    }
}

#[async_trait]
impl ConfigStorage for PostgresStorage {
    async fn save_configuration(&self, config: &StoredConfiguration) -> StorageResult<()> {
        let body = serde_json::to_string(config)?;
        sqlx::query(
            "INSERT INTO customid_configurations (inventory_id, body, updated_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (inventory_id) DO UPDATE \
             SET body = EXCLUDED.body, updated_at = EXCLUDED.updated_at",
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
        let body: Option<String> = sqlx::query_scalar(
            "SELECT body FROM customid_configurations WHERE inventory_id = $1",
        )
        .bind(inventory_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        body.map(|b| serde_json::from_str(&b).map_err(StorageError::from))
            .transpose()
    }

    async fn delete_configuration(&self, inventory_id: &InventoryId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM customid_configurations WHERE inventory_id = $1")
            .bind(inventory_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn health_check(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgresql"
    }
}
