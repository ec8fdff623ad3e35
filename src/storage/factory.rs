//! Storage backend factory.
//!
//! Creates the appropriate storage backend based on configuration.

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::AppError;
use crate::storage::file::FileStorage;
use crate::storage::memory::MemoryStorage;
use crate::storage::mysql::MySqlStorage;
use crate::storage::postgres::PostgresStorage;
use crate::storage::redis::RedisStorage;
use crate::storage::traits::Storage;

/// Create a storage backend based on configuration.
///
/// The backend is health-checked before it is returned.
///
/// # Errors
///
/// Returns an error if the storage backend cannot be initialized.
pub async fn create_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>, AppError> {
    let storage: Arc<dyn Storage> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        StorageBackend::File => Arc::new(FileStorage::new(&config.file)?),
        StorageBackend::Redis => Arc::new(RedisStorage::new(&config.redis)?),
        StorageBackend::PostgreSQL => Arc::new(PostgresStorage::connect(&config.postgresql).await?),
        StorageBackend::MySQL => Arc::new(MySqlStorage::connect(&config.mysql).await?),
    };

    storage.health_check().await?;

    Ok(storage)
}
