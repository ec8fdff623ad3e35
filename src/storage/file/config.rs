//! File-based configuration storage.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use super::{WriteLock, encode_file_name, load_json, write_atomic};
use crate::domain::{InventoryId, StoredConfiguration};
use crate::error::StorageResult;
use crate::storage::traits::ConfigStorage;

/// File-based configuration storage implementation.
///
/// Saves replace the file whole under the inventory's `.lock` file, so a
/// reader sees either the previous configuration or the new one.
pub struct FileConfigStorage {
    /// Directory for configuration files.
    configs_dir: PathBuf,
}

impl FileConfigStorage {
    /// Create a new file config storage.
    #[must_use]
    pub fn new(configs_dir: PathBuf) -> Self {
        Self { configs_dir }
    }

    fn config_path(&self, inventory_id: &InventoryId) -> PathBuf {
        self.configs_dir
            .join(format!("{}.json", encode_file_name(inventory_id.as_str())))
    }

    fn write_config(&self, config: &StoredConfiguration) -> StorageResult<()> {
        let path = self.config_path(&config.inventory_id);
        let _lock = WriteLock::acquire(&path)?;
        write_atomic(&path, serde_json::to_string_pretty(config)?.as_bytes())
    }

    fn remove_config(&self, inventory_id: &InventoryId) -> StorageResult<bool> {
        let path = self.config_path(inventory_id);
        let _lock = WriteLock::acquire(&path)?;

        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ConfigStorage for FileConfigStorage {
    async fn save_configuration(&self, config: &StoredConfiguration) -> StorageResult<()> {
        self.write_config(config)
    }

    async fn get_configuration(
        &self,
        inventory_id: &InventoryId,
    ) -> StorageResult<Option<StoredConfiguration>> {
        load_json(&self.config_path(inventory_id))
    }

    async fn delete_configuration(&self, inventory_id: &InventoryId) -> StorageResult<bool> {
        self.remove_config(inventory_id)
    }
}
