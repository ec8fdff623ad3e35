//! In-memory storage backend.
//!
//! Counters live in a `DashMap`, each behind its own mutex. The map shard is
//! only held long enough to clone the counter's `Arc`, so a busy inventory
//! never stalls inventories that share its shard. Nothing survives a restart,
//! so this backend is meant for tests and throwaway deployments.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::domain::{InventoryId, SequenceState, StoredConfiguration};
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::{ConfigStorage, SequenceStorage, Storage};

/// In-memory storage implementation.
#[derive(Default)]
pub struct MemoryStorage {
    sequences: DashMap<InventoryId, Arc<Mutex<SequenceState>>>,
    configs: DashMap<InventoryId, StoredConfiguration>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, inventory_id: &InventoryId, start_value: u64) -> Arc<Mutex<SequenceState>> {
        if let Some(counter) = self.sequences.get(inventory_id) {
            return Arc::clone(counter.value());
        }

        Arc::clone(
            self.sequences
                .entry(inventory_id.clone())
                .or_insert_with(|| {
                    Arc::new(Mutex::new(SequenceState::new(
                        inventory_id.clone(),
                        start_value,
                    )))
                })
                .value(),
        )
    }

    fn existing_counter(&self, inventory_id: &InventoryId) -> Option<Arc<Mutex<SequenceState>>> {
        self.sequences
            .get(inventory_id)
            .map(|counter| Arc::clone(counter.value()))
    }
}

#[async_trait]
impl SequenceStorage for MemoryStorage {
    async fn allocate(&self, inventory_id: &InventoryId, start_value: u64) -> StorageResult<u64> {
        let counter = self.counter(inventory_id, start_value);
        let mut state = counter.lock();
        state
            .advance()
            .ok_or_else(|| StorageError::Overflow(inventory_id.to_string()))
    }

    async fn peek(&self, inventory_id: &InventoryId, start_value: u64) -> StorageResult<u64> {
        Ok(self
            .existing_counter(inventory_id)
            .map_or(start_value, |counter| counter.lock().next_value))
    }

    async fn get_state(&self, inventory_id: &InventoryId) -> StorageResult<Option<SequenceState>> {
        Ok(self
            .existing_counter(inventory_id)
            .map(|counter| counter.lock().clone()))
    }
}

#[async_trait]
impl ConfigStorage for MemoryStorage {
    async fn save_configuration(&self, config: &StoredConfiguration) -> StorageResult<()> {
        self.configs
            .insert(config.inventory_id.clone(), config.clone());
        Ok(())
    }

    async fn get_configuration(
        &self,
        inventory_id: &InventoryId,
    ) -> StorageResult<Option<StoredConfiguration>> {
        Ok(self.configs.get(inventory_id).map(|c| c.clone()))
    }

    async fn delete_configuration(&self, inventory_id: &InventoryId) -> StorageResult<bool> {
        Ok(self.configs.remove(inventory_id).is_some())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
