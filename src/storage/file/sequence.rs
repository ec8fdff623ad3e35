//! File-based sequence storage.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

use super::{WriteLock, encode_file_name, load_json, write_atomic};
use crate::domain::{InventoryId, SequenceState};
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::SequenceStorage;

/// File-based sequence storage implementation.
///
/// One JSON file per inventory. Within the process, allocations for one
/// inventory queue on that inventory's mutex; across processes the exclusive
/// lock on the sibling `.lock` file serialises them. The counter file is
/// only ever replaced whole, so once created it always holds a full state.
pub struct FileSequenceStorage {
    /// Directory for sequence files.
    sequences_dir: PathBuf,
    /// Per-inventory in-process locks.
    locks: DashMap<InventoryId, Arc<Mutex<()>>>,
}

impl FileSequenceStorage {
    /// Create a new file sequence storage.
    #[must_use]
    pub fn new(sequences_dir: PathBuf) -> Self {
        Self {
            sequences_dir,
            locks: DashMap::new(),
        }
    }

    fn sequence_path(&self, inventory_id: &InventoryId) -> PathBuf {
        self.sequences_dir
            .join(format!("{}.json", encode_file_name(inventory_id.as_str())))
    }

    fn inventory_lock(&self, inventory_id: &InventoryId) -> Arc<Mutex<()>> {
        Arc::clone(
            self.locks
                .entry(inventory_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    fn read_state(&self, inventory_id: &InventoryId) -> StorageResult<Option<SequenceState>> {
        load_json(&self.sequence_path(inventory_id))
    }

    /// Create-or-advance the counter under the exclusive write lock.
    fn advance_state(&self, inventory_id: &InventoryId, start_value: u64) -> StorageResult<u64> {
        let path = self.sequence_path(inventory_id);
        let _lock = WriteLock::acquire(&path)?;

        let mut state = load_json(&path)?
            .unwrap_or_else(|| SequenceState::new(inventory_id.clone(), start_value));

        let allocated = state
            .advance()
            .ok_or_else(|| StorageError::Overflow(inventory_id.to_string()))?;

        write_atomic(&path, serde_json::to_string_pretty(&state)?.as_bytes())?;

        Ok(allocated)
    }
}

#[async_trait]
impl SequenceStorage for FileSequenceStorage {
    async fn allocate(&self, inventory_id: &InventoryId, start_value: u64) -> StorageResult<u64> {
        let lock = self.inventory_lock(inventory_id);
        let _guard = lock.lock().await;
        self.advance_state(inventory_id, start_value)
    }

    async fn peek(&self, inventory_id: &InventoryId, start_value: u64) -> StorageResult<u64> {
        Ok(self
            .read_state(inventory_id)?
            .map_or(start_value, |state| state.next_value))
    }

    async fn get_state(&self, inventory_id: &InventoryId) -> StorageResult<Option<SequenceState>> {
        self.read_state(inventory_id)
    }
}
