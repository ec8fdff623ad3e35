//! Storage trait definitions.
//!
//! These traits define the interface for storage backends, enabling swapping
//! between different implementations without changing business logic.

use async_trait::async_trait;

use crate::domain::{InventoryId, SequenceState, StoredConfiguration};
use crate::error::StorageResult;

/// Per-inventory sequence counters.
///
/// Counters are created lazily by the first `allocate` and never reset.
/// Implementations serialise `allocate` per inventory only; calls for
/// different inventories never wait on each other.
#[async_trait]
pub trait SequenceStorage: Send + Sync {
    /// Hand out the next value of the inventory's counter and advance it.
    ///
    /// A counter that does not exist yet is created at `start_value`, which is
    /// then the value returned. This is a single atomic read-modify-write: two
    /// concurrent calls never return the same value.
    async fn allocate(&self, inventory_id: &InventoryId, start_value: u64) -> StorageResult<u64>;

    /// The value `allocate` would return next, without changing anything.
    ///
    /// Returns `start_value` for a counter that does not exist yet.
    async fn peek(&self, inventory_id: &InventoryId, start_value: u64) -> StorageResult<u64>;

    /// Full counter state, `None` before the first allocation.
    async fn get_state(&self, inventory_id: &InventoryId) -> StorageResult<Option<SequenceState>>;
}

/// Per-inventory ID configurations.
#[async_trait]
pub trait ConfigStorage: Send + Sync {
    /// Create or replace the configuration of an inventory.
    async fn save_configuration(&self, config: &StoredConfiguration) -> StorageResult<()>;

    /// Get the configuration of an inventory.
    async fn get_configuration(
        &self,
        inventory_id: &InventoryId,
    ) -> StorageResult<Option<StoredConfiguration>>;

    /// Delete the configuration of an inventory; `false` when there was none.
    ///
    /// The inventory's sequence counter is left untouched.
    async fn delete_configuration(&self, inventory_id: &InventoryId) -> StorageResult<bool>;
}

/// Combined storage trait.
#[async_trait]
pub trait Storage: SequenceStorage + ConfigStorage {
    /// Check if the storage backend is healthy and reachable.
    async fn health_check(&self) -> StorageResult<()>;

    /// Get the storage backend name.
    fn backend_name(&self) -> &'static str;
}

/// Trait object alias for Storage.
pub type DynStorage = dyn Storage;
