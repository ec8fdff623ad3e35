//! Row mapping shared by the SQL backends.
//!
//! Counters are stored as signed `BIGINT`, so values above `i64::MAX` are
//! reported as overflow.

use crate::domain::{InventoryId, SequenceState};
use crate::error::{StorageError, StorageResult};

/// One row of `customid_sequences`.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct SequenceRow {
    pub next_value: i64,
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SequenceRow {
    pub(super) fn into_state(self, inventory_id: &InventoryId) -> StorageResult<SequenceState> {
        let overflow = || StorageError::Overflow(inventory_id.to_string());
        Ok(SequenceState {
            inventory_id: inventory_id.clone(),
            next_value: u64::try_from(self.next_value).map_err(|_| overflow())?,
            version: u64::try_from(self.version).map_err(|_| overflow())?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Convert a counter value for binding as `BIGINT`.
pub(super) fn to_db_value(inventory_id: &InventoryId, value: u64) -> StorageResult<i64> {
    i64::try_from(value).map_err(|_| StorageError::Overflow(inventory_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_into_state() {
        let id = InventoryId::parse("inv").unwrap();
        let row = SequenceRow {
            next_value: 5,
            version: 4,
            created_at: 1,
            updated_at: 2,
        };
        let state = row.into_state(&id).unwrap();
        assert_eq!(state.next_value, 5);
        assert_eq!(state.version, 4);

        let row = SequenceRow {
            next_value: -1,
            version: 0,
            created_at: 0,
            updated_at: 0,
        };
        assert!(matches!(
            row.into_state(&id),
            Err(StorageError::Overflow(_))
        ));
    }

    #[test]
    fn test_to_db_value() {
        let id = InventoryId::parse("inv").unwrap();
        assert_eq!(to_db_value(&id, 1).unwrap(), 1);
        assert!(to_db_value(&id, u64::MAX).is_err());
    }
}
