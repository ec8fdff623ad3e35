//! Inventory identifiers and sequence counter state.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

/// Maximum length of an inventory identifier.
const MAX_INVENTORY_ID_LEN: usize = 255;

/// Identifier of the inventory a configuration and counter belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InventoryId(String);

impl InventoryId {
    /// Parse an inventory identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty, too long, or contains
    /// whitespace or control characters.
    pub fn parse(raw: impl Into<String>) -> Result<Self, String> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err("inventory id cannot be empty".to_string());
        }
        if raw.len() > MAX_INVENTORY_ID_LEN {
            return Err(format!(
                "inventory id cannot exceed {MAX_INVENTORY_ID_LEN} characters"
            ));
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err("inventory id cannot contain whitespace".to_string());
        }
        Ok(Self(raw))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InventoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for InventoryId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<InventoryId> for String {
    fn from(id: InventoryId) -> Self {
        id.0
    }
}

impl Borrow<str> for InventoryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Persistent state of one inventory's sequence counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceState {
    /// Inventory the counter belongs to.
    pub inventory_id: InventoryId,

    /// Next value `allocate` will hand out.
    pub next_value: u64,

    /// Number of allocations performed.
    pub version: u64,

    /// Creation timestamp (milliseconds since epoch).
    pub created_at: i64,

    /// Last update timestamp (milliseconds since epoch).
    pub updated_at: i64,
}

impl SequenceState {
    /// Create a fresh counter starting at `start_value`.
    #[must_use]
    pub fn new(inventory_id: InventoryId, start_value: u64) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            inventory_id,
            next_value: start_value,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Hand out the next value and advance the counter.
    ///
    /// Returns `None` on overflow, leaving the state untouched.
    pub fn advance(&mut self) -> Option<u64> {
        let allocated = self.next_value;
        self.next_value = allocated.checked_add(1)?;
        self.version += 1;
        self.updated_at = chrono::Utc::now().timestamp_millis();
        Some(allocated)
    }
}
