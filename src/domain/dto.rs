//! Data Transfer Objects for API requests and responses.

use serde::{Deserialize, Serialize};

use super::configuration::IdConfiguration;
use super::element::ElementDraft;
use super::sequence::InventoryId;

/// Standard API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response code (0 = success, non-zero = error).
    pub code: i32,

    /// Human-readable message.
    pub message: String,

    /// Response data (null on error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a success response.
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Create a success response with no data.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data: None,
        }
    }
}

/// Request body carrying an element list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElementsRequest {
    /// Elements as submitted.
    #[serde(default)]
    pub elements: Vec<ElementDraft>,
}

/// Request body whose element list is optional (falls back to the stored one).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionalElementsRequest {
    /// Elements as submitted, if any.
    #[serde(default)]
    pub elements: Option<Vec<ElementDraft>>,
}

/// Preview response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    /// Example identifier; empty for an empty configuration.
    pub preview: String,
}

/// Committed identifier response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Inventory the identifier was generated for.
    pub inventory_id: InventoryId,

    /// The identifier.
    pub custom_id: String,
}

/// Validation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Always true; failures are reported as errors.
    pub valid: bool,

    /// Number of elements validated.
    pub element_count: usize,
}

/// Stored configuration of one inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfiguration {
    /// Owning inventory.
    pub inventory_id: InventoryId,

    /// Elements in render order.
    pub elements: IdConfiguration,

    /// Last save (RFC 3339).
    pub updated_at: String,
}

impl StoredConfiguration {
    /// Wrap a configuration with the current time.
    #[must_use]
    pub fn new(inventory_id: InventoryId, elements: IdConfiguration) -> Self {
        Self {
            inventory_id,
            elements,
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Sequence counter response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceResponse {
    /// Inventory the counter belongs to.
    pub inventory_id: InventoryId,

    /// Value the next committed render would receive.
    pub next_value: u64,

    /// Whether the counter has been created yet.
    pub initialized: bool,
}

/// Element type catalogue entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementTypeResponse {
    /// Wire name.
    pub element_type: String,
    /// Display label.
    pub label: String,
    /// One-line description.
    pub description: String,
    /// Format guidance.
    pub help_text: String,
    /// Whether a literal value is required.
    pub requires_value: bool,
    /// Whether a format specifier is required.
    pub requires_format: bool,
    /// Upper bound on occurrences, `null` when unbounded.
    pub max_occurrences: Option<usize>,
    /// Specifier applied when an element is added without one.
    pub default_format: Option<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,

    /// Service version.
    pub version: String,
}

/// Readiness check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyResponse {
    /// Overall readiness status.
    pub ready: bool,

    /// Individual component statuses.
    pub components: ReadyComponents,
}

/// Component readiness statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyComponents {
    /// Storage backend status.
    pub storage: bool,
}
