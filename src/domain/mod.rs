//! Domain models for the custom ID engine.
//!
//! This module contains the core domain types representing ID elements,
//! configurations, sequence counters, and API contracts.

pub mod configuration;
pub mod dto;
pub mod element;
pub mod sequence;

pub use configuration::{IdConfiguration, MAX_ELEMENTS};
pub use dto::{
    ApiResponse, ElementTypeResponse, ElementsRequest, GenerateResponse, HealthResponse,
    OptionalElementsRequest, PreviewResponse, ReadyComponents, ReadyResponse, SequenceResponse,
    StoredConfiguration, ValidationResponse,
};
pub use element::{ElementDraft, ElementField, ElementSpec, ElementType};
pub use sequence::{InventoryId, SequenceState};
