//! Engine error kinds.
//!
//! Every failure of validation or rendering is one of these kinds, wrapped in a
//! [`FieldError`] that points at the offending element when there is one.

use serde_json::{Value, json};

use super::ErrorCode;
use crate::domain::ElementField;

/// Failure kinds produced by the ID generation engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Element type outside the supported catalogue.
    #[error("unknown element type: {0}")]
    UnknownElementType(String),

    /// A format specifier that does not compile.
    #[error("invalid format specifier '{specifier}': {reason}")]
    InvalidFormatSpecifier {
        /// The specifier as supplied.
        specifier: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A fixed text without value, or a format-requiring element without format.
    #[error("missing required {0}")]
    MissingRequiredValue(ElementField),

    /// More than the allowed number of elements.
    #[error("too many elements: {count} (maximum {max})")]
    TooManyElements {
        /// Number of elements supplied.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// Committed render of a configuration with no elements.
    #[error("configuration has no elements")]
    EmptyConfiguration,

    /// `order` values do not form a contiguous 0..n-1 permutation.
    #[error("invalid element order {order} (expected a permutation of 0..{len})")]
    InvalidOrder {
        /// The offending order value.
        order: usize,
        /// Number of elements in the configuration.
        len: usize,
    },

    /// The sequence allocator could not hand out a value.
    #[error("sequence allocation unavailable: {0}")]
    AllocationUnavailable(String),
}

impl EngineError {
    /// Get the error code for this error kind.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnknownElementType(_) => ErrorCode::UNKNOWN_ELEMENT_TYPE,
            Self::InvalidFormatSpecifier { .. } => ErrorCode::INVALID_FORMAT_SPECIFIER,
            Self::MissingRequiredValue(_) => ErrorCode::MISSING_REQUIRED_VALUE,
            Self::TooManyElements { .. } => ErrorCode::TOO_MANY_ELEMENTS,
            Self::EmptyConfiguration => ErrorCode::EMPTY_CONFIGURATION,
            Self::InvalidOrder { .. } => ErrorCode::INVALID_ORDER,
            Self::AllocationUnavailable(_) => ErrorCode::ALLOCATION_UNAVAILABLE,
        }
    }

    /// Short machine-readable name of the kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownElementType(_) => "UnknownElementType",
            Self::InvalidFormatSpecifier { .. } => "InvalidFormatSpecifier",
            Self::MissingRequiredValue(_) => "MissingRequiredValue",
            Self::TooManyElements { .. } => "TooManyElements",
            Self::EmptyConfiguration => "EmptyConfiguration",
            Self::InvalidOrder { .. } => "InvalidOrder",
            Self::AllocationUnavailable(_) => "AllocationUnavailable",
        }
    }
}

/// An engine error located within a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Position of the offending element, if the error concerns one.
    pub index: Option<usize>,
    /// Offending field of that element, if known.
    pub field: Option<ElementField>,
    /// What went wrong.
    pub error: EngineError,
}

impl FieldError {
    /// Error about the configuration as a whole.
    #[must_use]
    pub const fn global(error: EngineError) -> Self {
        Self {
            index: None,
            field: None,
            error,
        }
    }

    /// Error about one field of one element.
    #[must_use]
    pub const fn at(index: usize, field: ElementField, error: EngineError) -> Self {
        Self {
            index: Some(index),
            field: Some(field),
            error,
        }
    }

    /// JSON body used in API error payloads.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "index": self.index,
            "field": self.field.map(|f| f.as_str()),
            "kind": self.error.kind(),
            "code": self.error.error_code().as_i32(),
            "message": self.error.to_string(),
        })
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.index, self.field) {
            (Some(index), Some(field)) => write!(f, "element {index} {field}: {}", self.error),
            (Some(index), None) => write!(f, "element {index}: {}", self.error),
            _ => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for FieldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<EngineError> for FieldError {
    fn from(error: EngineError) -> Self {
        Self::global(error)
    }
}
