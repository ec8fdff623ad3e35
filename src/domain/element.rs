//! Element types and element specifications.
//!
//! An element is one typed unit of a custom ID format. Collaborators submit
//! elements as [`ElementDraft`]s (element type as free text); the engine turns
//! them into strongly-typed [`ElementSpec`]s.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Kind of an ID element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    /// Literal text.
    #[serde(rename = "FIXED_TEXT")]
    FixedText,
    /// Uniform random integer in `[0, 999_999]`.
    #[serde(rename = "RANDOM_6DIGIT")]
    Random6Digit,
    /// Uniform random integer in `[0, 999_999_999]`.
    #[serde(rename = "RANDOM_9DIGIT")]
    Random9Digit,
    /// Uniform random integer in `[0, 2^20 - 1]`.
    #[serde(rename = "RANDOM_20BIT")]
    Random20Bit,
    /// Uniform random integer in `[0, 2^32 - 1]`.
    #[serde(rename = "RANDOM_32BIT")]
    Random32Bit,
    /// Random 128-bit identifier, hyphenated lowercase hex.
    #[serde(rename = "GUID")]
    Guid,
    /// Creation timestamp rendered through date tokens.
    #[serde(rename = "DATE_TIME")]
    DateTime,
    /// Per-inventory auto-incrementing counter.
    #[serde(rename = "SEQUENCE")]
    Sequence,
}

impl ElementType {
    /// All supported kinds, in catalogue order.
    pub const ALL: [Self; 8] = [
        Self::FixedText,
        Self::Random6Digit,
        Self::Random9Digit,
        Self::Random20Bit,
        Self::Random32Bit,
        Self::Guid,
        Self::DateTime,
        Self::Sequence,
    ];

    /// Wire name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FixedText => "FIXED_TEXT",
            Self::Random6Digit => "RANDOM_6DIGIT",
            Self::Random9Digit => "RANDOM_9DIGIT",
            Self::Random20Bit => "RANDOM_20BIT",
            Self::Random32Bit => "RANDOM_32BIT",
            Self::Guid => "GUID",
            Self::DateTime => "DATE_TIME",
            Self::Sequence => "SEQUENCE",
        }
    }

    /// Specifier given to a newly added element of this kind.
    #[must_use]
    pub const fn default_format(self) -> Option<&'static str> {
        match self {
            Self::DateTime => Some("yyyyMMdd"),
            _ if self.is_numeric() => Some("D6"),
            _ => None,
        }
    }

    /// Whether values of this kind are rendered through a numeric rule.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Random6Digit
                | Self::Random9Digit
                | Self::Random20Bit
                | Self::Random32Bit
                | Self::Sequence
        )
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EngineError::UnknownElementType(s.to_string()))
    }
}

/// Field of an element, used to locate validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementField {
    /// The `element_type` field.
    ElementType,
    /// The literal `value` field.
    Value,
    /// The `format` specifier field.
    Format,
    /// The `order` field.
    Order,
}

impl ElementField {
    /// Wire name of this field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ElementType => "element_type",
            Self::Value => "value",
            Self::Format => "format",
            Self::Order => "order",
        }
    }
}

impl std::fmt::Display for ElementField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    /// Kind of element.
    #[serde(alias = "elementType")]
    pub element_type: ElementType,

    /// Literal text, only meaningful for `FIXED_TEXT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Format specifier, ignored for `FIXED_TEXT` and `GUID`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Zero-based position within the configuration.
    #[serde(default)]
    pub order: usize,
}

impl ElementSpec {
    /// Create an element with an explicit format specifier.
    #[must_use]
    pub fn new(element_type: ElementType, format: impl Into<String>) -> Self {
        Self {
            element_type,
            value: None,
            format: Some(format.into()),
            order: 0,
        }
    }

    /// Create a `FIXED_TEXT` element.
    #[must_use]
    pub fn fixed_text(value: impl Into<String>) -> Self {
        Self {
            element_type: ElementType::FixedText,
            value: Some(value.into()),
            format: None,
            order: 0,
        }
    }

    /// Create an element of `element_type` carrying its default specifier.
    ///
    /// A `FIXED_TEXT` element starts with an empty value and is not valid
    /// until one is filled in.
    #[must_use]
    pub fn with_defaults(element_type: ElementType) -> Self {
        Self {
            element_type,
            value: (element_type == ElementType::FixedText).then(String::new),
            format: element_type.default_format().map(str::to_string),
            order: 0,
        }
    }

    /// Create a `GUID` element.
    #[must_use]
    pub const fn guid() -> Self {
        Self {
            element_type: ElementType::Guid,
            value: None,
            format: None,
            order: 0,
        }
    }

    /// Format specifier, empty when absent.
    #[must_use]
    pub fn format_str(&self) -> &str {
        self.format.as_deref().unwrap_or_default()
    }

    /// Literal value, empty when absent.
    #[must_use]
    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

/// An element as submitted by a collaborator, before type resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDraft {
    /// Kind of element, as free text.
    #[serde(alias = "elementType")]
    pub element_type: String,

    /// Literal text.
    #[serde(default)]
    pub value: Option<String>,

    /// Format specifier.
    #[serde(default)]
    pub format: Option<String>,

    /// Position; list position is used when every draft omits it.
    #[serde(default)]
    pub order: Option<usize>,
}

impl From<&ElementSpec> for ElementDraft {
    fn from(spec: &ElementSpec) -> Self {
        Self {
            element_type: spec.element_type.as_str().to_string(),
            value: spec.value.clone(),
            format: spec.format.clone(),
            order: Some(spec.order),
        }
    }
}
