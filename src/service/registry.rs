//! Element type registry.
//!
//! Static catalogue of the supported element kinds and their structural
//! constraints.

use crate::domain::{ElementType, ElementTypeResponse};
use crate::error::EngineError;

/// Structural constraints and presentation metadata of one element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementDescriptor {
    /// Kind described.
    pub element_type: ElementType,
    /// Whether a non-empty literal value is required.
    pub requires_value: bool,
    /// Whether a non-empty format specifier is required.
    pub requires_format: bool,
    /// Occurrence bound within a configuration; `None` leaves only the
    /// configuration length cap.
    pub max_occurrences: Option<usize>,
    /// Specifier applied when an element is added without one.
    pub default_format: Option<&'static str>,
    /// Display label.
    pub label: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Format guidance.
    pub help_text: &'static str,
}

/// Describe an element kind.
#[must_use]
pub const fn describe(element_type: ElementType) -> ElementDescriptor {
    match element_type {
        ElementType::FixedText => ElementDescriptor {
            element_type,
            requires_value: true,
            requires_format: false,
            max_occurrences: None,
            default_format: element_type.default_format(),
            label: "Fixed Text",
            description: "Static text",
            help_text: "Enter any text (supports Unicode characters)",
        },
        ElementType::Random6Digit => numeric(
            element_type,
            "6-Digit Random",
            "Random 6-digit number",
            "Format: D6 for zero-padded (e.g., 000123), X5 for hexadecimal",
        ),
        ElementType::Random9Digit => numeric(
            element_type,
            "9-Digit Random",
            "Random 9-digit number",
            "Format: D9 for zero-padded, X8 for hexadecimal",
        ),
        ElementType::Random20Bit => numeric(
            element_type,
            "20-bit Random",
            "20-bit random",
            "Format: D7 for zero-padded decimal, X5 for hexadecimal",
        ),
        ElementType::Random32Bit => numeric(
            element_type,
            "32-bit Random",
            "32-bit random",
            "Format: D10 for zero-padded decimal, X8 for hexadecimal",
        ),
        ElementType::Guid => ElementDescriptor {
            element_type,
            requires_value: false,
            requires_format: false,
            max_occurrences: None,
            default_format: element_type.default_format(),
            label: "GUID",
            description: "UUID",
            help_text: "Generates a standard UUID (e.g., 550e8400-e29b-41d4-a716-446655440000)",
        },
        ElementType::DateTime => ElementDescriptor {
            element_type,
            requires_value: false,
            requires_format: true,
            max_occurrences: None,
            default_format: element_type.default_format(),
            label: "Date/Time",
            description: "Creation timestamp (UTC)",
            help_text: "Tokens: yyyy (year), MM (month), dd (day), HH (hour), mm (minute), ss (second). Example: yyyyMMdd gives 20251015",
        },
        ElementType::Sequence => numeric(
            element_type,
            "Sequence",
            "Auto-increment",
            "Format: D4 for zero-padded (e.g., 0001, 0002)",
        ),
    }
}

const fn numeric(
    element_type: ElementType,
    label: &'static str,
    description: &'static str,
    help_text: &'static str,
) -> ElementDescriptor {
    ElementDescriptor {
        element_type,
        requires_value: false,
        requires_format: true,
        max_occurrences: None,
        default_format: element_type.default_format(),
        label,
        description,
        help_text,
    }
}

/// Describe an element kind given by its wire name.
///
/// # Errors
///
/// Returns `UnknownElementType` for any name outside the catalogue.
pub fn describe_name(name: &str) -> Result<ElementDescriptor, EngineError> {
    name.parse::<ElementType>().map(describe)
}

/// The whole catalogue, in display order.
#[must_use]
pub fn catalog() -> Vec<ElementDescriptor> {
    ElementType::ALL.into_iter().map(describe).collect()
}

impl From<ElementDescriptor> for ElementTypeResponse {
    fn from(d: ElementDescriptor) -> Self {
        Self {
            element_type: d.element_type.as_str().to_string(),
            label: d.label.to_string(),
            description: d.description.to_string(),
            help_text: d.help_text.to_string(),
            requires_value: d.requires_value,
            requires_format: d.requires_format,
            max_occurrences: d.max_occurrences,
            default_format: d.default_format.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirements() {
        let fixed = describe(ElementType::FixedText);
        assert!(fixed.requires_value);
        assert!(!fixed.requires_format);

        let guid = describe(ElementType::Guid);
        assert!(!guid.requires_value);
        assert!(!guid.requires_format);

        for kind in [
            ElementType::Random6Digit,
            ElementType::Random9Digit,
            ElementType::Random20Bit,
            ElementType::Random32Bit,
            ElementType::DateTime,
            ElementType::Sequence,
        ] {
            let d = describe(kind);
            assert!(d.requires_format, "{kind} should require a format");
            assert!(!d.requires_value, "{kind} should not require a value");
        }
    }

    #[test]
    fn test_no_kind_is_capped() {
        assert!(
            catalog()
                .iter()
                .all(|d| d.max_occurrences.is_none())
        );
    }

    #[test]
    fn test_default_formats() {
        assert_eq!(describe(ElementType::Sequence).default_format, Some("D6"));
        assert_eq!(
            describe(ElementType::DateTime).default_format,
            Some("yyyyMMdd")
        );
        assert_eq!(describe(ElementType::Guid).default_format, None);
    }

    #[test]
    fn test_describe_name() {
        assert_eq!(
            describe_name("SEQUENCE").unwrap().element_type,
            ElementType::Sequence
        );
        assert!(matches!(
            describe_name("UUID"),
            Err(EngineError::UnknownElementType(name)) if name == "UUID"
        ));
    }

    #[test]
    fn test_catalog_covers_all_kinds() {
        let kinds: Vec<_> = catalog().into_iter().map(|d| d.element_type).collect();
        assert_eq!(kinds, ElementType::ALL.to_vec());

        let response = ElementTypeResponse::from(describe(ElementType::FixedText));
        assert_eq!(response.element_type, "FIXED_TEXT");
        assert_eq!(response.max_occurrences, None);
    }
}
