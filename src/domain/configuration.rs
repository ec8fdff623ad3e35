//! ID configuration: the ordered element list of one inventory.
//!
//! Configurations are values. Every editing operation returns a new
//! configuration with `order` renumbered to match list positions; nothing
//! mutates a configuration in place.

use serde::{Deserialize, Serialize};

use super::element::{ElementDraft, ElementField, ElementSpec, ElementType};
use crate::error::FieldError;

/// Maximum number of elements a committed configuration may hold.
pub const MAX_ELEMENTS: usize = 10;

/// Ordered sequence of element specifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ElementSpec>", into = "Vec<ElementSpec>")]
pub struct IdConfiguration {
    elements: Vec<ElementSpec>,
}

impl IdConfiguration {
    /// Create an empty draft configuration.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// Create a configuration from elements carrying their own `order`.
    ///
    /// Elements are sorted by `order` (stable); the values themselves are kept
    /// so that validation can reject gaps and duplicates.
    #[must_use]
    pub fn new(mut elements: Vec<ElementSpec>) -> Self {
        elements.sort_by_key(|e| e.order);
        Self { elements }
    }

    /// Create a configuration whose order is the list order.
    #[must_use]
    pub fn from_positional(elements: Vec<ElementSpec>) -> Self {
        Self::renumbered(elements)
    }

    /// Resolve collaborator drafts into a configuration.
    ///
    /// Drafts without an `order` take their list position.
    ///
    /// # Errors
    ///
    /// Returns one `UnknownElementType` error per draft whose type does not
    /// resolve.
    pub fn from_drafts(drafts: &[ElementDraft]) -> Result<Self, Vec<FieldError>> {
        let mut elements = Vec::with_capacity(drafts.len());
        let mut errors = Vec::new();

        for (index, draft) in drafts.iter().enumerate() {
            match draft.element_type.parse::<ElementType>() {
                Ok(element_type) => elements.push(ElementSpec {
                    element_type,
                    value: draft.value.clone(),
                    format: draft.format.clone(),
                    order: draft.order.unwrap_or(index),
                }),
                Err(err) => errors.push(FieldError::at(index, ElementField::ElementType, err)),
            }
        }

        if errors.is_empty() {
            Ok(Self::new(elements))
        } else {
            Err(errors)
        }
    }

    fn renumbered(mut elements: Vec<ElementSpec>) -> Self {
        for (index, element) in elements.iter_mut().enumerate() {
            element.order = index;
        }
        Self { elements }
    }

    /// Elements in render order.
    #[must_use]
    pub fn elements(&self) -> &[ElementSpec] {
        &self.elements
    }

    /// Iterate over elements in render order.
    pub fn iter(&self) -> std::slice::Iter<'_, ElementSpec> {
        self.elements.iter()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the configuration has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Position of the first element drawing from the sequence counter.
    #[must_use]
    pub fn sequence_index(&self) -> Option<usize> {
        self.elements
            .iter()
            .position(|e| e.element_type == ElementType::Sequence)
    }

    /// Append an element.
    #[must_use]
    pub fn with_element(&self, element: ElementSpec) -> Self {
        let mut elements = self.elements.clone();
        elements.push(element);
        Self::renumbered(elements)
    }

    /// Append a fresh element of `element_type` with its default specifier.
    #[must_use]
    pub fn with_new_element(&self, element_type: ElementType) -> Self {
        self.with_element(ElementSpec::with_defaults(element_type))
    }

    /// Remove the element at `index`; `None` when out of range.
    #[must_use]
    pub fn without(&self, index: usize) -> Option<Self> {
        if index >= self.elements.len() {
            return None;
        }
        let mut elements = self.elements.clone();
        elements.remove(index);
        Some(Self::renumbered(elements))
    }

    /// Replace the element at `index`; `None` when out of range.
    #[must_use]
    pub fn with_replaced(&self, index: usize, element: ElementSpec) -> Option<Self> {
        if index >= self.elements.len() {
            return None;
        }
        let mut elements = self.elements.clone();
        elements[index] = element;
        Some(Self::renumbered(elements))
    }

    /// Move the element at `from` to position `to`; `None` when out of range.
    #[must_use]
    pub fn moved(&self, from: usize, to: usize) -> Option<Self> {
        let len = self.elements.len();
        if from >= len || to >= len {
            return None;
        }
        let mut elements = self.elements.clone();
        let element = elements.remove(from);
        elements.insert(to, element);
        Some(Self::renumbered(elements))
    }
}

impl From<Vec<ElementSpec>> for IdConfiguration {
    fn from(elements: Vec<ElementSpec>) -> Self {
        Self::new(elements)
    }
}

impl From<IdConfiguration> for Vec<ElementSpec> {
    fn from(config: IdConfiguration) -> Self {
        config.elements
    }
}

impl<'a> IntoIterator for &'a IdConfiguration {
    type Item = &'a ElementSpec;
    type IntoIter = std::slice::Iter<'a, ElementSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
