//! Configuration validation.
//!
//! Collects every problem of a configuration as a field-indexed error so that
//! a caller can point at each offending element at once.

use crate::domain::{
    ElementDraft, ElementField, ElementSpec, ElementType, IdConfiguration, MAX_ELEMENTS,
};
use crate::error::{EngineError, FieldError};
use crate::service::registry::describe;
use crate::service::renderer::RenderMode;
use crate::service::specifier::RuleCache;

/// Validate `config` for rendering in `mode`.
///
/// Preview tolerates an empty configuration; commit does not. Formats are
/// compiled through `cache`, so a later render reuses the compiled rules.
///
/// # Errors
///
/// Returns every violation found, configuration-wide errors first.
pub fn validate(
    config: &IdConfiguration,
    mode: RenderMode,
    cache: &RuleCache,
) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    let len = config.len();

    if len > MAX_ELEMENTS {
        errors.push(FieldError::global(EngineError::TooManyElements {
            count: len,
            max: MAX_ELEMENTS,
        }));
    }
    if len == 0 && mode == RenderMode::Commit {
        errors.push(FieldError::global(EngineError::EmptyConfiguration));
    }

    // Elements are kept sorted by order, so a permutation of 0..n-1 means
    // position and order agree everywhere.
    for (index, element) in config.iter().enumerate() {
        if element.order != index {
            errors.push(FieldError::at(
                index,
                ElementField::Order,
                EngineError::InvalidOrder {
                    order: element.order,
                    len,
                },
            ));
        }
    }

    for (index, element) in config.iter().enumerate() {
        check_element(index, element, cache, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Resolve and validate collaborator drafts for rendering in `mode`.
///
/// When some element types do not resolve, the remaining drafts are still
/// checked, so the caller gets unknown types and value or format problems in
/// one pass. Order is only checked once every type resolves.
///
/// # Errors
///
/// Returns every violation found, configuration-wide errors first, then by
/// draft position.
pub fn validate_drafts(
    drafts: &[ElementDraft],
    mode: RenderMode,
    cache: &RuleCache,
) -> Result<IdConfiguration, Vec<FieldError>> {
    if let Ok(config) = IdConfiguration::from_drafts(drafts) {
        return validate(&config, mode, cache).map(|()| config);
    }

    let mut errors = Vec::new();
    if drafts.len() > MAX_ELEMENTS {
        errors.push(FieldError::global(EngineError::TooManyElements {
            count: drafts.len(),
            max: MAX_ELEMENTS,
        }));
    }

    for (index, draft) in drafts.iter().enumerate() {
        match draft.element_type.parse::<ElementType>() {
            Ok(element_type) => {
                let element = ElementSpec {
                    element_type,
                    value: draft.value.clone(),
                    format: draft.format.clone(),
                    order: index,
                };
                check_element(index, &element, cache, &mut errors);
            }
            Err(err) => errors.push(FieldError::at(index, ElementField::ElementType, err)),
        }
    }

    Err(errors)
}

fn check_element(
    index: usize,
    element: &ElementSpec,
    cache: &RuleCache,
    errors: &mut Vec<FieldError>,
) {
    let descriptor = describe(element.element_type);

    if descriptor.requires_value && element.value_str().trim().is_empty() {
        errors.push(FieldError::at(
            index,
            ElementField::Value,
            EngineError::MissingRequiredValue(ElementField::Value),
        ));
    }

    if descriptor.requires_format && element.format_str().is_empty() {
        errors.push(FieldError::at(
            index,
            ElementField::Format,
            EngineError::MissingRequiredValue(ElementField::Format),
        ));
        return;
    }

    if let Err(err) = cache.get_or_compile(element.element_type, element.format_str()) {
        errors.push(FieldError::at(index, ElementField::Format, err));
    }
}
