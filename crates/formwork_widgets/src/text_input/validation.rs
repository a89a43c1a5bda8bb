//! Validation pipeline
//!
//! Runs on every render pass, in order:
//!
//! 1. Without an `on_validate` callback nothing is evaluated.
//! 2. An empty value on a pristine field is neutral `(None, "")` and leaves
//!    the field pristine.
//! 3. Otherwise the field becomes dirty and the validity service checks the
//!    value. Only a natively valid value is handed to the custom validator,
//!    whose result replaces the native one.
//! 4. The parent is notified only when the result differs from the `valid`
//!    property it currently supplies.
//!
//! Step 4 compares against the parent's property, not against the previous
//! result. A parent that does not echo results back as `valid` is notified
//! on every pass.

use formwork_core::{CacheHandle, Constraints, ValidationResult, ValidityService};

use super::properties::{CustomValidator, ValidateCallback, Validity};
use super::reconcile::DIRTY;

/// Element key the validity service checks
pub const INPUT_KEY: &str = "input";

/// Inputs of one pipeline run
pub struct ValidationInput<'a> {
    /// Working value after reconciliation
    pub value: Option<&'a str>,
    /// Dirty flag as read at the start of the pass
    pub dirty: bool,
    pub constraints: &'a Constraints,
    pub custom_validator: Option<&'a CustomValidator>,
    /// The parent's copy of the last result
    pub current: Option<&'a Validity>,
}

/// Steps 2 and 3: compute the result, marking the field dirty when it is
/// evaluated
pub fn evaluate(
    cache: &CacheHandle,
    validity: &dyn ValidityService,
    input: &ValidationInput<'_>,
) -> ValidationResult {
    let value = input.value.unwrap_or("");
    if value.is_empty() && !input.dirty {
        return ValidationResult::neutral();
    }

    cache.set(DIRTY, true);
    let mut result = validity.check(INPUT_KEY, value, input.constraints);
    if result.valid == Some(true) {
        if let Some(custom) = input.custom_validator.and_then(|validator| validator(value)) {
            result = ValidationResult {
                valid: custom.valid,
                message: custom.message.unwrap_or_default(),
            };
        }
    }
    result
}

/// Step 4: whether `result` differs from the parent's current `valid`
///
/// An absent property never matches.
pub fn should_notify(result: &ValidationResult, current: Option<&Validity>) -> bool {
    match current {
        Some(current) => current.normalized() != *result,
        None => true,
    }
}

/// Run the whole pipeline
///
/// Returns the computed result, or `None` when there is no `on_validate`
/// callback and nothing was evaluated.
pub fn run(
    cache: &CacheHandle,
    validity: &dyn ValidityService,
    input: &ValidationInput<'_>,
    on_validate: Option<&ValidateCallback>,
) -> Option<ValidationResult> {
    let on_validate = on_validate?;
    let result = evaluate(cache, validity, input);

    if should_notify(&result, input.current) {
        tracing::debug!(
            instance = ?cache.instance(),
            valid = ?result.valid,
            message = %result.message,
            "validation changed"
        );
        on_validate(result.valid, &result.message);
    }
    Some(result)
}
