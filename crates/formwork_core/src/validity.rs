//! Native-style validity checks
//!
//! A [`ValidityService`] evaluates a value against the constraints declared
//! on an input element and returns a [`ValidationResult`]. [`NativeValidity`]
//! follows HTML constraint validation: the first failing check wins, in
//! this order:
//!
//! 1. `required` and empty → value missing
//! 2. empty and not required → valid, nothing else is checked
//! 3. `number` / `date` values that do not parse → bad input
//! 4. `email` / `url` values that are malformed → type mismatch
//! 5. `pattern` (anchored full match) → pattern mismatch
//! 6. `max_length` / `min_length` (counted in chars) → too long / too short
//! 7. `min` / `max` → range underflow / overflow
//! 8. `step` (numbers only, base `min` or 0, `any` disables) → step mismatch
//!
//! Pattern and length constraints apply to textual types only; range and step
//! constraints apply to `number` (and range to `date`), as in HTML.
//!
//! # Example
//!
//! ```rust
//! use formwork_core::validity::{Constraints, InputType, NativeValidity, ValidityService};
//!
//! let validity = NativeValidity::default();
//! let constraints = Constraints {
//!     input_type: InputType::Email,
//!     required: true,
//!     ..Constraints::default()
//! };
//!
//! assert_eq!(validity.check("input", "x@y.com", &constraints).valid, Some(true));
//! assert_eq!(validity.check("input", "x", &constraints).valid, Some(false));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::config::ValidationMessages;

/// HTML input types supported by text inputs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InputType {
    /// Plain text input (default)
    #[default]
    Text,
    /// Email address
    Email,
    /// Numeric input
    Number,
    /// Masked text
    Password,
    /// Search field
    Search,
    /// Telephone number
    Tel,
    /// URL
    Url,
    /// Calendar date (`YYYY-MM-DD`)
    Date,
}

impl InputType {
    /// All supported types
    pub const ALL: [InputType; 8] = [
        InputType::Text,
        InputType::Email,
        InputType::Number,
        InputType::Password,
        InputType::Search,
        InputType::Tel,
        InputType::Url,
        InputType::Date,
    ];

    /// The HTML `type` attribute value
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Email => "email",
            InputType::Number => "number",
            InputType::Password => "password",
            InputType::Search => "search",
            InputType::Tel => "tel",
            InputType::Url => "url",
            InputType::Date => "date",
        }
    }

    /// Whether `pattern`, `minlength` and `maxlength` apply
    pub fn is_textual(&self) -> bool {
        !matches!(self, InputType::Number | InputType::Date)
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown input type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown input type `{0}` (expected one of text, email, number, password, search, tel, url, date)")]
pub struct ParseInputTypeError(pub String);

impl FromStr for InputType {
    type Err = ParseInputTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InputType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseInputTypeError(s.to_string()))
    }
}

/// Outcome of validating a value
///
/// `valid: None` is the neutral "not evaluated" state and is distinct from
/// both `Some(false)` and `Some(true)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: Option<bool>,
    pub message: String,
}

impl ValidationResult {
    /// Not evaluated: `(None, "")`
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Valid: `(Some(true), "")`
    pub fn valid() -> Self {
        Self {
            valid: Some(true),
            message: String::new(),
        }
    }

    /// Invalid with a message
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: Some(false),
            message: message.into(),
        }
    }
}

/// Constraints declared on an input element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Constraints {
    pub input_type: InputType,
    pub required: bool,
    /// Pattern source text (matched against the whole value)
    pub pattern: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub step: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

/// Validity-check collaborator
pub trait ValidityService {
    /// Validate `value` for the element keyed `element_key`
    fn check(&self, element_key: &str, value: &str, constraints: &Constraints)
        -> ValidationResult;
}

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email regex is valid")
});

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:\S+$").expect("url regex is valid")
});

/// HTML-style constraint validation
pub struct NativeValidity {
    messages: ValidationMessages,
    /// Compiled patterns by source; None for sources that failed to compile
    patterns: RefCell<FxHashMap<String, Option<Regex>>>,
}

impl Default for NativeValidity {
    fn default() -> Self {
        Self::new(ValidationMessages::default())
    }
}

impl NativeValidity {
    /// Create a validator using the given message templates
    pub fn new(messages: ValidationMessages) -> Self {
        Self {
            messages,
            patterns: RefCell::new(FxHashMap::default()),
        }
    }

    /// Message templates in use
    pub fn messages(&self) -> &ValidationMessages {
        &self.messages
    }

    /// Full-match test against a pattern; uncompilable patterns match anything
    fn matches_pattern(&self, pattern: &str, value: &str) -> bool {
        let mut patterns = self.patterns.borrow_mut();
        let compiled = patterns.entry(pattern.to_string()).or_insert_with(|| {
            // Validate the bare source: wrapping can balance stray parentheses
            match Regex::new(pattern) {
                Ok(_) => Regex::new(&format!("^(?:{})$", pattern)).ok(),
                Err(err) => {
                    tracing::warn!(pattern, %err, "ignoring invalid pattern constraint");
                    None
                }
            }
        });
        compiled.as_ref().map_or(true, |regex| regex.is_match(value))
    }

    fn check_bad_input(&self, value: &str, constraints: &Constraints) -> Option<String> {
        match constraints.input_type {
            InputType::Number if parse_number(value).is_none() => {
                Some(self.messages.bad_input_number.clone())
            }
            InputType::Date if parse_date(value).is_none() => {
                Some(self.messages.bad_input_date.clone())
            }
            _ => None,
        }
    }

    fn check_type_mismatch(&self, value: &str, constraints: &Constraints) -> Option<String> {
        match constraints.input_type {
            InputType::Email if !EMAIL.is_match(value) => {
                Some(self.messages.type_mismatch_email.clone())
            }
            InputType::Url if !URL.is_match(value) => Some(self.messages.type_mismatch_url.clone()),
            _ => None,
        }
    }

    fn check_textual(&self, value: &str, constraints: &Constraints) -> Option<String> {
        if !constraints.input_type.is_textual() {
            return None;
        }
        if let Some(pattern) = &constraints.pattern {
            if !self.matches_pattern(pattern, value) {
                return Some(self.messages.pattern_mismatch.clone());
            }
        }

        let len = value.chars().count();
        if let Some(max) = constraints.max_length {
            if len > max {
                return Some(ValidationMessages::format(
                    &self.messages.too_long,
                    &[("max", max.to_string()), ("len", len.to_string())],
                ));
            }
        }
        if let Some(min) = constraints.min_length {
            if len < min {
                return Some(ValidationMessages::format(
                    &self.messages.too_short,
                    &[("min", min.to_string()), ("len", len.to_string())],
                ));
            }
        }
        None
    }

    fn check_range(&self, value: &str, constraints: &Constraints) -> Option<String> {
        let below = |bound: &str| match constraints.input_type {
            InputType::Number => match (parse_number(value), parse_number(bound)) {
                (Some(value), Some(bound)) => value < bound,
                _ => false,
            },
            InputType::Date => match (parse_date(value), parse_date(bound)) {
                (Some(value), Some(bound)) => value < bound,
                _ => false,
            },
            _ => false,
        };
        let above = |bound: &str| match constraints.input_type {
            InputType::Number => match (parse_number(value), parse_number(bound)) {
                (Some(value), Some(bound)) => value > bound,
                _ => false,
            },
            InputType::Date => match (parse_date(value), parse_date(bound)) {
                (Some(value), Some(bound)) => value > bound,
                _ => false,
            },
            _ => false,
        };

        if let Some(min) = &constraints.min {
            if below(min) {
                return Some(ValidationMessages::format(
                    &self.messages.range_underflow,
                    &[("min", min.clone())],
                ));
            }
        }
        if let Some(max) = &constraints.max {
            if above(max) {
                return Some(ValidationMessages::format(
                    &self.messages.range_overflow,
                    &[("max", max.clone())],
                ));
            }
        }
        None
    }

    fn check_step(&self, value: &str, constraints: &Constraints) -> Option<String> {
        if constraints.input_type != InputType::Number {
            return None;
        }
        let step = constraints.step.as_deref()?;
        if step.eq_ignore_ascii_case("any") {
            return None;
        }
        let step = parse_number(step).filter(|step| *step > 0.0)?;
        let value = parse_number(value)?;
        let base = constraints
            .min
            .as_deref()
            .and_then(parse_number)
            .unwrap_or(0.0);

        let steps = (value - base) / step;
        if (steps - steps.round()).abs() <= 1e-9 {
            return None;
        }
        let lower = base + steps.floor() * step;
        let upper = base + steps.ceil() * step;
        let decimals = decimal_places(step).max(decimal_places(base));
        Some(ValidationMessages::format(
            &self.messages.step_mismatch,
            &[
                ("lower", format_number(lower, decimals)),
                ("upper", format_number(upper, decimals)),
            ],
        ))
    }
}

impl ValidityService for NativeValidity {
    fn check(
        &self,
        _element_key: &str,
        value: &str,
        constraints: &Constraints,
    ) -> ValidationResult {
        if value.is_empty() {
            return if constraints.required {
                ValidationResult::invalid(self.messages.value_missing.clone())
            } else {
                ValidationResult::valid()
            };
        }

        self.check_bad_input(value, constraints)
            .or_else(|| self.check_type_mismatch(value, constraints))
            .or_else(|| self.check_textual(value, constraints))
            .or_else(|| self.check_range(value, constraints))
            .or_else(|| self.check_step(value, constraints))
            .map_or_else(ValidationResult::valid, ValidationResult::invalid)
    }
}

impl fmt::Debug for NativeValidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeValidity")
            .field("messages", &self.messages)
            .field("cached_patterns", &self.patterns.borrow().len())
            .finish()
    }
}

/// Parse a finite floating-point number the way number inputs accept it
fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse `YYYY-MM-DD` into a comparable `(year, month, day)`
fn parse_date(value: &str) -> Option<(u32, u32, u32)> {
    let mut parts = value.split('-');
    let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || year.len() != 4 || month.len() != 2 || day.len() != 2 {
        return None;
    }
    if ![year, month, day]
        .iter()
        .all(|part| part.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }
    let (year, month, day): (u32, u32, u32) =
        (year.parse().ok()?, month.parse().ok()?, day.parse().ok()?);
    if year == 0 || !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
        return None;
    }
    Some((year, month, day))
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        _ => 31,
    }
}

/// Fractional digits needed to write `value` exactly (at most 15)
fn decimal_places(value: f64) -> usize {
    (0..=15)
        .find(|&places| {
            let scaled = value * 10f64.powi(places as i32);
            (scaled - scaled.round()).abs() <= 1e-9 * scaled.abs()
        })
        .unwrap_or(15)
}

/// Render a step boundary at the step's precision (`0.3` rather than
/// `0.30000000000000004`)
fn format_number(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value);
    let text = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text.as_str()
    };
    match text {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(value: &str, constraints: Constraints) -> ValidationResult {
        NativeValidity::default().check("input", value, &constraints)
    }

    fn of_type(input_type: InputType) -> Constraints {
        Constraints {
            input_type,
            ..Constraints::default()
        }
    }

    #[test]
    fn test_input_type_parse_and_display() {
        assert_eq!("email".parse::<InputType>(), Ok(InputType::Email));
        assert_eq!("DATE".parse::<InputType>(), Ok(InputType::Date));
        assert!("color".parse::<InputType>().is_err());
        assert_eq!(InputType::Tel.to_string(), "tel");
        assert_eq!(InputType::default(), InputType::Text);
    }

    #[test]
    fn test_required() {
        let required = Constraints {
            required: true,
            ..Constraints::default()
        };
        assert_eq!(
            check("", required.clone()),
            ValidationResult::invalid("Please fill out this field.")
        );
        assert_eq!(check("a", required), ValidationResult::valid());
        assert_eq!(check("", Constraints::default()), ValidationResult::valid());
    }

    #[test]
    fn test_empty_skips_other_constraints() {
        let constraints = Constraints {
            input_type: InputType::Email,
            pattern: Some("[0-9]+".into()),
            min_length: Some(3),
            ..Constraints::default()
        };
        assert_eq!(check("", constraints), ValidationResult::valid());
    }

    #[test]
    fn test_email() {
        let email = of_type(InputType::Email);
        assert_eq!(
            check("x", email.clone()),
            ValidationResult::invalid("Please enter an email address.")
        );
        assert_eq!(check("x@y.com", email.clone()), ValidationResult::valid());
        assert_eq!(check("x@localhost", email.clone()), ValidationResult::valid());
        assert_eq!(check("x@", email.clone()).valid, Some(false));
        assert_eq!(check("x y@z.com", email).valid, Some(false));
    }

    #[test]
    fn test_url() {
        let url = of_type(InputType::Url);
        assert_eq!(check("https://example.com", url.clone()), ValidationResult::valid());
        assert_eq!(check("mailto:a@b", url.clone()), ValidationResult::valid());
        assert_eq!(
            check("example", url),
            ValidationResult::invalid("Please enter a URL.")
        );
    }

    #[test]
    fn test_pattern_is_anchored() {
        let constraints = Constraints {
            pattern: Some("[a-z]+".into()),
            ..Constraints::default()
        };
        assert_eq!(check("abc", constraints.clone()), ValidationResult::valid());
        assert_eq!(
            check("abc1", constraints.clone()),
            ValidationResult::invalid("Please match the requested format.")
        );

        // Alternation stays inside the anchors
        let constraints = Constraints {
            pattern: Some("a|b".into()),
            ..Constraints::default()
        };
        assert_eq!(check("ab", constraints).valid, Some(false));
    }

    #[test]
    fn test_invalid_pattern_is_ignored() {
        let constraints = Constraints {
            pattern: Some("([".into()),
            ..Constraints::default()
        };
        assert_eq!(check("anything", constraints), ValidationResult::valid());
    }

    #[test]
    fn test_pattern_not_applied_to_numbers() {
        let constraints = Constraints {
            input_type: InputType::Number,
            pattern: Some("[a-z]+".into()),
            ..Constraints::default()
        };
        assert_eq!(check("12", constraints), ValidationResult::valid());
    }

    #[test]
    fn test_lengths_count_chars() {
        let constraints = Constraints {
            min_length: Some(2),
            max_length: Some(3),
            ..Constraints::default()
        };
        assert_eq!(
            check("a", constraints.clone()),
            ValidationResult::invalid(
                "Please lengthen this text to 2 characters or more (you are currently using 1 characters)."
            )
        );
        assert_eq!(check("héé", constraints.clone()), ValidationResult::valid());
        assert_eq!(
            check("abcd", constraints),
            ValidationResult::invalid(
                "Please shorten this text to 3 characters or less (you are currently using 4 characters)."
            )
        );
    }

    #[test]
    fn test_number_bad_input_and_range() {
        let constraints = Constraints {
            input_type: InputType::Number,
            min: Some("1".into()),
            max: Some("10".into()),
            ..Constraints::default()
        };
        assert_eq!(
            check("abc", constraints.clone()),
            ValidationResult::invalid("Please enter a number.")
        );
        assert_eq!(
            check("0", constraints.clone()),
            ValidationResult::invalid("Value must be greater than or equal to 1.")
        );
        assert_eq!(
            check("11", constraints.clone()),
            ValidationResult::invalid("Value must be less than or equal to 10.")
        );
        assert_eq!(check("10", constraints.clone()), ValidationResult::valid());
        assert_eq!(check("inf", constraints).valid, Some(false));
    }

    #[test]
    fn test_step() {
        let constraints = Constraints {
            input_type: InputType::Number,
            min: Some("1".into()),
            step: Some("2".into()),
            ..Constraints::default()
        };
        assert_eq!(check("5", constraints.clone()), ValidationResult::valid());
        assert_eq!(
            check("4", constraints.clone()),
            ValidationResult::invalid(
                "Please enter a valid value. The two nearest valid values are 3 and 5."
            )
        );

        let decimal = Constraints {
            input_type: InputType::Number,
            step: Some("0.1".into()),
            ..Constraints::default()
        };
        assert_eq!(check("0.3", decimal), ValidationResult::valid());

        let any = Constraints {
            input_type: InputType::Number,
            step: Some("any".into()),
            ..Constraints::default()
        };
        assert_eq!(check("0.123", any), ValidationResult::valid());
    }

    #[test]
    fn test_date() {
        let constraints = Constraints {
            input_type: InputType::Date,
            min: Some("2024-01-01".into()),
            max: Some("2024-12-31".into()),
            ..Constraints::default()
        };
        assert_eq!(check("2024-02-29", constraints.clone()), ValidationResult::valid());
        assert_eq!(
            check("2023-02-29", constraints.clone()),
            ValidationResult::invalid("Please enter a valid date.")
        );
        assert_eq!(check("2024-1-01", constraints.clone()).valid, Some(false));
        assert_eq!(
            check("2023-12-31", constraints.clone()),
            ValidationResult::invalid("Value must be greater than or equal to 2024-01-01.")
        );
        assert_eq!(
            check("2025-01-01", constraints),
            ValidationResult::invalid("Value must be less than or equal to 2024-12-31.")
        );
    }

    #[test]
    fn test_custom_messages() {
        let messages = ValidationMessages {
            value_missing: "Required".into(),
            ..ValidationMessages::default()
        };
        let validity = NativeValidity::new(messages);
        let constraints = Constraints {
            required: true,
            ..Constraints::default()
        };
        assert_eq!(
            validity.check("input", "", &constraints),
            ValidationResult::invalid("Required")
        );
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0, 0), "3");
        assert_eq!(format_number(0.30000000000000004, 1), "0.3");
        assert_eq!(format_number(-2.5, 1), "-2.5");
        assert_eq!(format_number(-0.0, 2), "0");
        assert_eq!(decimal_places(2.0), 0);
        assert_eq!(decimal_places(0.1), 1);
        assert_eq!(decimal_places(0.0000000001), 10);
    }

    #[test]
    fn test_step_boundaries_keep_step_precision() {
        let constraints = Constraints {
            input_type: InputType::Number,
            step: Some("0.0000000001".into()),
            ..Constraints::default()
        };
        assert_eq!(
            check("0.00000000015", constraints),
            ValidationResult::invalid(
                "Please enter a valid value. The two nearest valid values are 0.0000000001 and 0.0000000002."
            )
        );
    }

    #[test]
    fn test_pattern_invalid_on_its_own_is_ignored() {
        // Anchoring would turn this into `^(?:a)|(b)$`, which compiles
        let constraints = Constraints {
            pattern: Some("a)|(b".into()),
            ..Constraints::default()
        };
        assert_eq!(check("zzz", constraints.clone()), ValidationResult::valid());
        assert_eq!(check("a-anything-trailing", constraints), ValidationResult::valid());
    }
}
