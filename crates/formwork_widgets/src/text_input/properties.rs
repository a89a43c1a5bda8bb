//! Text input properties

use std::fmt;
use std::rc::Rc;

use formwork_core::{
    identity_changed, Diffable, ExtraClasses, FocusDirective, InputType, ThemeResolver,
    ValidationResult, VNode,
};
use regex::Regex;
use smallvec::SmallVec;

use crate::aria::AriaProperties;

/// Parameterless notification (`on_blur`, `on_focus`, ...)
pub type Callback = Rc<dyn Fn()>;

/// Value notification; `None` when an absent `initial_value` was applied
pub type ValueCallback = Rc<dyn Fn(Option<&str>)>;

/// Key notification with the key code and a `prevent_default` hook
pub type KeyCallback = Rc<dyn Fn(u32, &dyn Fn())>;

/// Validation notification with `(valid, message)`
pub type ValidateCallback = Rc<dyn Fn(Option<bool>, &str)>;

/// Custom validator; `None` keeps the native result
pub type CustomValidator = Rc<dyn Fn(&str) -> Option<CustomValidity>>;

/// Renderer for leading/trailing slot content
pub type SlotRenderer = Rc<dyn Fn() -> VNode>;

/// Result of a custom validator
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CustomValidity {
    pub valid: Option<bool>,
    pub message: Option<String>,
}

impl CustomValidity {
    pub fn valid() -> Self {
        Self {
            valid: Some(true),
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: Some(false),
            message: Some(message.into()),
        }
    }
}

/// A validation pattern given as source text or as a compiled expression
///
/// Two patterns are equal when their source text is equal, whatever form
/// they were supplied in.
#[derive(Clone, Debug)]
pub enum Pattern {
    Source(String),
    Compiled(Regex),
}

impl Pattern {
    /// The pattern source text
    pub fn source(&self) -> &str {
        match self {
            Pattern::Source(source) => source,
            Pattern::Compiled(regex) => regex.as_str(),
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source() == other.source()
    }
}

impl Eq for Pattern {}

impl From<&str> for Pattern {
    fn from(source: &str) -> Self {
        Pattern::Source(source.to_string())
    }
}

impl From<String> for Pattern {
    fn from(source: String) -> Self {
        Pattern::Source(source)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Pattern::Compiled(regex)
    }
}

/// Externally supplied validity: boolean shorthand or a full result
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validity {
    Bool(bool),
    Result(ValidationResult),
}

impl Validity {
    /// The full form; shorthand `b` becomes `(Some(b), "")`
    pub fn normalized(&self) -> ValidationResult {
        match self {
            Validity::Bool(valid) => ValidationResult {
                valid: Some(*valid),
                message: String::new(),
            },
            Validity::Result(result) => result.clone(),
        }
    }
}

impl From<bool> for Validity {
    fn from(valid: bool) -> Self {
        Validity::Bool(valid)
    }
}

impl From<ValidationResult> for Validity {
    fn from(result: ValidationResult) -> Self {
        Validity::Result(result)
    }
}

/// `autocomplete` attribute: a flag or a token such as `"email"`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Autocomplete {
    Flag(bool),
    Token(String),
}

impl Autocomplete {
    /// Attribute value; flags render as `on` / `off`
    pub fn attr_value(&self) -> String {
        match self {
            Autocomplete::Flag(true) => "on".to_string(),
            Autocomplete::Flag(false) => "off".to_string(),
            Autocomplete::Token(token) => token.clone(),
        }
    }
}

impl From<bool> for Autocomplete {
    fn from(flag: bool) -> Self {
        Autocomplete::Flag(flag)
    }
}

impl From<&str> for Autocomplete {
    fn from(token: &str) -> Self {
        Autocomplete::Token(token.to_string())
    }
}

/// Properties of a [`TextInput`](super::TextInput)
///
/// Every property is optional. Callbacks are never compared when deciding
/// whether new properties need a render pass.
#[derive(Clone, Default)]
pub struct TextInputProperties {
    /// Extra ARIA attributes, keyed without the `aria-` prefix
    pub aria: AriaProperties,
    pub autocomplete: Option<Autocomplete>,
    /// Extra classes per class key
    pub classes: ExtraClasses,
    pub custom_validator: Option<CustomValidator>,
    pub disabled: bool,
    /// Parent-side focus request, consulted on commit
    pub focus: Option<FocusDirective>,
    pub helper_text: Option<String>,
    pub initial_value: Option<String>,
    pub label: Option<String>,
    pub label_hidden: bool,
    pub leading: Option<SlotRenderer>,
    pub max: Option<String>,
    pub max_length: Option<usize>,
    pub min: Option<String>,
    pub min_length: Option<usize>,
    pub name: Option<String>,
    pub pattern: Option<Pattern>,
    pub placeholder: Option<String>,
    pub read_only: bool,
    pub required: bool,
    pub step: Option<String>,
    /// Theme override; the runtime's theme is used when absent
    pub theme: Option<Rc<dyn ThemeResolver>>,
    pub trailing: Option<SlotRenderer>,
    pub input_type: InputType,
    /// The parent's copy of the last validation result
    pub valid: Option<Validity>,
    /// Id of the input element (default `text-input-{id}`)
    pub widget_id: Option<String>,

    pub on_blur: Option<Callback>,
    pub on_focus: Option<Callback>,
    pub on_click: Option<Callback>,
    pub on_over: Option<Callback>,
    pub on_out: Option<Callback>,
    pub on_key_down: Option<KeyCallback>,
    pub on_key_up: Option<KeyCallback>,
    pub on_value: Option<ValueCallback>,
    pub on_validate: Option<ValidateCallback>,
}

impl TextInputProperties {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Add an ARIA attribute (`key` without the `aria-` prefix)
    pub fn aria(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.aria.insert(key.into(), Some(value.into()));
        self
    }

    pub fn autocomplete(mut self, autocomplete: impl Into<Autocomplete>) -> Self {
        self.autocomplete = Some(autocomplete.into());
        self
    }

    /// Append an extra class for a class key
    pub fn class(mut self, key: impl Into<String>, class: impl Into<String>) -> Self {
        self.classes.entry(key.into()).or_default().push(class.into());
        self
    }

    pub fn custom_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str) -> Option<CustomValidity> + 'static,
    {
        self.custom_validator = Some(Rc::new(validator));
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn focus<F>(mut self, focus: F) -> Self
    where
        F: Fn() -> bool + 'static,
    {
        self.focus = Some(Rc::new(focus));
        self
    }

    pub fn helper_text(mut self, text: impl Into<String>) -> Self {
        self.helper_text = Some(text.into());
        self
    }

    pub fn initial_value(mut self, value: impl Into<String>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label_hidden(mut self, hidden: bool) -> Self {
        self.label_hidden = hidden;
        self
    }

    pub fn leading<F>(mut self, render: F) -> Self
    where
        F: Fn() -> VNode + 'static,
    {
        self.leading = Some(Rc::new(render));
        self
    }

    /// Maximum value; numbers and date strings are both accepted
    pub fn max(mut self, max: impl fmt::Display) -> Self {
        self.max = Some(max.to_string());
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Minimum value; numbers and date strings are both accepted
    pub fn min(mut self, min: impl fmt::Display) -> Self {
        self.min = Some(min.to_string());
        self
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn pattern(mut self, pattern: impl Into<Pattern>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Step; a number or `"any"`
    pub fn step(mut self, step: impl fmt::Display) -> Self {
        self.step = Some(step.to_string());
        self
    }

    pub fn theme(mut self, theme: impl ThemeResolver + 'static) -> Self {
        self.theme = Some(Rc::new(theme));
        self
    }

    pub fn trailing<F>(mut self, render: F) -> Self
    where
        F: Fn() -> VNode + 'static,
    {
        self.trailing = Some(Rc::new(render));
        self
    }

    pub fn input_type(mut self, input_type: InputType) -> Self {
        self.input_type = input_type;
        self
    }

    pub fn valid(mut self, valid: impl Into<Validity>) -> Self {
        self.valid = Some(valid.into());
        self
    }

    pub fn widget_id(mut self, id: impl Into<String>) -> Self {
        self.widget_id = Some(id.into());
        self
    }

    pub fn on_blur<F: Fn() + 'static>(mut self, callback: F) -> Self {
        self.on_blur = Some(Rc::new(callback));
        self
    }

    pub fn on_focus<F: Fn() + 'static>(mut self, callback: F) -> Self {
        self.on_focus = Some(Rc::new(callback));
        self
    }

    pub fn on_click<F: Fn() + 'static>(mut self, callback: F) -> Self {
        self.on_click = Some(Rc::new(callback));
        self
    }

    pub fn on_over<F: Fn() + 'static>(mut self, callback: F) -> Self {
        self.on_over = Some(Rc::new(callback));
        self
    }

    pub fn on_out<F: Fn() + 'static>(mut self, callback: F) -> Self {
        self.on_out = Some(Rc::new(callback));
        self
    }

    pub fn on_key_down<F: Fn(u32, &dyn Fn()) + 'static>(mut self, callback: F) -> Self {
        self.on_key_down = Some(Rc::new(callback));
        self
    }

    pub fn on_key_up<F: Fn(u32, &dyn Fn()) + 'static>(mut self, callback: F) -> Self {
        self.on_key_up = Some(Rc::new(callback));
        self
    }

    pub fn on_value<F: Fn(Option<&str>) + 'static>(mut self, callback: F) -> Self {
        self.on_value = Some(Rc::new(callback));
        self
    }

    pub fn on_validate<F: Fn(Option<bool>, &str) + 'static>(mut self, callback: F) -> Self {
        self.on_validate = Some(Rc::new(callback));
        self
    }

    /// The displayed validity, `(None, "")` when absent
    pub fn displayed_validity(&self) -> ValidationResult {
        self.valid
            .as_ref()
            .map(Validity::normalized)
            .unwrap_or_default()
    }

    /// Pattern source text
    pub fn pattern_source(&self) -> Option<&str> {
        self.pattern.as_ref().map(Pattern::source)
    }
}

/// Push the names of plain-data fields that differ
macro_rules! changed_fields {
    ($prev:ident, $next:ident, $keys:ident; $($field:ident),* $(,)?) => {
        $(
            if $prev.$field != $next.$field {
                $keys.push(stringify!($field));
            }
        )*
    };
}

impl Diffable for TextInputProperties {
    fn changed_keys(&self, next: &Self) -> SmallVec<[&'static str; 8]> {
        let mut keys = SmallVec::new();
        changed_fields!(self, next, keys;
            aria,
            autocomplete,
            classes,
            disabled,
            helper_text,
            initial_value,
            label,
            label_hidden,
            max,
            max_length,
            min,
            min_length,
            name,
            pattern,
            placeholder,
            read_only,
            required,
            step,
            input_type,
            valid,
            widget_id,
        );
        if identity_changed(&self.theme, &next.theme) {
            keys.push("theme");
        }
        if identity_changed(&self.leading, &next.leading) {
            keys.push("leading");
        }
        if identity_changed(&self.trailing, &next.trailing) {
            keys.push("trailing");
        }
        keys
    }
}

impl fmt::Debug for TextInputProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextInputProperties")
            .field("input_type", &self.input_type)
            .field("label", &self.label)
            .field("initial_value", &self.initial_value)
            .field("valid", &self.valid)
            .field("required", &self.required)
            .field("pattern", &self.pattern_source())
            .field("disabled", &self.disabled)
            .field("read_only", &self.read_only)
            .field("widget_id", &self.widget_id)
            .finish_non_exhaustive()
    }
}
