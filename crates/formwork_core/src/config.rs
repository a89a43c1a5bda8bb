//! Formwork configuration
//!
//! Loaded from a `formwork.toml` file. Every section and field is optional;
//! missing values fall back to the defaults documented on each field.
//!
//! ```toml
//! [runtime]
//! max_render_passes = 16
//!
//! [theme]
//! prefix = "formwork"
//!
//! [theme.overrides]
//! "text-input.root" = "field"
//!
//! [messages]
//! value_missing = "Required"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FormworkConfig {
    pub runtime: RuntimeConfig,
    pub theme: ThemeConfig,
    pub messages: ValidationMessages,
}

impl FormworkConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "loaded formwork config");
        Ok(config)
    }
}

/// `[runtime]` section
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Render passes a single flush may run before giving up (default 16)
    pub max_render_passes: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_render_passes: 16,
        }
    }
}

/// `[theme]` section
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Class prefix (default `"formwork"`)
    pub prefix: String,
    /// `"{widget}.{key}"` -> class name
    pub overrides: BTreeMap<String, String>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            prefix: "formwork".to_string(),
            overrides: BTreeMap::new(),
        }
    }
}

/// `[messages]` section: templates for native validation messages
///
/// Templates may reference `{len}`, `{min}`, `{max}`, `{lower}` and
/// `{upper}` where the constraint provides them.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationMessages {
    pub value_missing: String,
    pub type_mismatch_email: String,
    pub type_mismatch_url: String,
    pub pattern_mismatch: String,
    pub too_long: String,
    pub too_short: String,
    pub range_underflow: String,
    pub range_overflow: String,
    pub step_mismatch: String,
    pub bad_input_number: String,
    pub bad_input_date: String,
}

impl Default for ValidationMessages {
    fn default() -> Self {
        Self {
            value_missing: "Please fill out this field.".into(),
            type_mismatch_email: "Please enter an email address.".into(),
            type_mismatch_url: "Please enter a URL.".into(),
            pattern_mismatch: "Please match the requested format.".into(),
            too_long: "Please shorten this text to {max} characters or less (you are currently using {len} characters).".into(),
            too_short: "Please lengthen this text to {min} characters or more (you are currently using {len} characters).".into(),
            range_underflow: "Value must be greater than or equal to {min}.".into(),
            range_overflow: "Value must be less than or equal to {max}.".into(),
            step_mismatch: "Please enter a valid value. The two nearest valid values are {lower} and {upper}.".into(),
            bad_input_number: "Please enter a number.".into(),
            bad_input_date: "Please enter a valid date.".into(),
        }
    }
}

impl ValidationMessages {
    /// Fill `{name}` placeholders in a template
    pub fn format(template: &str, args: &[(&str, String)]) -> String {
        let mut message = template.to_string();
        for (name, value) in args {
            message = message.replace(&format!("{{{}}}", name), value);
        }
        message
    }
}
