//! Theme class resolution
//!
//! Widgets name their styling hooks with abstract class keys (`root`,
//! `wrapper`, `invalid`, ...). A [`ThemeResolver`] turns a `(widget, key)`
//! pair into the class name that ends up on the node. The resolution scheme
//! is opaque to widgets.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::config::ThemeConfig;

/// Extra classes a caller appends per class key, e.g. `"root" -> ["card"]`
pub type ExtraClasses = IndexMap<String, Vec<String>>;

/// Resolves abstract class keys to class names
pub trait ThemeResolver {
    /// Class name for `key` of `widget`
    fn class(&self, widget: &str, key: &str) -> String;
}

/// Default resolver: `{prefix}-{widget}__{key}` unless overridden
#[derive(Clone, Debug)]
pub struct BaseTheme {
    prefix: String,
    overrides: FxHashMap<String, String>,
}

impl Default for BaseTheme {
    fn default() -> Self {
        Self::from_config(&ThemeConfig::default())
    }
}

impl BaseTheme {
    /// Create a resolver with a class prefix and no overrides
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            overrides: FxHashMap::default(),
        }
    }

    /// Create a resolver from the `[theme]` config section
    pub fn from_config(config: &ThemeConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            overrides: config
                .overrides
                .iter()
                .map(|(key, class)| (key.clone(), class.clone()))
                .collect(),
        }
    }

    /// Override the class for `widget.key`
    pub fn with_override(
        mut self,
        widget: &str,
        key: &str,
        class: impl Into<String>,
    ) -> Self {
        self.overrides
            .insert(format!("{}.{}", widget, key), class.into());
        self
    }
}

impl ThemeResolver for BaseTheme {
    fn class(&self, widget: &str, key: &str) -> String {
        if let Some(class) = self.overrides.get(&format!("{}.{}", widget, key)) {
            return class.clone();
        }
        if self.prefix.is_empty() {
            format!("{}__{}", widget, key)
        } else {
            format!("{}-{}__{}", self.prefix, widget, key)
        }
    }
}
