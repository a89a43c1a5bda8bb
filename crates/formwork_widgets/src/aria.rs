//! ARIA attribute formatting

use indexmap::IndexMap;

/// Caller-supplied ARIA properties, keyed without the `aria-` prefix
///
/// A `None` value suppresses the attribute.
pub type AriaProperties = IndexMap<String, Option<String>>;

/// Turn `{"describedBy": Some("hint")}` into `[("aria-describedby", "hint")]`
pub fn format_aria(aria: &AriaProperties) -> Vec<(String, String)> {
    aria.iter()
        .filter_map(|(key, value)| {
            let value = value.as_ref()?;
            Some((format!("aria-{}", key.to_lowercase()), value.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_and_lowercase() {
        let mut aria = AriaProperties::new();
        aria.insert("describedBy".into(), Some("hint".into()));
        aria.insert("label".into(), Some("Email".into()));
        assert_eq!(
            format_aria(&aria),
            vec![
                ("aria-describedby".to_string(), "hint".to_string()),
                ("aria-label".to_string(), "Email".to_string()),
            ]
        );
    }

    #[test]
    fn test_none_is_dropped() {
        let mut aria = AriaProperties::new();
        aria.insert("hidden".into(), None);
        assert!(format_aria(&aria).is_empty());
    }
}
