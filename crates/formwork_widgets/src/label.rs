//! Label child component
//!
//! The text input renders its label as a `Label` component node carrying the
//! state the label needs for styling. How the label itself renders is up to
//! the host.

use formwork_core::{ThemeResolver, VNode};

/// Widget name for theme lookups
pub const NAME: &str = "label";

/// Label node properties
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelProperties {
    pub text: String,
    pub disabled: bool,
    pub valid: Option<bool>,
    pub focused: bool,
    pub read_only: bool,
    pub required: bool,
    /// Visually hidden but still announced
    pub hidden: bool,
    /// Id of the labelled control
    pub for_id: String,
    /// Raised/active styling: the control has a value or focus
    pub active: bool,
}

/// Build the `Label` component node
pub fn label(props: LabelProperties, theme: &dyn ThemeResolver, extra: &[String]) -> VNode {
    VNode::component("Label")
        .class(theme.class(NAME, "root"))
        .classes(extra.iter().cloned())
        .attr("disabled", props.disabled)
        .attr_opt("valid", props.valid)
        .attr("focused", props.focused)
        .attr("readOnly", props.read_only)
        .attr("required", props.required)
        .attr("hidden", props.hidden)
        .attr("forId", props.for_id)
        .attr("active", props.active)
        .child(VNode::text(props.text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_core::{BaseTheme, NodeKind};

    #[test]
    fn test_label_node() {
        let node = label(
            LabelProperties {
                text: "Email".into(),
                valid: Some(false),
                for_id: "email-input".into(),
                active: true,
                ..Default::default()
            },
            &BaseTheme::new("formwork"),
            &["bold".to_string()],
        );

        assert_eq!(node.kind, NodeKind::Component("Label"));
        assert_eq!(node.text_content(), "Email");
        assert_eq!(node.attr_str("forId"), Some("email-input"));
        assert_eq!(node.attr_bool("valid"), Some(false));
        assert_eq!(node.attr_bool("active"), Some(true));
        assert_eq!(node.classes, vec!["formwork-label__root", "bold"]);
    }

    #[test]
    fn test_neutral_validity_has_no_attr() {
        let node = label(LabelProperties::default(), &BaseTheme::default(), &[]);
        assert!(node.attr_value("valid").is_none());
    }
}
