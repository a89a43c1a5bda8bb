//! Helper text child component

use formwork_core::{ThemeResolver, VNode};

/// Widget name for theme lookups
pub const NAME: &str = "helper-text";

/// Build the `HelperText` component node
///
/// Always rendered so the layout below the control stays stable; the text
/// child is present only for non-empty text.
pub fn helper_text(
    text: Option<&str>,
    valid: Option<bool>,
    theme: &dyn ThemeResolver,
    extra: &[String],
) -> VNode {
    let text = text.filter(|text| !text.is_empty());
    VNode::component("HelperText")
        .class(theme.class(NAME, "root"))
        .classes(extra.iter().cloned())
        .attr_opt("text", text)
        .attr_opt("valid", valid)
        .child_opt(text.map(VNode::text))
}
