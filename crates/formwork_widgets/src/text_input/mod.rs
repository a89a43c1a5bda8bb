//! TextInput widget
//!
//! A labelled single-line input. Each render pass:
//!
//! 1. reconciles the cached value with `initial_value`
//! 2. runs the validation pipeline when `on_validate` is set
//! 3. renders the tree below, styled from the parent's `valid` property and
//!    the focus tracker
//!
//! ```text
//! div.root
//! └── div.wrapper [disabled focused invalid valid readonly required
//!     │            hasLeading hasTrailing noLabel]
//!     ├── Label               (when `label` is set)
//!     └── div.inputWrapper
//!         ├── span.leading    (when `leading` is set)
//!         ├── input
//!         └── span.trailing   (when `trailing` is set)
//! HelperText                  (validation message or `helper_text`)
//! ```
//!
//! `pattern`, `leading` and `trailing` have custom property comparators:
//! patterns compare by source text, slot renderers by identity.

mod properties;
mod reconcile;
mod validation;


use std::rc::Rc;

use formwork_core::{
    identity_changed, Component, Constraints, EventType, ExtraClasses, PropertyDiffer,
    RenderContext, ThemeResolver, VNode,
};

use crate::aria::format_aria;
use crate::helper_text::helper_text;
use crate::label::{label, LabelProperties};

pub use properties::{
    Autocomplete, Callback, CustomValidator, CustomValidity, KeyCallback, Pattern, SlotRenderer,
    TextInputProperties, ValidateCallback, Validity, ValueCallback,
};
pub use reconcile::{cached_value, value_state, ValueState, DIRTY, INITIAL_VALUE, VALUE};
pub use validation::{should_notify, ValidationInput, INPUT_KEY};

/// Text input widget
pub struct TextInput;

impl Component for TextInput {
    type Properties = TextInputProperties;
    const NAME: &'static str = "text-input";

    fn diff_properties(differ: &mut PropertyDiffer<TextInputProperties>) {
        differ
            .diff_property("pattern", |previous, next| {
                previous.pattern_source() != next.pattern_source()
            })
            .diff_property("leading", |previous, next| {
                identity_changed(&previous.leading, &next.leading)
            })
            .diff_property("trailing", |previous, next| {
                identity_changed(&previous.trailing, &next.trailing)
            });
    }

    fn render(ctx: &RenderContext<'_, TextInputProperties>) -> VNode {
        let props = ctx.properties();
        let cache = ctx.cache();
        let dirty = cache.get_or_set(DIRTY, false);

        let value = reconcile::reconcile(
            &cache,
            props.initial_value.as_deref(),
            props.on_value.as_ref(),
        );

        let constraints = props.constraints();
        validation::run(
            &cache,
            ctx.validity().as_ref(),
            &ValidationInput {
                value: value.as_deref(),
                dirty,
                constraints: &constraints,
                custom_validator: props.custom_validator.as_ref(),
                current: props.valid.as_ref(),
            },
            props.on_validate.as_ref(),
        );

        let displayed = props.displayed_validity();
        let message = Some(displayed.message.as_str())
            .filter(|message| displayed.valid == Some(false) && !message.is_empty());
        let computed_helper_text = message.or(props.helper_text.as_deref());

        let focus = ctx.focus();
        let input_focused = focus.is_focused(INPUT_KEY);
        let widget_id = props
            .widget_id
            .clone()
            .unwrap_or_else(|| format!("text-input-{}", ctx.id()));

        let theme = props.theme.clone().unwrap_or_else(|| ctx.theme());
        let classes = ThemeClasses {
            theme: theme.as_ref(),
            extra: &props.classes,
        };

        let label_node = props.label.as_ref().map(|text| {
            label(
                LabelProperties {
                    text: text.clone(),
                    disabled: props.disabled,
                    valid: displayed.valid,
                    focused: input_focused,
                    read_only: props.read_only,
                    required: props.required,
                    hidden: props.label_hidden,
                    for_id: widget_id.clone(),
                    active: value.as_deref().is_some_and(|value| !value.is_empty())
                        || input_focused,
                },
                theme.as_ref(),
                classes.extra("label"),
            )
        });

        let leading = props.leading.as_ref().map(|render| {
            VNode::element("span")
                .key("leading")
                .classes(classes.get("leading"))
                .child(render())
        });
        let trailing = props.trailing.as_ref().map(|render| {
            VNode::element("span")
                .key("trailing")
                .classes(classes.get("trailing"))
                .child(render())
        });

        let wrapper = VNode::element("div")
            .key("wrapper")
            .attr("role", "presentation")
            .classes(classes.get("wrapper"))
            .classes(classes.when(props.disabled, "disabled"))
            .classes(classes.when(input_focused, "focused"))
            .classes(classes.when(displayed.valid == Some(false), "invalid"))
            .classes(classes.when(displayed.valid == Some(true), "valid"))
            .classes(classes.when(props.read_only, "readonly"))
            .classes(classes.when(props.required, "required"))
            .classes(classes.when(props.leading.is_some(), "hasLeading"))
            .classes(classes.when(props.trailing.is_some(), "hasTrailing"))
            .classes(classes.when(props.label.is_none(), "noLabel"))
            .child_opt(label_node)
            .child(
                VNode::element("div")
                    .key("inputWrapper")
                    .attr("role", "presentation")
                    .classes(classes.get("inputWrapper"))
                    .child_opt(leading)
                    .child(input_node(
                        ctx,
                        value.as_deref(),
                        &widget_id,
                        displayed.valid,
                        &classes,
                    ))
                    .child_opt(trailing),
            );

        VNode::element("div")
            .key("root")
            .attr("role", "presentation")
            .classes(classes.get("root"))
            .child(wrapper)
            .child(helper_text(
                computed_helper_text,
                displayed.valid,
                theme.as_ref(),
                classes.extra("helperText"),
            ))
    }
}

impl TextInputProperties {
    /// Constraints declared on the input element
    pub fn constraints(&self) -> Constraints {
        Constraints {
            input_type: self.input_type,
            required: self.required,
            pattern: self.pattern_source().map(str::to_string),
            min: self.min.clone(),
            max: self.max.clone(),
            step: self.step.clone(),
            min_length: self.min_length.filter(|len| *len > 0),
            max_length: self.max_length.filter(|len| *len > 0),
        }
    }
}

/// Theme classes plus the caller's extra classes, per class key
struct ThemeClasses<'a> {
    theme: &'a dyn ThemeResolver,
    extra: &'a ExtraClasses,
}

impl ThemeClasses<'_> {
    fn extra(&self, key: &str) -> &[String] {
        self.extra.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    fn get(&self, key: &str) -> Vec<String> {
        let mut classes = vec![self.theme.class(TextInput::NAME, key)];
        classes.extend_from_slice(self.extra(key));
        classes
    }

    fn when(&self, condition: bool, key: &str) -> Vec<String> {
        if condition {
            self.get(key)
        } else {
            Vec::new()
        }
    }
}

/// The `input` element with its attributes and handlers
fn input_node(
    ctx: &RenderContext<'_, TextInputProperties>,
    value: Option<&str>,
    widget_id: &str,
    valid: Option<bool>,
    classes: &ThemeClasses<'_>,
) -> VNode {
    let props = ctx.properties();
    let tracker = ctx.focus();
    let requested = props.focus.clone();

    let mut node = VNode::element("input")
        .key("input")
        .attrs(format_aria(&props.aria))
        .attr_opt("aria-invalid", (valid == Some(false)).then_some("true"))
        .attr_opt("autocomplete", props.autocomplete.as_ref().map(Autocomplete::attr_value))
        .classes(classes.get("input"))
        .attr("disabled", props.disabled)
        .attr("id", widget_id)
        .focus(Rc::new(move || {
            tracker.should_focus() || requested.as_ref().is_some_and(|focus| focus())
        }))
        .attr_opt("max", props.max.as_ref())
        .attr_opt(
            "maxlength",
            props.max_length.filter(|len| *len > 0).map(|len| len.to_string()),
        )
        .attr_opt("min", props.min.as_ref())
        .attr_opt(
            "minlength",
            props.min_length.filter(|len| *len > 0).map(|len| len.to_string()),
        )
        .attr_opt("name", props.name.as_ref())
        .attr_opt("pattern", props.pattern_source())
        .attr_opt("placeholder", props.placeholder.as_ref())
        .attr("readonly", props.read_only)
        .attr_opt("aria-readonly", props.read_only.then_some("true"))
        .attr("required", props.required)
        .attr_opt("step", props.step.as_ref())
        .attr("type", props.input_type.as_str())
        .attr_opt("value", value);

    node = forward(node, EventType::Blur, props.on_blur.clone());
    node = forward(node, EventType::Focus, props.on_focus.clone());

    let cache = ctx.cache();
    let on_value = props.on_value.clone();
    node = node.on(EventType::Input, move |event| {
        event.stop_propagation();
        let value = event.event.value.as_deref().unwrap_or_default();
        reconcile::record_input(&cache, value, on_value.as_ref());
    });

    node = forward_key(node, EventType::KeyDown, props.on_key_down.clone());
    node = forward_key(node, EventType::KeyUp, props.on_key_up.clone());

    node = forward(node, EventType::Click, props.on_click.clone());
    node = forward(node, EventType::PointerEnter, props.on_over.clone());
    forward(node, EventType::PointerLeave, props.on_out.clone())
}

/// Attach a handler that calls `callback`, if present
fn forward(node: VNode, event_type: EventType, callback: Option<Callback>) -> VNode {
    node.on(event_type, move |_| {
        if let Some(callback) = &callback {
            callback();
        }
    })
}

/// Attach a key handler that stops propagation and forwards the key code
fn forward_key(node: VNode, event_type: EventType, callback: Option<KeyCallback>) -> VNode {
    node.on(event_type, move |event| {
        event.stop_propagation();
        if let Some(callback) = &callback {
            callback(event.event.key_code, &|| event.prevent_default());
        }
    })
}
