//! Render tree
//!
//! A render pass produces a [`VNode`] tree: elements, child-component
//! placeholders and text, each with classes, attributes and named event
//! handlers. Structural keys identify nodes across passes so the host can
//! match them up and route events to them.
//!
//! ```text
//! Widget render fn
//!     ↓ VNode::element("input").key("input").on(EventType::Input, ...)
//! VNode tree (owned by the runtime after the pass)
//!     ↓ Runtime::dispatch(identity, "input", Event::input("x"))
//! Handler callback invoked with an EventContext
//! ```
//!
//! # Example
//!
//! ```rust
//! use formwork_core::vnode::{EventType, VNode};
//!
//! let tree = VNode::element("div")
//!     .key("root")
//!     .class("card")
//!     .child(
//!         VNode::element("input")
//!             .key("input")
//!             .attr("type", "email")
//!             .attr("required", true)
//!             .on(EventType::Input, |_| {}),
//!     );
//!
//! let input = tree.find("input").unwrap();
//! assert_eq!(input.attr_str("type"), Some("email"));
//! assert!(input.handlers.has(EventType::Input));
//! ```

use std::cell::Cell;
use std::fmt::{self, Write as _};
use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::focus::FocusDirective;

/// What a node represents
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A DOM-like element such as `div` or `input`
    Element(&'static str),
    /// A child component rendered by its own widget (label, helper text)
    Component(&'static str),
    /// Text content
    Text(String),
}

/// Attribute value
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrValue {
    Str(String),
    Bool(bool),
}

impl AttrValue {
    /// String form as the host would write it
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            AttrValue::Bool(_) => None,
        }
    }

    /// Boolean value, if this is a boolean attribute
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            AttrValue::Str(_) => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => write!(f, "{:?}", s),
            AttrValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<&String> for AttrValue {
    fn from(value: &String) -> Self {
        AttrValue::Str(value.clone())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// Events a node can handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Blur,
    Focus,
    Input,
    KeyDown,
    KeyUp,
    Click,
    PointerEnter,
    PointerLeave,
}

impl EventType {
    /// DOM event name
    pub fn name(&self) -> &'static str {
        match self {
            EventType::Blur => "blur",
            EventType::Focus => "focus",
            EventType::Input => "input",
            EventType::KeyDown => "keydown",
            EventType::KeyUp => "keyup",
            EventType::Click => "click",
            EventType::PointerEnter => "pointerenter",
            EventType::PointerLeave => "pointerleave",
        }
    }
}

/// An event delivered by the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub event_type: EventType,
    /// Target value after an `input` event
    pub value: Option<String>,
    /// Key code for `keydown` / `keyup`
    pub key_code: u32,
}

impl Event {
    /// Create an event with no payload
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            value: None,
            key_code: 0,
        }
    }

    /// An `input` event whose target now holds `value`
    pub fn input(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::new(EventType::Input)
        }
    }

    /// A `keydown` event
    pub fn key_down(key_code: u32) -> Self {
        Self {
            key_code,
            ..Self::new(EventType::KeyDown)
        }
    }

    /// A `keyup` event
    pub fn key_up(key_code: u32) -> Self {
        Self {
            key_code,
            ..Self::new(EventType::KeyUp)
        }
    }
}

/// Context passed to event handlers
#[derive(Debug)]
pub struct EventContext {
    pub event: Event,
    /// Structural key of the node that received the event
    pub node_key: String,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

impl EventContext {
    /// Create a context for an event targeting `node_key`
    pub fn new(event: Event, node_key: impl Into<String>) -> Self {
        Self {
            event,
            node_key: node_key.into(),
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        }
    }

    /// Stop the event from bubbling to ancestors
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    /// Suppress the host's default action
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// Event handler callback
///
/// Uses Rc since rendering is single-threaded.
pub type EventCallback = Rc<dyn Fn(&EventContext)>;

/// Handlers attached to one node
#[derive(Clone, Default)]
pub struct EventHandlers {
    handlers: SmallVec<[(EventType, EventCallback); 8]>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a handler, replacing any existing one for the event
    pub fn on(&mut self, event_type: EventType, callback: EventCallback) {
        self.handlers.retain(|(existing, _)| *existing != event_type);
        self.handlers.push((event_type, callback));
    }

    /// Handler for an event
    pub fn get(&self, event_type: EventType) -> Option<EventCallback> {
        self.handlers
            .iter()
            .find(|(existing, _)| *existing == event_type)
            .map(|(_, callback)| callback.clone())
    }

    pub fn has(&self, event_type: EventType) -> bool {
        self.handlers.iter().any(|(existing, _)| *existing == event_type)
    }

    /// Events with handlers, in attachment order
    pub fn events(&self) -> impl Iterator<Item = EventType> + '_ {
        self.handlers.iter().map(|(event_type, _)| *event_type)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.events().map(|event| event.name()))
            .finish()
    }
}

/// A node in the render tree
#[derive(Clone)]
pub struct VNode {
    pub kind: NodeKind,
    /// Structural key, stable across passes
    pub key: Option<&'static str>,
    pub classes: Vec<String>,
    pub attrs: IndexMap<String, AttrValue>,
    pub handlers: EventHandlers,
    /// Consulted by the host on commit to decide whether to focus this node
    pub focus: Option<FocusDirective>,
    pub children: Vec<VNode>,
}

impl VNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            key: None,
            classes: Vec::new(),
            attrs: IndexMap::new(),
            handlers: EventHandlers::new(),
            focus: None,
            children: Vec::new(),
        }
    }

    /// An element node
    pub fn element(tag: &'static str) -> Self {
        Self::new(NodeKind::Element(tag))
    }

    /// A child-component node
    pub fn component(name: &'static str) -> Self {
        Self::new(NodeKind::Component(name))
    }

    /// A text node
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeKind::Text(content.into()))
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    pub fn key(mut self, key: &'static str) -> Self {
        self.key = Some(key);
        self
    }

    /// Add one class
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Add every present class, skipping `None`s
    pub fn classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Option<String>>,
    {
        self.classes
            .extend(classes.into_iter().filter_map(Into::into));
        self
    }

    /// Set an attribute
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Set an attribute only when a value is present
    pub fn attr_opt<V: Into<AttrValue>>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    /// Set several attributes
    pub fn attrs<I, K, V>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttrValue>,
    {
        for (name, value) in attrs {
            self.attrs.insert(name.into(), value.into());
        }
        self
    }

    /// Attach an event handler
    pub fn on<F>(mut self, event_type: EventType, handler: F) -> Self
    where
        F: Fn(&EventContext) + 'static,
    {
        self.handlers.on(event_type, Rc::new(handler));
        self
    }

    /// Attach a focus directive
    pub fn focus(mut self, directive: FocusDirective) -> Self {
        self.focus = Some(directive);
        self
    }

    pub fn child(mut self, child: VNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn child_opt(mut self, child: Option<VNode>) -> Self {
        self.children.extend(child);
        self
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Depth-first search for the node with a structural key
    pub fn find(&self, key: &str) -> Option<&VNode> {
        if self.key == Some(key) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(key))
    }

    /// First descendant (or self) that is the named child component
    pub fn find_component(&self, name: &str) -> Option<&VNode> {
        if matches!(&self.kind, NodeKind::Component(existing) if *existing == name) {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find_component(name))
    }

    pub fn attr_value(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// String attribute value
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).and_then(AttrValue::as_str)
    }

    /// Boolean attribute value
    pub fn attr_bool(&self, name: &str) -> Option<bool> {
        self.attrs.get(name).and_then(AttrValue::as_bool)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|existing| existing == class)
    }

    /// Concatenated text of this subtree
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let NodeKind::Text(content) = &self.kind {
            out.push_str(content);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Visit every node depth-first
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a VNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Indented markup rendering, for debugging and CLI output
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out, 0);
        out
    }

    fn write_markup(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let name = match &self.kind {
            NodeKind::Text(content) => {
                let _ = writeln!(out, "{}{:?}", indent, content);
                return;
            }
            NodeKind::Element(tag) => tag.to_string(),
            NodeKind::Component(name) => format!("@{}", name),
        };

        let _ = write!(out, "{}<{}", indent, name);
        if let Some(key) = self.key {
            let _ = write!(out, " key={:?}", key);
        }
        if !self.classes.is_empty() {
            let _ = write!(out, " class={:?}", self.classes.join(" "));
        }
        for (attr, value) in &self.attrs {
            let _ = write!(out, " {}={}", attr, value);
        }
        for event in self.handlers.events() {
            let _ = write!(out, " on{}", event.name());
        }
        if self.children.is_empty() {
            let _ = writeln!(out, " />");
            return;
        }
        let _ = writeln!(out, ">");
        for child in &self.children {
            child.write_markup(out, depth + 1);
        }
        let _ = writeln!(out, "{}</{}>", indent, name);
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VNode")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("classes", &self.classes)
            .field("attrs", &self.attrs)
            .field("handlers", &self.handlers)
            .field("focus", &self.focus.is_some())
            .field("children", &self.children)
            .finish()
    }
}
