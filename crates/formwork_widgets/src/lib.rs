//! Formwork Widget Library
//!
//! Form widgets rendered against the `formwork_core` runtime.
//!
//! # Architecture
//!
//! A widget is a pure function of its properties and its instance cache:
//!
//! 1. **Value Reconciliation**: The cache holds the authoritative value. A new
//!    `initial_value` from the parent overrides it; user input replaces it.
//!
//! 2. **Validation Pipeline**: Once the field is dirty, every pass runs the
//!    native-style check and an optional custom validator, and notifies the
//!    parent only when the result differs from the `valid` property it
//!    supplied.
//!
//! 3. **Render Function**: Assembles a keyed `VNode` tree whose handlers write
//!    to the cache and forward events to parent callbacks.
//!
//! # Example
//!
//! ```rust
//! use formwork_core::{EventType, Event, Runtime};
//! use formwork_widgets::prelude::*;
//!
//! let mut runtime = Runtime::<TextInput>::default();
//! runtime
//!     .mount("email", TextInputProperties::new().label("Email").input_type(InputType::Email))
//!     .unwrap();
//!
//! runtime.dispatch("email", "input", Event::input("x@y.com")).unwrap();
//! runtime.flush().unwrap();
//!
//! let input = runtime.tree("email").unwrap().find("input").unwrap();
//! assert_eq!(input.attr_str("value"), Some("x@y.com"));
//! assert!(input.handlers.has(EventType::KeyDown));
//! ```

pub mod aria;
pub mod helper_text;
pub mod label;
pub mod text_input;

pub use text_input::{
    Autocomplete, CustomValidity, Pattern, TextInput, TextInputProperties, Validity, ValueState,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::text_input::{
        Autocomplete, CustomValidity, Pattern, TextInput, TextInputProperties, Validity,
    };
    pub use formwork_core::{InputType, ValidationResult};
}
