//! Formwork Core Runtime
//!
//! This crate provides the foundational primitives that Formwork widgets are
//! rendered against:
//!
//! - **Instance Caches**: Per-widget key/value state that survives render passes
//! - **Invalidation**: Coalesced re-render requests posted to a scheduler
//! - **Property Diffing**: Custom per-key comparators deciding when props changed
//! - **Focus Tracking**: Focused-element queries and one-shot focus directives
//! - **Validity**: Native-style constraint checks (required, pattern, length, range)
//! - **Render Tree**: Keyed `VNode` snapshots with attributes and event handlers
//!
//! Everything is single-threaded. Render passes never re-enter: writes made
//! during a pass are queued and replayed by [`Runtime::flush`].
//!
//! # Example
//!
//! ```rust
//! use formwork_core::cache::CacheArena;
//! use formwork_core::invalidator::Scheduler;
//!
//! let scheduler = Scheduler::new();
//! let mut arena = CacheArena::new(scheduler.clone());
//!
//! let (id, created) = arena.get_or_allocate("field-1");
//! assert!(created);
//!
//! let cache = arena.cache(id).unwrap();
//! let dirty = cache.get_or_set("dirty", false);
//! assert!(!dirty);
//! assert!(!scheduler.has_pending());
//!
//! // A changed write queues exactly one invalidation
//! cache.set("dirty", true);
//! assert_eq!(scheduler.take_pending(), vec![id]);
//! ```

pub mod cache;
pub mod config;
pub mod diff;
pub mod error;
pub mod focus;
pub mod invalidator;
pub mod runtime;
pub mod theme;
pub mod validity;
pub mod vnode;

pub use cache::{CacheArena, CacheHandle, InstanceCache, InstanceId};
pub use config::{FormworkConfig, RuntimeConfig, ThemeConfig, ValidationMessages};
pub use diff::{diff_properties, identity_changed, Diffable, PropertyChanges, PropertyDiffer};
pub use error::{ConfigError, Result, RuntimeError};
pub use focus::{FocusDirective, FocusState, FocusTracker};
pub use invalidator::{Invalidator, Scheduler};
pub use runtime::{Component, DispatchOutcome, RenderContext, Runtime, Services};
pub use theme::{BaseTheme, ExtraClasses, ThemeResolver};
pub use validity::{
    Constraints, InputType, NativeValidity, ParseInputTypeError, ValidationResult,
    ValidityService,
};
pub use vnode::{
    AttrValue, Event, EventCallback, EventContext, EventHandlers, EventType, NodeKind, VNode,
};
