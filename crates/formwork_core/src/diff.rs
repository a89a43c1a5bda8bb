//! Property diffing
//!
//! When the host delivers a new property bag, the runtime decides whether a
//! render pass is needed by comparing it against the previous bag:
//!
//! - **Default diff**: [`Diffable::changed_keys`] reports every plain-data key
//!   whose value differs (callbacks are never compared).
//! - **Custom comparators**: a widget can register a `(previous, next) ->
//!   changed` comparator for a key through [`PropertyDiffer::diff_property`].
//!   Registered keys are taken out of the default diff, and a comparator that
//!   reports a change posts an invalidation explicitly.
//!
//! Custom comparators exist for properties whose raw values have several
//! representations of the same thing, such as a pattern given either as
//! source text or as a compiled expression.
//!
//! # Example
//!
//! ```rust
//! use formwork_core::diff::{diff_properties, Diffable, PropertyDiffer};
//! use formwork_core::cache::CacheArena;
//! use formwork_core::invalidator::Scheduler;
//! use smallvec::SmallVec;
//!
//! #[derive(Clone)]
//! struct Props {
//!     label: String,
//!     pattern: String,
//! }
//!
//! impl Diffable for Props {
//!     fn changed_keys(&self, next: &Self) -> SmallVec<[&'static str; 8]> {
//!         let mut keys = SmallVec::new();
//!         if self.label != next.label {
//!             keys.push("label");
//!         }
//!         if self.pattern != next.pattern {
//!             keys.push("pattern");
//!         }
//!         keys
//!     }
//! }
//!
//! let scheduler = Scheduler::new();
//! let mut arena = CacheArena::new(scheduler.clone());
//! let (id, _) = arena.get_or_allocate("a");
//!
//! let mut differ = PropertyDiffer::new();
//! differ.diff_property("pattern", |prev: &Props, next: &Props| {
//!     prev.pattern.trim() != next.pattern.trim()
//! });
//!
//! let prev = Props { label: "A".into(), pattern: "x+".into() };
//! let next = Props { label: "A".into(), pattern: " x+ ".into() };
//! let changes = diff_properties(&differ, &prev, &next, &scheduler.invalidator(id));
//! assert!(!changes.any());
//! assert!(!scheduler.has_pending());
//! ```

use std::rc::Rc;

use smallvec::SmallVec;

use crate::invalidator::Invalidator;

/// Default shallow diff over a property bag
pub trait Diffable {
    /// Keys whose plain-data values differ between `self` and `next`
    fn changed_keys(&self, next: &Self) -> SmallVec<[&'static str; 8]>;
}

/// Comparator returning true when the property changed
pub type Comparator<P> = Box<dyn Fn(&P, &P) -> bool>;

/// Registry of per-key custom comparators
pub struct PropertyDiffer<P> {
    comparators: Vec<(&'static str, Comparator<P>)>,
}

impl<P> Default for PropertyDiffer<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> PropertyDiffer<P> {
    /// Create an empty differ
    pub fn new() -> Self {
        Self {
            comparators: Vec::new(),
        }
    }

    /// Register a comparator for a key, replacing any earlier one
    pub fn diff_property<F>(&mut self, key: &'static str, changed: F) -> &mut Self
    where
        F: Fn(&P, &P) -> bool + 'static,
    {
        self.comparators.retain(|(existing, _)| *existing != key);
        self.comparators.push((key, Box::new(changed)));
        self
    }

    /// Check whether a key has a custom comparator
    pub fn is_registered(&self, key: &str) -> bool {
        self.comparators.iter().any(|(existing, _)| *existing == key)
    }

    /// Registered keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.comparators.iter().map(|(key, _)| *key)
    }

    /// Run every comparator; invalidate once if any reports a change
    ///
    /// Returns the keys that changed.
    pub fn evaluate(
        &self,
        previous: &P,
        next: &P,
        invalidator: &Invalidator,
    ) -> SmallVec<[&'static str; 4]> {
        let changed: SmallVec<[&'static str; 4]> = self
            .comparators
            .iter()
            .filter(|(_, comparator)| comparator(previous, next))
            .map(|(key, _)| *key)
            .collect();

        if !changed.is_empty() {
            tracing::debug!(keys = ?changed, "custom property diff requested render");
            invalidator.invalidate();
        }
        changed
    }
}

/// Outcome of diffing two property bags
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyChanges {
    /// Keys changed according to the default diff
    pub default: SmallVec<[&'static str; 8]>,
    /// Keys changed according to a custom comparator
    pub custom: SmallVec<[&'static str; 4]>,
}

impl PropertyChanges {
    /// Returns true if any key changed
    pub fn any(&self) -> bool {
        !self.default.is_empty() || !self.custom.is_empty()
    }

    /// Check whether a specific key changed
    pub fn contains(&self, key: &str) -> bool {
        self.default.contains(&key) || self.custom.contains(&key)
    }
}

/// Diff two property bags: default diff for unregistered keys, custom
/// comparators (which invalidate on change) for registered ones
pub fn diff_properties<P: Diffable>(
    differ: &PropertyDiffer<P>,
    previous: &P,
    next: &P,
    invalidator: &Invalidator,
) -> PropertyChanges {
    let mut default = previous.changed_keys(next);
    default.retain(|key| !differ.is_registered(key));
    let custom = differ.evaluate(previous, next, invalidator);
    PropertyChanges { default, custom }
}

/// Identity comparison for optional shared values (closures, services)
pub fn identity_changed<T: ?Sized>(previous: &Option<Rc<T>>, next: &Option<Rc<T>>) -> bool {
    match (previous, next) {
        (None, None) => false,
        (Some(previous), Some(next)) => !Rc::ptr_eq(previous, next),
        _ => true,
    }
}
