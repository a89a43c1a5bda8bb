//! Value reconciliation
//!
//! The instance cache holds the authoritative value. Two writers compete for
//! it: the parent, through `initial_value`, and the user, through input
//! events. The cache also remembers the last `initial_value` it applied; a
//! render that sees a different `initial_value` overrides the value,
//! otherwise the cached value stands.
//!
//! ```text
//!                 initial_value != marker
//! Uninitialized ──────────────────────────► Controlled
//!                                            │      ▲
//!                                 user input │      │ initial_value != marker
//!                                            ▼      │
//!                                           UserEdited
//! ```

use formwork_core::CacheHandle;

use super::properties::ValueCallback;

/// Cache key of the authoritative value (`Option<String>`)
pub const VALUE: &str = "value";
/// Cache key of the last applied `initial_value` (`Option<String>`)
pub const INITIAL_VALUE: &str = "initial_value";
/// Cache key of the dirty flag (`bool`)
pub const DIRTY: &str = "dirty";

/// Where the current value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueState {
    /// Nothing applied and nothing typed
    Uninitialized,
    /// The value is the last applied `initial_value`
    Controlled,
    /// The user replaced the applied value
    UserEdited,
}

/// The cached value, `None` until first set
pub fn cached_value(cache: &CacheHandle) -> Option<String> {
    cache.get::<Option<String>>(VALUE).flatten()
}

fn cached_marker(cache: &CacheHandle) -> Option<String> {
    cache.get::<Option<String>>(INITIAL_VALUE).flatten()
}

/// Derive the reconciliation state from the cache
pub fn value_state(cache: &CacheHandle) -> ValueState {
    let value = cached_value(cache);
    let marker = cached_marker(cache);
    match (value, marker) {
        (None, None) if !cache.contains(VALUE) => ValueState::Uninitialized,
        (value, marker) if value == marker => ValueState::Controlled,
        _ => ValueState::UserEdited,
    }
}

/// Apply a changed `initial_value` and return the working value
///
/// When `initial_value` differs from the last applied one, it overwrites
/// both the value and the marker and `on_value` is notified. The dirty flag
/// is left alone.
pub fn reconcile(
    cache: &CacheHandle,
    initial_value: Option<&str>,
    on_value: Option<&ValueCallback>,
) -> Option<String> {
    let marker = cached_marker(cache);
    if initial_value == marker.as_deref() {
        return cached_value(cache);
    }

    let next = initial_value.map(str::to_string);
    tracing::debug!(
        instance = ?cache.instance(),
        previous = ?marker,
        next = ?next,
        "initial value applied"
    );
    cache.set(VALUE, next.clone());
    cache.set(INITIAL_VALUE, next.clone());

    if let Some(on_value) = on_value {
        on_value(initial_value);
    }
    next
}

/// Record a user edit: write the value, then notify
///
/// The marker is untouched, so the edit survives until the parent supplies a
/// different `initial_value`.
pub fn record_input(cache: &CacheHandle, value: &str, on_value: Option<&ValueCallback>) {
    cache.set(VALUE, Some(value.to_string()));
    if let Some(on_value) = on_value {
        on_value(Some(value));
    }
}
