//! Per-instance caches
//!
//! Each mounted widget owns one [`InstanceCache`]: a string-keyed store of
//! type-erased values that survives across render passes. Writes are
//! immediate; a write that changes the stored value also queues an
//! invalidation for the owning instance, so the next flush re-renders it.
//!
//! Caches live in a [`CacheArena`] keyed by the stable identity the host
//! assigns to each widget. The arena allocates a slot on first mount, looks
//! it up on later renders and releases it when the host retires the
//! identity. Storage is never shared between instances.
//!
//! # Example
//!
//! ```rust
//! use formwork_core::cache::CacheArena;
//! use formwork_core::invalidator::Scheduler;
//!
//! let scheduler = Scheduler::new();
//! let mut arena = CacheArena::new(scheduler.clone());
//! let (id, _) = arena.get_or_allocate("email");
//! let cache = arena.cache(id).unwrap();
//!
//! assert_eq!(cache.get::<String>("value"), None);
//!
//! assert!(cache.set("value", "hello".to_string()));
//! assert!(scheduler.is_pending(id));
//! scheduler.take_pending();
//!
//! // Writing an equal value does not invalidate
//! assert!(!cache.set("value", "hello".to_string()));
//! assert!(!scheduler.has_pending());
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::invalidator::{Invalidator, Scheduler};

new_key_type! {
    /// Arena slot of a mounted widget instance
    pub struct InstanceId;
}

/// Values that can live in an instance cache
///
/// Equality decides whether a write invalidates.
trait CacheValue: Any {
    fn as_any(&self) -> &dyn Any;
    fn eq_value(&self, other: &dyn Any) -> bool;
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T: Any + PartialEq + fmt::Debug> CacheValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_value(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| self == other)
    }

    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

struct DebugValue<'a>(&'a dyn CacheValue);

impl fmt::Debug for DebugValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_value(f)
    }
}

/// Key/value store owned by one widget instance
pub struct InstanceCache {
    values: FxHashMap<String, Box<dyn CacheValue>>,
    invalidator: Invalidator,
}

impl InstanceCache {
    fn new(invalidator: Invalidator) -> Self {
        Self {
            values: FxHashMap::default(),
            invalidator,
        }
    }

    /// Get a copy of the stored value, or None if absent or of another type
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|value| value.as_any().downcast_ref::<T>().cloned())
    }

    /// Store a value. Returns true (and invalidates) if it differs from the
    /// previously stored value.
    pub fn set<T: PartialEq + fmt::Debug + 'static>(&mut self, key: &str, value: T) -> bool {
        if let Some(existing) = self.values.get(key) {
            if existing.eq_value(&value) {
                return false;
            }
        }
        tracing::trace!(instance = ?self.invalidator.instance(), key, ?value, "cache write");
        self.values.insert(key.to_string(), Box::new(value));
        self.invalidator.invalidate();
        true
    }

    /// Return the stored value, initializing it to `default` on first access
    ///
    /// Initialization does not invalidate.
    pub fn get_or_set<T>(&mut self, key: &str, default: T) -> T
    where
        T: Clone + PartialEq + fmt::Debug + 'static,
    {
        if let Some(existing) = self.get::<T>(key) {
            return existing;
        }
        self.values.insert(key.to_string(), Box::new(default.clone()));
        default
    }

    /// Check whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Remove every value without invalidating
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for key in self.keys() {
            if let Some(value) = self.values.get(&key) {
                map.entry(&key, &DebugValue(value.as_ref()));
            }
        }
        map.finish()
    }
}

/// Shared handle to an instance cache
///
/// Event handlers capture clones of this handle so they can write to the
/// cache after the render pass that created them has finished.
#[derive(Clone)]
pub struct CacheHandle {
    inner: Rc<RefCell<InstanceCache>>,
}

impl CacheHandle {
    fn new(invalidator: Invalidator) -> Self {
        Self {
            inner: Rc::new(RefCell::new(InstanceCache::new(invalidator))),
        }
    }

    /// See [`InstanceCache::get`]
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        self.inner.borrow().get(key)
    }

    /// See [`InstanceCache::set`]
    pub fn set<T: PartialEq + fmt::Debug + 'static>(&self, key: &str, value: T) -> bool {
        self.inner.borrow_mut().set(key, value)
    }

    /// See [`InstanceCache::get_or_set`]
    pub fn get_or_set<T>(&self, key: &str, default: T) -> T
    where
        T: Clone + PartialEq + fmt::Debug + 'static,
    {
        self.inner.borrow_mut().get_or_set(key, default)
    }

    /// See [`InstanceCache::contains`]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.borrow().contains(key)
    }

    /// Run a closure with read access to the whole cache
    pub fn with<R>(&self, f: impl FnOnce(&InstanceCache) -> R) -> R {
        f(&self.inner.borrow())
    }

    /// The instance owning this cache
    pub fn instance(&self) -> InstanceId {
        self.inner.borrow().invalidator.instance()
    }

    fn clear(&self) {
        self.inner.borrow_mut().clear();
    }
}

impl fmt::Debug for CacheHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner.borrow(), f)
    }
}

/// Arena of instance caches keyed by host-assigned identity
pub struct CacheArena {
    slots: SlotMap<InstanceId, CacheHandle>,
    identities: FxHashMap<String, InstanceId>,
    scheduler: Scheduler,
}

impl CacheArena {
    /// Create an arena whose caches invalidate through `scheduler`
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            slots: SlotMap::with_key(),
            identities: FxHashMap::default(),
            scheduler,
        }
    }

    /// Look up the slot for an identity, allocating one on first use
    ///
    /// Returns the slot and whether it was newly created.
    pub fn get_or_allocate(&mut self, identity: &str) -> (InstanceId, bool) {
        if let Some(&id) = self.identities.get(identity) {
            return (id, false);
        }
        let scheduler = &self.scheduler;
        let id = self
            .slots
            .insert_with_key(|id| CacheHandle::new(scheduler.invalidator(id)));
        self.identities.insert(identity.to_string(), id);
        tracing::debug!(identity, instance = ?id, "instance cache allocated");
        (id, true)
    }

    /// Find the slot for an identity
    pub fn lookup(&self, identity: &str) -> Option<InstanceId> {
        self.identities.get(identity).copied()
    }

    /// Get a handle to an instance's cache
    pub fn cache(&self, id: InstanceId) -> Option<CacheHandle> {
        self.slots.get(id).cloned()
    }

    /// Release the slot for an identity
    ///
    /// The cache is cleared so handlers still holding the handle observe an
    /// empty store, and any queued render for the instance is dropped.
    pub fn release(&mut self, identity: &str) -> Option<InstanceId> {
        let id = self.identities.remove(identity)?;
        if let Some(handle) = self.slots.remove(id) {
            handle.clear();
        }
        self.scheduler.cancel(id);
        tracing::debug!(identity, instance = ?id, "instance cache released");
        Some(id)
    }

    /// Number of live instances
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check whether no instances are live
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> (Scheduler, CacheArena) {
        let scheduler = Scheduler::new();
        let arena = CacheArena::new(scheduler.clone());
        (scheduler, arena)
    }

    #[test]
    fn test_get_absent_is_none() {
        let (_, mut arena) = arena();
        let (id, _) = arena.get_or_allocate("a");
        let cache = arena.cache(id).unwrap();
        assert_eq!(cache.get::<String>("value"), None);
        assert!(!cache.contains("value"));
    }

    #[test]
    fn test_set_invalidates_only_on_change() {
        let (scheduler, mut arena) = arena();
        let (id, _) = arena.get_or_allocate("a");
        let cache = arena.cache(id).unwrap();

        assert!(cache.set("dirty", true));
        assert_eq!(scheduler.take_pending(), vec![id]);

        assert!(!cache.set("dirty", true));
        assert!(!scheduler.has_pending());

        assert!(cache.set("dirty", false));
        assert!(scheduler.has_pending());
    }

    #[test]
    fn test_get_or_set_does_not_invalidate() {
        let (scheduler, mut arena) = arena();
        let (id, _) = arena.get_or_allocate("a");
        let cache = arena.cache(id).unwrap();

        assert!(!cache.get_or_set("dirty", false));
        assert!(!scheduler.has_pending());

        cache.set("dirty", true);
        scheduler.take_pending();
        assert!(cache.get_or_set("dirty", false));
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_type_mismatch_reads_none() {
        let (_, mut arena) = arena();
        let (id, _) = arena.get_or_allocate("a");
        let cache = arena.cache(id).unwrap();

        cache.set("value", Some("x".to_string()));
        assert_eq!(cache.get::<String>("value"), None);
        assert_eq!(cache.get::<Option<String>>("value"), Some(Some("x".to_string())));

        // A write of a different type always counts as a change
        assert!(cache.set("value", 3u32));
    }

    #[test]
    fn test_instances_do_not_share_storage() {
        let (_, mut arena) = arena();
        let (a, _) = arena.get_or_allocate("a");
        let (b, _) = arena.get_or_allocate("b");
        assert_ne!(a, b);

        arena.cache(a).unwrap().set("value", "left".to_string());
        assert_eq!(arena.cache(b).unwrap().get::<String>("value"), None);
    }

    #[test]
    fn test_identity_lookup_is_stable() {
        let (_, mut arena) = arena();
        let (first, created) = arena.get_or_allocate("field");
        assert!(created);
        let (second, created) = arena.get_or_allocate("field");
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(arena.lookup("field"), Some(first));
    }

    #[test]
    fn test_release_clears_and_cancels() {
        let (scheduler, mut arena) = arena();
        let (id, _) = arena.get_or_allocate("a");
        let cache = arena.cache(id).unwrap();
        cache.set("value", "x".to_string());
        assert!(scheduler.is_pending(id));

        assert_eq!(arena.release("a"), Some(id));
        assert!(!scheduler.has_pending());
        assert!(cache.with(|c| c.is_empty()));
        assert!(arena.cache(id).is_none());
        assert!(arena.is_empty());

        // A released identity gets a fresh slot
        let (fresh, created) = arena.get_or_allocate("a");
        assert!(created);
        assert_ne!(fresh, id);
    }

    #[test]
    fn test_debug_lists_sorted_keys() {
        let (_, mut arena) = arena();
        let (id, _) = arena.get_or_allocate("a");
        let cache = arena.cache(id).unwrap();
        cache.set("value", "x".to_string());
        cache.set("dirty", true);
        assert_eq!(format!("{:?}", cache), r#"{"dirty": true, "value": "x"}"#);
    }
}
