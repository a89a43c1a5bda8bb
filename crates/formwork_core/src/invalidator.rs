//! Invalidation scheduling
//!
//! Widgets never re-render themselves. Anything that wants a fresh render
//! pass (a changed cache write, a property comparator, a focus change) posts
//! an invalidation for its instance. The [`Scheduler`] coalesces those
//! requests: an instance is queued at most once until the host takes the
//! pending set, so several writes inside one event handler collapse into a
//! single pass.
//!
//! ```rust
//! use formwork_core::cache::CacheArena;
//! use formwork_core::invalidator::Scheduler;
//!
//! let scheduler = Scheduler::new();
//! let mut arena = CacheArena::new(scheduler.clone());
//! let (id, _) = arena.get_or_allocate("a");
//!
//! let invalidator = scheduler.invalidator(id);
//! invalidator.invalidate();
//! invalidator.invalidate();
//!
//! assert_eq!(scheduler.take_pending(), vec![id]);
//! assert!(!scheduler.has_pending());
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexSet;

use crate::cache::InstanceId;

#[derive(Default)]
struct SchedulerState {
    /// Instances waiting for a render pass, in request order
    pending: IndexSet<InstanceId>,
    /// Total invalidations posted (including coalesced ones)
    requested: u64,
}

/// Shared queue of instances that need a render pass
///
/// Cloning is cheap; all clones share the same queue.
#[derive(Clone, Default)]
pub struct Scheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl Scheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an invalidator bound to one instance
    pub fn invalidator(&self, instance: InstanceId) -> Invalidator {
        Invalidator {
            scheduler: self.clone(),
            instance,
        }
    }

    /// Queue an instance. Returns false if it was already queued.
    pub fn schedule(&self, instance: InstanceId) -> bool {
        let mut state = self.state.borrow_mut();
        state.requested += 1;
        state.pending.insert(instance)
    }

    /// Drop a queued request (used when an instance is released)
    pub fn cancel(&self, instance: InstanceId) -> bool {
        self.state.borrow_mut().pending.shift_remove(&instance)
    }

    /// Check whether an instance is waiting for a pass
    pub fn is_pending(&self, instance: InstanceId) -> bool {
        self.state.borrow().pending.contains(&instance)
    }

    /// Check whether anything is waiting for a pass
    pub fn has_pending(&self) -> bool {
        !self.state.borrow().pending.is_empty()
    }

    /// Take all queued instances in request order (clears the queue)
    pub fn take_pending(&self) -> Vec<InstanceId> {
        self.state.borrow_mut().pending.drain(..).collect()
    }

    /// Total number of invalidations posted so far
    pub fn requested(&self) -> u64 {
        self.state.borrow().requested
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Scheduler")
            .field("pending", &state.pending.len())
            .field("requested", &state.requested)
            .finish()
    }
}

/// Handle that requests a render pass for one instance
#[derive(Clone, Debug)]
pub struct Invalidator {
    scheduler: Scheduler,
    instance: InstanceId,
}

impl Invalidator {
    /// Request a render pass for the bound instance
    ///
    /// Never renders synchronously; the host replays the request on its
    /// next flush.
    pub fn invalidate(&self) {
        if self.scheduler.schedule(self.instance) {
            tracing::debug!(instance = ?self.instance, "instance invalidated");
        }
    }

    /// The instance this invalidator is bound to
    pub fn instance(&self) -> InstanceId {
        self.instance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheArena;

    #[test]
    fn test_requests_are_coalesced() {
        let scheduler = Scheduler::new();
        let mut arena = CacheArena::new(scheduler.clone());
        let (a, _) = arena.get_or_allocate("a");

        assert!(scheduler.schedule(a));
        assert!(!scheduler.schedule(a));
        assert_eq!(scheduler.requested(), 2);
        assert_eq!(scheduler.take_pending(), vec![a]);
    }

    #[test]
    fn test_pending_order_is_request_order() {
        let scheduler = Scheduler::new();
        let mut arena = CacheArena::new(scheduler.clone());
        let (a, _) = arena.get_or_allocate("a");
        let (b, _) = arena.get_or_allocate("b");

        scheduler.invalidator(b).invalidate();
        scheduler.invalidator(a).invalidate();
        scheduler.invalidator(b).invalidate();

        assert_eq!(scheduler.take_pending(), vec![b, a]);
    }

    #[test]
    fn test_cancel() {
        let scheduler = Scheduler::new();
        let mut arena = CacheArena::new(scheduler.clone());
        let (a, _) = arena.get_or_allocate("a");

        scheduler.schedule(a);
        assert!(scheduler.is_pending(a));
        assert!(scheduler.cancel(a));
        assert!(!scheduler.has_pending());
    }
}
