//! Focus tracking
//!
//! Widgets ask two questions about focus while rendering: which of their
//! keyed elements currently holds focus, and whether the host should move
//! focus to an element when it commits the tree. [`FocusTracker`] is that
//! contract; [`FocusState`] is the per-instance implementation the runtime
//! hands out.

use std::cell::RefCell;
use std::rc::Rc;

use crate::invalidator::Invalidator;

/// Directive attached to a node; the host calls it on commit and moves
/// focus to the node when it returns true
pub type FocusDirective = Rc<dyn Fn() -> bool>;

/// Focus queries available to a widget
pub trait FocusTracker {
    /// Whether the element with this structural key holds focus
    fn is_focused(&self, key: &str) -> bool;

    /// One-shot: true once after focus was requested, then false
    fn should_focus(&self) -> bool;
}

#[derive(Debug, Default)]
struct FocusInner {
    focused: Option<String>,
    requested: bool,
}

/// Focus state of one widget instance
///
/// Focus changes invalidate the instance so focus-dependent styling is
/// re-rendered.
#[derive(Debug)]
pub struct FocusState {
    inner: RefCell<FocusInner>,
    invalidator: Invalidator,
}

impl FocusState {
    /// Create focus state that invalidates through `invalidator`
    pub fn new(invalidator: Invalidator) -> Self {
        Self {
            inner: RefCell::new(FocusInner::default()),
            invalidator,
        }
    }

    /// Request that focus moves to the widget on the next commit
    pub fn request_focus(&self) {
        self.inner.borrow_mut().requested = true;
        self.invalidator.invalidate();
    }

    /// Record that the element with `key` received focus
    pub fn set_focused(&self, key: &str) {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            if inner.focused.as_deref() == Some(key) {
                false
            } else {
                inner.focused = Some(key.to_string());
                true
            }
        };
        if changed {
            tracing::debug!(key, "element focused");
            self.invalidator.invalidate();
        }
    }

    /// Record that the element with `key` lost focus
    pub fn blur(&self, key: &str) {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            if inner.focused.as_deref() == Some(key) {
                inner.focused = None;
                true
            } else {
                false
            }
        };
        if changed {
            tracing::debug!(key, "element blurred");
            self.invalidator.invalidate();
        }
    }

    /// Key of the focused element, if any
    pub fn focused(&self) -> Option<String> {
        self.inner.borrow().focused.clone()
    }
}

impl FocusTracker for FocusState {
    fn is_focused(&self, key: &str) -> bool {
        self.inner.borrow().focused.as_deref() == Some(key)
    }

    fn should_focus(&self) -> bool {
        std::mem::take(&mut self.inner.borrow_mut().requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheArena;
    use crate::invalidator::Scheduler;

    fn focus_state() -> (Scheduler, FocusState) {
        let scheduler = Scheduler::new();
        let mut arena = CacheArena::new(scheduler.clone());
        let (id, _) = arena.get_or_allocate("a");
        let state = FocusState::new(scheduler.invalidator(id));
        (scheduler, state)
    }

    #[test]
    fn test_focus_and_blur() {
        let (scheduler, focus) = focus_state();
        assert!(!focus.is_focused("input"));

        focus.set_focused("input");
        assert!(focus.is_focused("input"));
        assert!(scheduler.has_pending());
        scheduler.take_pending();

        // Re-focusing the same element is not a change
        focus.set_focused("input");
        assert!(!scheduler.has_pending());

        // Blurring another element leaves focus alone
        focus.blur("other");
        assert!(focus.is_focused("input"));

        focus.blur("input");
        assert_eq!(focus.focused(), None);
        assert!(scheduler.has_pending());
    }

    #[test]
    fn test_should_focus_is_one_shot() {
        let (scheduler, focus) = focus_state();
        assert!(!focus.should_focus());

        focus.request_focus();
        assert!(scheduler.has_pending());
        assert!(focus.should_focus());
        assert!(!focus.should_focus());
    }
}
