//! Reactive Context
//!
//! The reactive context tracks which effect is currently running and whether
//! reads should be tracked at all. This enables automatic dependency
//! tracking: when a proxy or ref is read, the current effect is registered
//! as a dependent.
//!
//! # Implementation
//!
//! Each thread owns one context. Entering an effect swaps the effect into
//! the "current" slot and forces tracking on; the returned guard restores
//! both when dropped, so nested runs unwind correctly even if the effect
//! panics.
//!
//! Tracking can be switched off or on for a region with
//! `pause_tracking` / `enable_tracking`, each paired with a `reset_tracking`
//! that pops back to the previous state. The flag lives on a stack so the
//! pairs nest to any depth.

use std::cell::RefCell;
use std::sync::Arc;

use super::subscriber::{EffectId, Subscriber};

thread_local! {
    static CONTEXT: RefCell<ContextState> = RefCell::new(ContextState::new());
}

struct ContextState {
    /// The effect whose run is in progress, if any.
    active: Option<Arc<dyn Subscriber>>,
    /// Whether reads are currently recorded.
    should_track: bool,
    /// Saved `should_track` values from pause/enable calls.
    track_stack: Vec<bool>,
}

impl ContextState {
    fn new() -> Self {
        Self {
            active: None,
            should_track: true,
            track_stack: Vec::new(),
        }
    }
}

/// Guard that restores the previous context when dropped.
pub struct ReactiveContext {
    effect_id: EffectId,
    previous: Option<Arc<dyn Subscriber>>,
    previous_should_track: bool,
}

impl ReactiveContext {
    /// Make `subscriber` the current effect with tracking enabled.
    pub(crate) fn enter(subscriber: Arc<dyn Subscriber>) -> Self {
        let effect_id = subscriber.id();
        let (previous, previous_should_track) = CONTEXT.with(|ctx| {
            let mut ctx = ctx.borrow_mut();
            let previous = ctx.active.replace(subscriber);
            let previous_should_track = std::mem::replace(&mut ctx.should_track, true);
            (previous, previous_should_track)
        });

        Self {
            effect_id,
            previous,
            previous_should_track,
        }
    }

    /// Check if an effect is running on this thread.
    pub fn is_active() -> bool {
        CONTEXT.with(|ctx| ctx.borrow().active.is_some())
    }

    /// The ID of the running effect, if any.
    pub fn current_effect() -> Option<EffectId> {
        CONTEXT.with(|ctx| ctx.borrow().active.as_ref().map(|sub| sub.id()))
    }

    /// Whether a read right now would be recorded.
    pub fn is_tracking() -> bool {
        CONTEXT.with(|ctx| {
            let ctx = ctx.borrow();
            ctx.should_track && ctx.active.is_some()
        })
    }

    /// The effect a read should be attributed to, if tracking is on.
    pub(crate) fn tracking_subscriber() -> Option<Arc<dyn Subscriber>> {
        CONTEXT.with(|ctx| {
            let ctx = ctx.borrow();
            if ctx.should_track {
                ctx.active.clone()
            } else {
                None
            }
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let previous_should_track = self.previous_should_track;
        // The thread may already be tearing down its locals.
        let popped = CONTEXT.try_with(|ctx| {
            let mut ctx = ctx.borrow_mut();
            ctx.should_track = previous_should_track;
            std::mem::replace(&mut ctx.active, previous)
        });

        if let Ok(popped) = popped {
            debug_assert_eq!(
                popped.as_ref().map(|sub| sub.id()),
                Some(self.effect_id),
                "ReactiveContext mismatch",
            );
        }
    }
}

/// Stop recording reads until the matching `reset_tracking`.
pub fn pause_tracking() {
    CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        let current = ctx.should_track;
        ctx.track_stack.push(current);
        ctx.should_track = false;
    });
}

/// Record reads until the matching `reset_tracking`.
pub fn enable_tracking() {
    CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        let current = ctx.should_track;
        ctx.track_stack.push(current);
        ctx.should_track = true;
    });
}

/// Undo the most recent `pause_tracking` or `enable_tracking`.
///
/// With nothing to undo, tracking is switched on.
pub fn reset_tracking() {
    let _ = CONTEXT.try_with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        ctx.should_track = ctx.track_stack.pop().unwrap_or(true);
    });
}

/// Scoped form of `pause_tracking` / `enable_tracking`.
///
/// Dropping the guard calls `reset_tracking`.
#[must_use = "tracking is reset as soon as the guard is dropped"]
pub struct TrackingGuard {
    _private: (),
}

impl TrackingGuard {
    pub fn pause() -> Self {
        pause_tracking();
        Self { _private: () }
    }

    pub fn enable() -> Self {
        enable_tracking();
        Self { _private: () }
    }
}

impl Drop for TrackingGuard {
    fn drop(&mut self) {
        reset_tracking();
    }
}

/// Run `f` without recording any reads it performs.
pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
    let _guard = TrackingGuard::pause();
    f()
}
