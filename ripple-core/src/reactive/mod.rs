//! Effect Core
//!
//! This module implements the subscription model everything else builds on:
//! effects, dependency sets, the dependency registry, and the per-thread
//! context that tells a read which effect is running.
//!
//! # Concepts
//!
//! ## Effects
//!
//! An Effect wraps a function. Running it makes it the current effect, so
//! every tracked read performed by the function subscribes the effect to the
//! slot that was read.
//!
//! ## Track and Trigger
//!
//! `track(target, op, key)` records "the running effect read this key".
//! `trigger(target, op, key, ..)` looks up the affected dependency sets and
//! notifies their effects: through the effect's scheduler if it has one,
//! otherwise by re-running it synchronously.
//!
//! ## Pausing
//!
//! `pause_tracking` / `enable_tracking` / `reset_tracking` maintain a stack
//! of the tracking flag so a region can read state without subscribing (or
//! force subscription) and restore the outer state afterwards.

mod context;
mod subscriber;
mod dep;
mod effect;
mod runtime;

pub use context::{
    enable_tracking, pause_tracking, reset_tracking, untracked, ReactiveContext, TrackingGuard,
};
pub use subscriber::EffectId;
pub use dep::Dep;
pub use effect::{run_as_effect, stop, Effect, EffectOptions, EffectRunner, Scheduler};
pub use runtime::{track, trigger, Runtime, TrackOp, TriggerOp};

pub(crate) use dep::{track_effects, trigger_effects};
