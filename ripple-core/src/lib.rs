//! Ripple Core
//!
//! This crate provides a fine-grained reactivity engine. It implements:
//!
//! - Effects and automatic dependency tracking
//! - Reactive and readonly proxies over dynamic objects
//! - Refs, computed values and object-field refs
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `value`: the dynamic `Value` type and the raw `Object` containers
//! - `reactive`: effects, dependency sets, the registry and `track`/`trigger`
//! - `proxy`: the interception layer wiring objects into the registry
//! - `refs`: single-value containers built on the effect core
//!
//! # Example
//!
//! ```rust,ignore
//! use ripple_core::{computed, reactive, run_as_effect, EffectOptions, Object};
//!
//! let state = reactive(Object::from_fields([("count", 0)]));
//!
//! let reader = state.clone();
//! let doubled = computed(move || reader.get("count").as_f64().unwrap_or(0.0) * 2.0);
//!
//! run_as_effect(
//!     move || println!("doubled: {:?}", doubled.value()),
//!     EffectOptions::new(),
//! );
//!
//! // The effect re-runs and prints "doubled: Number(10.0)".
//! state.set("count", 5);
//! ```

pub mod value;
pub mod reactive;
pub mod proxy;
pub mod refs;
mod error;

pub use error::{ReactivityError, Result};
pub use value::{has_changed, Key, Object, TargetId, Value, MAX_ARRAY_INDEX, MAX_ARRAY_LENGTH};
pub use reactive::{
    enable_tracking, pause_tracking, reset_tracking, run_as_effect, stop, track, trigger,
    untracked, Effect, EffectOptions, EffectRunner, TrackOp, TriggerOp,
};
pub use proxy::{
    is_proxy, is_reactive, is_readonly, is_shallow, reactive, readonly, shallow_reactive,
    shallow_readonly, to_raw, to_reactive, to_readonly, ProxyMode, Reactive,
};
pub use refs::{
    computed, create_ref, is_ref, proxy_refs, to_ref, to_refs, unref, writable_computed, AnyRef,
    ComputedRef, ObjectRef, ProxyRefs, Ref,
};
