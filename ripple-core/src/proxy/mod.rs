//! Proxy Layer
//!
//! A `Reactive` is an interception wrapper over a raw `Object`. It presents
//! the same keys and values as its target, but every access goes through a
//! handler that talks to the dependency registry:
//!
//! - reads (`get`, `has`, `own_keys`) call `track`;
//! - writes (`set`, `delete`, `push`, `clear`) call `trigger` when they
//!   actually change something.
//!
//! # Modes
//!
//! One wrapper type covers all four variants through two flags:
//!
//! | mode              | writes   | nested objects      |
//! |-------------------|----------|---------------------|
//! | `Mutable`         | notify   | wrapped mutable     |
//! | `Readonly`        | ignored  | wrapped readonly    |
//! | `ShallowMutable`  | notify   | returned raw        |
//! | `ShallowReadonly` | ignored  | returned raw        |
//!
//! Each mode has its own identity cache, so there is at most one live proxy
//! per (target, mode) and `reactive(obj) == reactive(obj)`.

mod mode;
mod cache;
mod reactive;
mod handlers;

pub use mode::ProxyMode;
pub use reactive::{
    is_proxy, is_reactive, is_readonly, is_shallow, make_reactive, reactive, readonly,
    shallow_reactive, shallow_readonly, to_raw, to_reactive, to_readonly, Reactive,
};
