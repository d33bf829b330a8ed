//! Values
//!
//! The concrete data representation the proxies intercept. Instead of
//! reflecting over arbitrary native structs, every tracked target is an
//! `Object`: a record or an array of dynamically typed `Value`s. This keeps
//! interception explicit: a proxy can only read and write through the
//! handful of operations `Object` exposes.

mod key;
mod object;
mod dynamic;
mod json;

pub use key::{Key, TargetId, MAX_ARRAY_INDEX, MAX_ARRAY_LENGTH};
pub use object::Object;
pub use dynamic::{has_changed, Value};
