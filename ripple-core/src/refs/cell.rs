//! Ref Implementation
//!
//! A Ref is a single reactive cell. It holds a value and the set of effects
//! that read it.
//!
//! # How Refs Work
//!
//! 1. Reading `value()` inside a running effect subscribes the effect to the
//!    ref's own dependency set, which is created on first use.
//!
//! 2. Writing a different value through `set_value()` notifies every
//!    subscriber.
//!
//! # Deep and Shallow
//!
//! A deep ref keeps two forms of its value: the raw value (used for change
//! detection) and a reactive view of it (returned by reads). A shallow ref
//! stores what it is given and never wraps it.

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::proxy::{is_readonly, is_shallow, to_raw, to_reactive};
use crate::reactive::{track_effects, trigger_effects, Dep, ReactiveContext};
use crate::value::{has_changed, Value};

/// A reactive single-value container.
///
/// Cloning a `Ref` clones the handle; all clones share one cell.
#[derive(Clone)]
pub struct Ref(Arc<RefInner>);

struct RefInner {
    shallow: bool,
    state: RwLock<RefState>,
    dep: OnceLock<Dep>,
}

struct RefState {
    raw: Value,
    value: Value,
}

impl Ref {
    /// A deep ref. Objects are stored raw and read back as reactive proxies.
    pub fn new(value: impl Into<Value>) -> Self {
        create_ref(value.into(), false)
    }

    /// A shallow ref. The value is stored and returned as given.
    pub fn shallow(value: impl Into<Value>) -> Self {
        create_ref(value.into(), true)
    }

    /// Read the value, subscribing the running effect.
    pub fn value(&self) -> Value {
        track_ref_value(&self.0.dep);
        self.0.state.read().value.clone()
    }

    /// Replace the value, notifying subscribers if the raw value changed.
    ///
    /// Deep refs store the raw form of the incoming value, unless it is a
    /// shallow or readonly proxy, which is kept as is.
    pub fn set_value(&self, value: impl Into<Value>) {
        let value = value.into();
        let use_original = self.0.shallow || is_shallow(&value) || is_readonly(&value);
        let raw = if use_original { value.clone() } else { to_raw(&value) };

        let replaced = {
            let mut state = self.0.state.write();
            if !has_changed(&raw, &state.raw) {
                return;
            }
            let wrapped = if use_original { value } else { to_reactive(&raw) };
            let old_raw = std::mem::replace(&mut state.raw, raw);
            let old_value = std::mem::replace(&mut state.value, wrapped);
            (old_raw, old_value)
        };
        drop(replaced);

        trigger_ref_value(&self.0.dep);
    }

    pub fn is_shallow(&self) -> bool {
        self.0.shallow
    }

    /// Number of effects currently subscribed to this ref.
    pub fn dependent_count(&self) -> usize {
        self.0.dep.get().map_or(0, Dep::len)
    }

    /// Whether two handles refer to the same ref.
    pub fn ptr_eq(&self, other: &Ref) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Ref {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("value", &self.0.state.read().value)
            .field("shallow", &self.0.shallow)
            .finish()
    }
}

/// Create a ref, deep or shallow.
pub fn create_ref(value: Value, shallow: bool) -> Ref {
    let (raw, wrapped) = if shallow {
        (value.clone(), value)
    } else {
        (to_raw(&value), to_reactive(&value))
    };

    Ref(Arc::new(RefInner {
        shallow,
        state: RwLock::new(RefState {
            raw,
            value: wrapped,
        }),
        dep: OnceLock::new(),
    }))
}

/// Subscribe the running effect to a ref's dependency set, creating the set
/// on first use.
pub(crate) fn track_ref_value(dep: &OnceLock<Dep>) {
    if ReactiveContext::is_tracking() {
        track_effects(dep.get_or_init(Dep::new));
    }
}

/// Notify every subscriber of a ref.
pub(crate) fn trigger_ref_value(dep: &OnceLock<Dep>) {
    if let Some(dep) = dep.get() {
        trigger_effects(dep.subscribers());
    }
}
