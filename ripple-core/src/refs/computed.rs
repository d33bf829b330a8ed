//! Computed Implementation
//!
//! A computed ref is a cached derived value that re-evaluates only when it
//! is read after one of its dependencies changed.
//!
//! # How Computed Refs Work
//!
//! 1. The getter runs inside an effect owned by the computed. The effect's
//!    scheduler does not re-run the getter; it marks the computed dirty and
//!    notifies whoever read the computed.
//!
//! 2. Reading `value()` subscribes the running effect to the computed
//!    itself, so computeds chain and can be watched by effects.
//!
//! 3. If the computed is dirty, the read clears the flag and runs the
//!    getter again. Otherwise the cached value is returned.
//!
//! Nothing is computed until the first read, and a computed that is never
//! read after a change never recomputes.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use tracing::{trace, warn};

use super::cell::{track_ref_value, trigger_ref_value};
use crate::error::{ReactivityError, Result};
use crate::reactive::{Dep, Effect};
use crate::value::Value;

type Setter = Box<dyn Fn(Value) + Send + Sync>;

/// A lazily recomputed derived value.
#[derive(Clone)]
pub struct ComputedRef(Arc<ComputedInner>);

struct ComputedInner {
    effect: Effect<Value>,
    setter: Option<Setter>,
    state: Mutex<ComputedState>,
    dep: OnceLock<Dep>,
}

struct ComputedState {
    dirty: bool,
    value: Value,
}

impl ComputedRef {
    fn with_parts<G>(getter: G, setter: Option<Setter>) -> Self
    where
        G: Fn() -> Value + Send + Sync + 'static,
    {
        Self(Arc::new_cyclic(|this: &Weak<ComputedInner>| {
            let this = this.clone();
            let effect = Effect::with_scheduler(getter, move || {
                if let Some(inner) = this.upgrade() {
                    inner.mark_dirty();
                }
            });

            ComputedInner {
                effect,
                setter,
                state: Mutex::new(ComputedState {
                    dirty: true,
                    value: Value::Undefined,
                }),
                dep: OnceLock::new(),
            }
        }))
    }

    /// Read the value, recomputing it first if a dependency changed.
    pub fn value(&self) -> Value {
        let inner = &self.0;
        track_ref_value(&inner.dep);

        let dirty = std::mem::replace(&mut inner.state.lock().dirty, false);
        if dirty {
            trace!(effect = ?inner.effect.id(), "recompute");
            let fresh = inner.effect.run();
            let stale = std::mem::replace(&mut inner.state.lock().value, fresh);
            drop(stale);
        }

        inner.state.lock().value.clone()
    }

    /// Pass `value` to the setter.
    ///
    /// A computed created with `computed` has no setter; writing to it logs
    /// a warning and returns `ReactivityError::ReadonlyComputed`.
    pub fn set_value(&self, value: impl Into<Value>) -> Result<()> {
        match &self.0.setter {
            Some(setter) => {
                setter(value.into());
                Ok(())
            }
            None => {
                let err = ReactivityError::ReadonlyComputed;
                warn!("{err}");
                Err(err)
            }
        }
    }

    /// Whether the next read will run the getter.
    pub fn is_dirty(&self) -> bool {
        self.0.state.lock().dirty
    }

    /// Whether the computed was created without a setter.
    pub fn is_readonly(&self) -> bool {
        self.0.setter.is_none()
    }

    /// The effect that runs the getter.
    pub fn effect(&self) -> &Effect<Value> {
        &self.0.effect
    }

    /// Number of effects currently subscribed to this computed.
    pub fn dependent_count(&self) -> usize {
        self.0.dep.get().map_or(0, Dep::len)
    }

    pub fn ptr_eq(&self, other: &ComputedRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl ComputedInner {
    fn mark_dirty(&self) {
        {
            let mut state = self.state.lock();
            if state.dirty {
                return;
            }
            state.dirty = true;
        }
        trigger_ref_value(&self.dep);
    }
}

impl Drop for ComputedInner {
    fn drop(&mut self) {
        self.effect.stop();
    }
}

impl PartialEq for ComputedRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ComputedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.state.lock();
        f.debug_struct("ComputedRef")
            .field("dirty", &state.dirty)
            .field("value", &state.value)
            .field("readonly", &self.0.setter.is_none())
            .finish()
    }
}

/// A readonly computed ref over `getter`.
pub fn computed<G, V>(getter: G) -> ComputedRef
where
    G: Fn() -> V + Send + Sync + 'static,
    V: Into<Value>,
{
    ComputedRef::with_parts(move || getter().into(), None)
}

/// A computed ref whose writes are forwarded to `set`.
pub fn writable_computed<G, V, S>(get: G, set: S) -> ComputedRef
where
    G: Fn() -> V + Send + Sync + 'static,
    V: Into<Value>,
    S: Fn(Value) + Send + Sync + 'static,
{
    ComputedRef::with_parts(move || get().into(), Some(Box::new(set)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refs::Ref;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn getter_runs_lazily_and_once_per_change() {
        let source = Ref::new(1);
        let calls = Arc::new(AtomicUsize::new(0));

        let doubled = {
            let source = source.clone();
            let calls = calls.clone();
            computed(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                source.value().as_f64().unwrap_or(0.0) * 2.0
            })
        };
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(doubled.is_dirty());

        assert_eq!(doubled.value(), Value::from(2));
        assert_eq!(doubled.value(), Value::from(2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        source.set_value(5);
        assert!(doubled.is_dirty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(doubled.value(), Value::from(10));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn readonly_computed_rejects_writes() {
        let c = computed(|| 1);
        assert!(c.is_readonly());
        assert_eq!(c.set_value(2), Err(ReactivityError::ReadonlyComputed));
        assert_eq!(c.value(), Value::from(1));
    }

    #[test]
    fn writable_computed_forwards_to_setter() {
        let source = Ref::new(1);
        let plus_one = {
            let get_source = source.clone();
            let set_source = source.clone();
            writable_computed(
                move || get_source.value().as_f64().unwrap_or(0.0) + 1.0,
                move |v| set_source.set_value(v.as_f64().unwrap_or(0.0) - 1.0),
            )
        };

        assert_eq!(plus_one.set_value(10), Ok(()));
        assert_eq!(source.value(), Value::from(9));
        assert_eq!(plus_one.value(), Value::from(10));
    }

    #[test]
    fn dropping_the_computed_unsubscribes_its_effect() {
        let source = Ref::new(1);
        let c = {
            let source = source.clone();
            computed(move || source.value())
        };
        c.value();
        assert_eq!(source.dependent_count(), 1);

        drop(c);
        assert_eq!(source.dependent_count(), 0);
    }
}
