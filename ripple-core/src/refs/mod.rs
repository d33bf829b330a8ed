//! Refs Layer
//!
//! Single-value reactive containers and the adapters built on them.
//!
//! - `Ref`: a reactive cell with its own dependency set.
//! - `ComputedRef`: a lazily recomputed derived value.
//! - `ObjectRef`: a view of one field of an object, reactive through the
//!   object's proxy.
//! - `to_refs` / `proxy_refs`: convert between an object and an object of refs.
//!
//! `AnyRef` unifies the three kinds so a ref can be stored in a `Value`.

mod cell;
mod computed;
mod field;
mod unwrap;

use std::fmt;

pub use cell::{create_ref, Ref};
pub use computed::{computed, writable_computed, ComputedRef};
pub use field::{to_ref, to_refs, ObjectRef};
pub use unwrap::{proxy_refs, ProxyRefs};

use crate::error::{ReactivityError, Result};
use crate::value::Value;

/// Any kind of ref.
#[derive(Clone)]
pub enum AnyRef {
    Plain(Ref),
    Computed(ComputedRef),
    Field(ObjectRef),
}

impl AnyRef {
    /// Read the ref's value, tracking it like the underlying ref would.
    pub fn value(&self) -> Value {
        match self {
            AnyRef::Plain(r) => r.value(),
            AnyRef::Computed(c) => c.value(),
            AnyRef::Field(f) => f.value(),
        }
    }

    /// Write the ref's value.
    pub fn set_value(&self, value: impl Into<Value>) -> Result<()> {
        match self {
            AnyRef::Plain(r) => {
                r.set_value(value);
                Ok(())
            }
            AnyRef::Computed(c) => c.set_value(value),
            AnyRef::Field(f) => {
                if f.set_value(value) {
                    Ok(())
                } else {
                    Err(ReactivityError::RejectedWrite(f.key().clone()))
                }
            }
        }
    }

    /// Whether two handles are the same ref.
    pub fn ptr_eq(&self, other: &AnyRef) -> bool {
        match (self, other) {
            (AnyRef::Plain(a), AnyRef::Plain(b)) => a.ptr_eq(b),
            (AnyRef::Computed(a), AnyRef::Computed(b)) => a.ptr_eq(b),
            (AnyRef::Field(a), AnyRef::Field(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl PartialEq for AnyRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for AnyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyRef::Plain(r) => fmt::Debug::fmt(r, f),
            AnyRef::Computed(c) => fmt::Debug::fmt(c, f),
            AnyRef::Field(field) => fmt::Debug::fmt(field, f),
        }
    }
}

impl From<Ref> for AnyRef {
    fn from(r: Ref) -> Self {
        AnyRef::Plain(r)
    }
}

impl From<ComputedRef> for AnyRef {
    fn from(c: ComputedRef) -> Self {
        AnyRef::Computed(c)
    }
}

impl From<ObjectRef> for AnyRef {
    fn from(f: ObjectRef) -> Self {
        AnyRef::Field(f)
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Value::Ref(AnyRef::Plain(r))
    }
}

impl From<ComputedRef> for Value {
    fn from(c: ComputedRef) -> Self {
        Value::Ref(AnyRef::Computed(c))
    }
}

impl From<ObjectRef> for Value {
    fn from(f: ObjectRef) -> Self {
        Value::Ref(AnyRef::Field(f))
    }
}

/// Whether `value` is a ref of any kind.
pub fn is_ref(value: &Value) -> bool {
    matches!(value, Value::Ref(_))
}

/// The ref's value if `value` is a ref, else `value` itself.
pub fn unref(value: &Value) -> Value {
    match value {
        Value::Ref(r) => r.value(),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Object;

    #[test]
    fn unref_passes_plain_values_through() {
        assert_eq!(unref(&Value::from(3)), Value::from(3));
        assert_eq!(unref(&Value::from(Ref::new(3))), Value::from(3));
        assert_eq!(unref(&Value::from(computed(|| "c"))), Value::from("c"));
    }

    #[test]
    fn is_ref_covers_every_kind() {
        let source = Value::Object(Object::from_fields([("a", 1)]));
        assert!(is_ref(&Value::from(Ref::new(1))));
        assert!(is_ref(&Value::from(computed(|| 1))));
        assert!(is_ref(&Value::from(to_ref(&source, "a", None))));
        assert!(!is_ref(&source));
    }

    #[test]
    fn field_ref_reports_rejected_writes() {
        let list = Value::Object(Object::array());
        let named = to_ref(&list, "name", None);
        assert!(matches!(
            named.set_value(1),
            Err(ReactivityError::RejectedWrite(_))
        ));
    }
}
