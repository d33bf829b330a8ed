//! The dynamic value type stored in targets, refs and computed values.

use std::fmt;
use std::sync::Arc;

use super::{Key, Object, MAX_ARRAY_LENGTH};
use crate::proxy::Reactive;
use crate::refs::AnyRef;

/// A dynamically typed value.
///
/// Scalars compare by value. `Object`, `Reactive` and `Ref` compare by
/// identity. Numbers use the "same value" rule: `NaN` equals `NaN`, and
/// `0.0` differs from `-0.0`.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Arc<str>),
    /// A raw, untracked object.
    Object(Object),
    /// A reactive or readonly proxy.
    Reactive(Reactive),
    /// A ref, computed ref or object-field ref.
    Ref(AnyRef),
}

impl Value {
    /// Whether two values are the same under the change-detection rule.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => {
                (a.is_nan() && b.is_nan())
                    || (a == b && a.is_sign_negative() == b.is_sign_negative())
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Reactive(a), Value::Reactive(b)) => a.ptr_eq(b),
            (Value::Ref(a), Value::Ref(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Whether this value is an object or a proxy, i.e. something a proxy can wrap.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Reactive(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_reactive(&self) -> Option<&Reactive> {
        match self {
            Value::Reactive(proxy) => Some(proxy),
            _ => None,
        }
    }

    pub fn as_any_ref(&self) -> Option<&AnyRef> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// A valid array length: a non-negative integral number no larger than
    /// `MAX_ARRAY_LENGTH`.
    pub(crate) fn as_length(&self) -> Option<usize> {
        match self {
            Value::Number(n)
                if *n >= 0.0 && n.fract() == 0.0 && *n <= MAX_ARRAY_LENGTH as f64 =>
            {
                Some(*n as usize)
            }
            _ => None,
        }
    }

    /// Read a key of an object or proxy. Any other value reads as `Undefined`.
    pub fn get(&self, key: impl Into<Key>) -> Value {
        match self {
            Value::Object(obj) => obj.get(key),
            Value::Reactive(proxy) => proxy.get(key),
            _ => Value::Undefined,
        }
    }

    /// Write a key of an object or proxy. Returns `false` for any other value.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> bool {
        match self {
            Value::Object(obj) => obj.set(key, value),
            Value::Reactive(proxy) => proxy.set(key, value),
            _ => false,
        }
    }

    /// The enumerable keys of an object or proxy.
    pub fn keys(&self) -> Vec<Key> {
        match self {
            Value::Object(obj) => obj.keys(),
            Value::Reactive(proxy) => proxy.own_keys(),
            _ => Vec::new(),
        }
    }

    /// Whether this is an array or a proxy over one.
    pub fn is_array(&self) -> bool {
        match self {
            Value::Object(obj) => obj.is_array(),
            Value::Reactive(proxy) => proxy.is_array(),
            _ => false,
        }
    }
}

/// `true` when `new` differs from `old` under the change-detection rule.
pub fn has_changed(new: &Value, old: &Value) -> bool {
    !new.same_value(old)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Object(obj) => fmt::Debug::fmt(obj, f),
            Value::Reactive(proxy) => fmt::Debug::fmt(proxy, f),
            Value::Ref(r) => fmt::Debug::fmt(r, f),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

impl_from_int!(i32, i64, u32, u64, usize);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

impl From<Reactive> for Value {
    fn from(proxy: Reactive) -> Self {
        Value::Reactive(proxy)
    }
}

impl From<AnyRef> for Value {
    fn from(r: AnyRef) -> Self {
        Value::Ref(r)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
