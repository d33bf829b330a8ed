//! Refs over a single field of an object.

use std::fmt;
use std::sync::Arc;

use super::AnyRef;
use crate::value::{Key, Object, Value};

/// A ref-shaped view of one key of an object.
///
/// It owns no dependency set. Reads and writes go through the source, so
/// when the source is a reactive proxy the field ref is exactly as reactive
/// as `source.get(key)` / `source.set(key, ..)`.
#[derive(Clone)]
pub struct ObjectRef(Arc<FieldInner>);

struct FieldInner {
    source: Value,
    key: Key,
    default: Option<Value>,
}

impl ObjectRef {
    pub fn new(source: Value, key: impl Into<Key>, default: Option<Value>) -> Self {
        Self(Arc::new(FieldInner {
            source,
            key: key.into(),
            default,
        }))
    }

    /// The field's value, or the default if the field is `Undefined`.
    pub fn value(&self) -> Value {
        let value = self.0.source.get(self.0.key.clone());
        match (&value, &self.0.default) {
            (Value::Undefined, Some(default)) => default.clone(),
            _ => value,
        }
    }

    /// Write the field. Returns whether the source accepted the write.
    pub fn set_value(&self, value: impl Into<Value>) -> bool {
        self.0.source.set(self.0.key.clone(), value)
    }

    pub fn source(&self) -> &Value {
        &self.0.source
    }

    pub fn key(&self) -> &Key {
        &self.0.key
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("source", &self.0.source)
            .field("key", &self.0.key)
            .field("default", &self.0.default)
            .finish()
    }
}

/// A ref for `source[key]`.
///
/// If the field already holds a ref, that ref is returned so identity is
/// preserved. Otherwise the result is an `ObjectRef` over the field.
pub fn to_ref(source: &Value, key: impl Into<Key>, default: Option<Value>) -> AnyRef {
    let key = key.into();
    match source.get(key.clone()) {
        Value::Ref(existing) => existing,
        _ => AnyRef::Field(ObjectRef::new(source.clone(), key, default)),
    }
}

/// A container of the same shape as `source` holding `to_ref(source, key)`
/// for every key.
pub fn to_refs(source: &Value) -> Object {
    let refs = if source.is_array() {
        Object::array()
    } else {
        Object::record()
    };

    for key in source.keys() {
        let field = to_ref(source, key.clone(), None);
        refs.set(key, field);
    }
    refs
}
