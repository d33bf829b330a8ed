//! Raw Objects
//!
//! An `Object` is the plain, untracked data container that proxies wrap.
//! It is either a record (insertion-ordered named fields) or an array
//! (indexed elements with a `length`). Cloning an `Object` clones the handle,
//! not the data: every clone refers to the same target and shares its
//! identity.
//!
//! Reads and writes through an `Object` never notify anyone. Reactivity is
//! added by wrapping it in a proxy (see `crate::proxy`).
//!
//! # Registry Lifetime
//!
//! The dependency registry keys its entries by the object's `TargetId`.
//! When the last handle to an object is dropped the registry entry is
//! removed, so dependency data never outlives the object it describes.
//!
//! The reverse does not hold: an effect that captures a proxy of an object
//! keeps the object alive, so neither is released while the effect is
//! active. Stop the effect (`stop` / `Effect::stop`) or call
//! `Runtime::forget` with the object's id to tear the pair down.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::{Key, TargetId, Value};
use crate::reactive::Runtime;

/// A shared raw record or array.
#[derive(Clone)]
pub struct Object(Arc<ObjectInner>);

struct ObjectInner {
    id: TargetId,
    data: RwLock<Data>,
}

enum Data {
    Record(IndexMap<Arc<str>, Value>),
    Array(Vec<Value>),
}

impl Object {
    /// Create an empty record.
    pub fn record() -> Self {
        Self::with_data(Data::Record(IndexMap::new()))
    }

    /// Create an empty array.
    pub fn array() -> Self {
        Self::with_data(Data::Array(Vec::new()))
    }

    /// Create a record from `(name, value)` pairs.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arc<str>>,
        V: Into<Value>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        Self::with_data(Data::Record(fields))
    }

    /// Create an array from its elements.
    pub fn from_elements<I, V>(elements: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::with_data(Data::Array(elements.into_iter().map(Into::into).collect()))
    }

    fn with_data(data: Data) -> Self {
        Self(Arc::new(ObjectInner {
            id: TargetId::new(),
            data: RwLock::new(data),
        }))
    }

    /// The identity of this object.
    pub fn id(&self) -> TargetId {
        self.0.id
    }

    /// Whether this object is an array.
    pub fn is_array(&self) -> bool {
        matches!(*self.0.data.read(), Data::Array(_))
    }

    /// Whether two handles refer to the same object.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Interpret `key` against this object's shape.
    pub fn normalize(&self, key: impl Into<Key>) -> Key {
        let key = key.into();
        if self.is_array() {
            key.for_array()
        } else {
            key.for_record()
        }
    }

    /// Read a key. Missing keys read as `Value::Undefined`.
    pub fn get(&self, key: impl Into<Key>) -> Value {
        let key = self.normalize(key);
        match (&*self.0.data.read(), &key) {
            (Data::Record(fields), Key::Field(name)) => {
                fields.get(name).cloned().unwrap_or_default()
            }
            (Data::Array(elements), Key::Index(i)) => {
                elements.get(*i).cloned().unwrap_or_default()
            }
            (Data::Array(elements), Key::Length) => Value::Number(elements.len() as f64),
            _ => Value::Undefined,
        }
    }

    /// Write a key.
    ///
    /// Writing past the end of an array fills the gap with `Undefined`.
    /// Writing `Length` truncates or extends the array. Returns `false` when
    /// the key cannot hold data on this shape (named fields on arrays, a
    /// length above `MAX_ARRAY_LENGTH` or not an integer, the `Iterate`
    /// sentinel) or when the array cannot grow.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> bool {
        let key = self.normalize(key);
        let value = value.into();
        // Replaced values are dropped after the lock is released; they may
        // hold the last handle to other objects or computed values.
        let mut data = self.0.data.write();
        let displaced: Option<Vec<Value>> = match (&mut *data, key) {
            (Data::Record(fields), Key::Field(name)) => {
                Some(fields.insert(name, value).into_iter().collect())
            }
            (Data::Array(elements), Key::Index(i)) => {
                let grown = i.checked_add(1).is_some_and(|len| grow(elements, len));
                grown.then(|| vec![std::mem::replace(&mut elements[i], value)])
            }
            (Data::Array(elements), Key::Length) => match value.as_length() {
                Some(len) if len <= elements.len() => Some(elements.split_off(len)),
                Some(len) => grow(elements, len).then(Vec::new),
                None => None,
            },
            _ => None,
        };
        drop(data);
        displaced.is_some()
    }

    /// Delete a key.
    ///
    /// Deleting an array element leaves an `Undefined` hole and keeps the
    /// length. `Length` itself cannot be deleted.
    pub fn delete(&self, key: impl Into<Key>) -> bool {
        let key = self.normalize(key);
        let mut data = self.0.data.write();
        let removed: Option<Option<Value>> = match (&mut *data, key) {
            (Data::Record(fields), Key::Field(name)) => Some(fields.shift_remove(&name)),
            (Data::Array(elements), Key::Index(i)) => Some(
                elements
                    .get_mut(i)
                    .map(|slot| std::mem::replace(slot, Value::Undefined)),
            ),
            (Data::Array(_), Key::Field(_)) => Some(None),
            _ => None,
        };
        drop(data);
        removed.is_some()
    }

    /// Whether a key is present. Array indices are present below the length.
    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        let key = self.normalize(key);
        match (&*self.0.data.read(), &key) {
            (Data::Record(fields), Key::Field(name)) => fields.contains_key(name),
            (Data::Array(elements), Key::Index(i)) => *i < elements.len(),
            (Data::Array(_), Key::Length) => true,
            _ => false,
        }
    }

    /// The enumerable keys, in order: field names of a record, indices of an array.
    pub fn keys(&self) -> Vec<Key> {
        match &*self.0.data.read() {
            Data::Record(fields) => fields.keys().cloned().map(Key::Field).collect(),
            Data::Array(elements) => (0..elements.len()).map(Key::Index).collect(),
        }
    }

    /// Number of fields or elements.
    pub fn len(&self) -> usize {
        match &*self.0.data.read() {
            Data::Record(fields) => fields.len(),
            Data::Array(elements) => elements.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every field or element. Returns whether anything was removed.
    pub fn clear(&self) -> bool {
        // Drop the old contents after the lock is released; they may hold
        // the last handle to other objects.
        let removed = {
            let mut data = self.0.data.write();
            match &mut *data {
                Data::Record(fields) => std::mem::take(fields).into_values().collect::<Vec<_>>(),
                Data::Array(elements) => std::mem::take(elements),
            }
        };
        !removed.is_empty()
    }

    /// A snapshot of the stored values in key order.
    pub fn values(&self) -> Vec<Value> {
        match &*self.0.data.read() {
            Data::Record(fields) => fields.values().cloned().collect(),
            Data::Array(elements) => elements.clone(),
        }
    }
}

/// Extend `elements` with `Undefined` up to `len`. Fails instead of aborting
/// when the allocation cannot be made.
fn grow(elements: &mut Vec<Value>, len: usize) -> bool {
    if len > elements.len() {
        if elements.try_reserve(len - elements.len()).is_err() {
            return false;
        }
        elements.resize(len, Value::Undefined);
    }
    true
}

impl Drop for ObjectInner {
    fn drop(&mut self) {
        Runtime::forget(self.id);
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = if self.is_array() { "array" } else { "record" };
        f.debug_struct("Object")
            .field("id", &self.id())
            .field("shape", &shape)
            .field("len", &self.len())
            .finish()
    }
}
