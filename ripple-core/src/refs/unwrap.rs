//! Transparent ref unwrapping over an object of refs.

use tracing::trace;

use super::unref;
use crate::proxy::is_reactive;
use crate::value::{Key, Value};

/// A view over an object whose ref-valued fields read as their values.
///
/// Writing a plain value to a field that holds a ref updates the ref in
/// place instead of replacing it. A view created over a mutable reactive
/// proxy passes every access straight through.
#[derive(Clone, Debug)]
pub struct ProxyRefs {
    source: Value,
    unwrap: bool,
}

impl ProxyRefs {
    /// Read a key, unwrapping a ref-valued field.
    pub fn get(&self, key: impl Into<Key>) -> Value {
        let value = self.source.get(key);
        if self.unwrap {
            unref(&value)
        } else {
            value
        }
    }

    /// Write a key. Returns whether the write was accepted.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> bool {
        let key = key.into();
        let value = value.into();
        if !self.unwrap {
            return self.source.set(key, value);
        }

        match self.source.get(key.clone()) {
            Value::Ref(existing) if !matches!(value, Value::Ref(_)) => {
                trace!(key = %key, "write through ref");
                existing.set_value(value).is_ok()
            }
            _ => self.source.set(key, value),
        }
    }

    pub fn keys(&self) -> Vec<Key> {
        self.source.keys()
    }

    /// The wrapped object.
    pub fn source(&self) -> &Value {
        &self.source
    }

    pub fn into_source(self) -> Value {
        self.source
    }
}

/// Wrap `source` so its ref-valued fields unwrap on access.
///
/// A mutable reactive proxy is returned as a pass-through view.
pub fn proxy_refs(source: impl Into<Value>) -> ProxyRefs {
    let source = source.into();
    let unwrap = !is_reactive(&source);
    ProxyRefs { source, unwrap }
}
