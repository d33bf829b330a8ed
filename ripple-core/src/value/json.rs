//! Conversion between `Value` and `serde_json::Value`.
//!
//! Hosts usually start from plain data. Converting a JSON document yields a
//! tree of fresh raw `Object`s ready to be wrapped by a proxy; `to_json`
//! takes an untracked snapshot back out.

use serde_json::{Map, Number};

use super::{Object, Value};
use crate::proxy::to_raw;
use crate::reactive::untracked;

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::Str(s.into()),
            serde_json::Value::Array(elements) => {
                Value::Object(Object::from_elements(elements.into_iter().map(Value::from)))
            }
            serde_json::Value::Object(fields) => Value::Object(Object::from_fields(
                fields.into_iter().map(|(name, value)| (name, Value::from(value))),
            )),
        }
    }
}

impl Value {
    /// Snapshot this value as JSON without tracking any reads.
    ///
    /// Proxies are read through their raw target and refs through their
    /// current value. `Undefined` and non-finite numbers become `null`.
    /// The value must not contain reference cycles.
    pub fn to_json(&self) -> serde_json::Value {
        untracked(|| snapshot(self))
    }
}

fn snapshot(value: &Value) -> serde_json::Value {
    match value {
        Value::Undefined | Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Str(s) => serde_json::Value::String(s.to_string()),
        Value::Object(obj) => object_snapshot(obj),
        Value::Reactive(_) => match to_raw(value) {
            Value::Object(obj) => object_snapshot(&obj),
            _ => serde_json::Value::Null,
        },
        Value::Ref(r) => snapshot(&r.value()),
    }
}

fn object_snapshot(obj: &Object) -> serde_json::Value {
    if obj.is_array() {
        serde_json::Value::Array(obj.values().iter().map(snapshot).collect())
    } else {
        let fields: Map<String, serde_json::Value> = obj
            .keys()
            .into_iter()
            .zip(obj.values())
            .map(|(key, value)| (key.to_string(), snapshot(&value)))
            .collect();
        serde_json::Value::Object(fields)
    }
}
