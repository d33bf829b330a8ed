//! Property keys and target identities.
//!
//! A `Key` names one slot of a tracked target. Besides ordinary fields and
//! array indices there are two reserved keys: `Length`, the element count of
//! an array, and `Iterate`, a sentinel that stands for "the set of keys
//! changed". `Iterate` is never stored in a target; it only appears in the
//! dependency registry.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Largest valid array index.
pub const MAX_ARRAY_INDEX: usize = u32::MAX as usize - 1;

/// Largest valid array length.
pub const MAX_ARRAY_LENGTH: usize = u32::MAX as usize;

/// Unique identity of a raw object or a proxy.
///
/// Used as the key of the dependency registry and of the proxy identity
/// caches, so it must never be reused while the process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

impl TargetId {
    /// Generate a new unique target ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A property key of a record or array.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A named field of a record.
    Field(Arc<str>),
    /// An element position of an array.
    Index(usize),
    /// The `length` of an array.
    Length,
    /// Sentinel tracked by key enumeration; fired when keys are added or removed.
    Iterate,
}

impl Key {
    /// Whether this is a reserved key that never names stored data.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Key::Iterate)
    }

    /// Interpret this key against a record: indices become decimal field names.
    pub(crate) fn for_record(self) -> Key {
        match self {
            Key::Index(i) => Key::Field(i.to_string().into()),
            Key::Length => Key::Field("length".into()),
            other => other,
        }
    }

    /// Interpret this key against an array: canonical integer field names
    /// become indices and `"length"` becomes `Length`. Integers above
    /// `MAX_ARRAY_INDEX` are plain field names, which arrays refuse to store.
    pub(crate) fn for_array(self) -> Key {
        match self {
            Key::Field(name) if &*name == "length" => Key::Length,
            Key::Field(name) => match parse_index(&name) {
                Some(i) => Key::Index(i),
                None => Key::Field(name),
            },
            Key::Index(i) if i > MAX_ARRAY_INDEX => Key::Field(i.to_string().into()),
            other => other,
        }
    }
}

/// Parse a canonical array index (`"0"`, `"12"`, not `"012"`, `"-1"` or
/// anything above `MAX_ARRAY_INDEX`).
fn parse_index(name: &str) -> Option<usize> {
    if name.is_empty() || (name.len() > 1 && name.starts_with('0')) {
        return None;
    }
    if !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse::<u64>()
        .ok()
        .filter(|&i| i <= MAX_ARRAY_INDEX as u64)
        .map(|i| i as usize)
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Field(name.into())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Field(name.into())
    }
}

impl From<Arc<str>> for Key {
    fn from(name: Arc<str>) -> Self {
        Key::Field(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Field(name) => f.write_str(name),
            Key::Index(i) => write!(f, "{i}"),
            Key::Length => f.write_str("length"),
            Key::Iterate => f.write_str("<iterate>"),
        }
    }
}
