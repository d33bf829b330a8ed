//! The proxy type and the wrapping entry points.

use std::fmt;
use std::sync::Arc;

use super::{cache, ProxyMode};
use crate::refs::AnyRef;
use crate::value::{Object, TargetId, Value};

/// A reactive (or readonly) view over an object.
///
/// All reads and writes go through the handlers in this module, which call
/// `track` and `trigger`. For a given target and mode there is at most one
/// live proxy, so wrapping the same object twice yields the same `Reactive`
/// (compare with `ptr_eq` or `==`).
#[derive(Clone)]
pub struct Reactive(Arc<ProxyInner>);

pub(crate) struct ProxyInner {
    id: TargetId,
    pub(super) target: Target,
    pub(super) readonly: bool,
    pub(super) shallow: bool,
}

/// What a proxy wraps: a raw object, or (for a readonly view over a mutable
/// proxy) another proxy.
#[derive(Clone)]
pub(super) enum Target {
    Object(Object),
    Proxy(Reactive),
}

impl Target {
    fn id(&self) -> TargetId {
        match self {
            Target::Object(obj) => obj.id(),
            Target::Proxy(proxy) => proxy.id(),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Target::Object(obj) => Value::Object(obj.clone()),
            Target::Proxy(proxy) => Value::Reactive(proxy.clone()),
        }
    }
}

impl Reactive {
    /// The proxy for `obj` in `mode`, created on first use.
    pub fn new(obj: &Object, mode: ProxyMode) -> Self {
        Self::wrap(Target::Object(obj.clone()), mode)
    }

    fn wrap(target: Target, mode: ProxyMode) -> Self {
        cache::get_or_insert_with(target.id(), mode, || {
            Self(Arc::new(ProxyInner {
                id: TargetId::new(),
                target,
                readonly: mode.is_readonly(),
                shallow: mode.is_shallow(),
            }))
        })
    }

    pub(super) fn from_inner(inner: Arc<ProxyInner>) -> Self {
        Self(inner)
    }

    pub(super) fn inner(&self) -> &Arc<ProxyInner> {
        &self.0
    }

    pub(super) fn target(&self) -> &Target {
        &self.0.target
    }

    /// Identity of the proxy itself (not of its target).
    pub fn id(&self) -> TargetId {
        self.0.id
    }

    pub fn mode(&self) -> ProxyMode {
        ProxyMode::new(self.0.readonly, self.0.shallow)
    }

    /// A mutable proxy.
    pub fn is_reactive(&self) -> bool {
        !self.0.readonly
    }

    pub fn is_readonly(&self) -> bool {
        self.0.readonly
    }

    pub fn is_shallow(&self) -> bool {
        self.0.shallow
    }

    /// The wrapped target, one level down: a raw object, or the mutable
    /// proxy a readonly view was created over.
    pub fn raw(&self) -> Value {
        self.0.target.to_value()
    }

    /// The innermost raw object.
    pub fn to_raw(&self) -> Object {
        match &self.0.target {
            Target::Object(obj) => obj.clone(),
            Target::Proxy(proxy) => proxy.to_raw(),
        }
    }

    /// Whether two handles are the same proxy.
    pub fn ptr_eq(&self, other: &Reactive) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Drop for ProxyInner {
    fn drop(&mut self) {
        cache::evict(
            self.target.id(),
            ProxyMode::new(self.readonly, self.shallow),
        );
    }
}

impl PartialEq for Reactive {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Reactive {}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("id", &self.0.id)
            .field("mode", &self.mode())
            .field("target", &self.0.target.id())
            .finish()
    }
}

impl Object {
    /// The mutable deep proxy over this object.
    pub fn reactive(&self) -> Reactive {
        Reactive::new(self, ProxyMode::Mutable)
    }

    /// The readonly deep proxy over this object.
    pub fn readonly(&self) -> Reactive {
        Reactive::new(self, ProxyMode::Readonly)
    }

    /// The mutable proxy that tracks only the first level of this object.
    pub fn shallow_reactive(&self) -> Reactive {
        Reactive::new(self, ProxyMode::ShallowMutable)
    }

    /// The readonly proxy over only the first level of this object.
    pub fn shallow_readonly(&self) -> Reactive {
        Reactive::new(self, ProxyMode::ShallowReadonly)
    }
}

/// Wrap `value` in a proxy of the given mode.
///
/// - Scalars and refs are returned unchanged.
/// - A proxy is returned unchanged, except that a readonly mode wraps a
///   mutable proxy in a readonly view. A mutable mode never unwraps a
///   readonly proxy.
/// - A raw object gets the cached proxy for its mode.
pub fn make_reactive(value: &Value, mode: ProxyMode) -> Value {
    match value {
        Value::Object(obj) => Value::Reactive(Reactive::new(obj, mode)),
        Value::Reactive(proxy) if mode.is_readonly() && !proxy.is_readonly() => {
            Value::Reactive(Reactive::wrap(Target::Proxy(proxy.clone()), mode))
        }
        _ => value.clone(),
    }
}

/// Deep mutable proxy.
pub fn reactive(value: impl Into<Value>) -> Value {
    make_reactive(&value.into(), ProxyMode::Mutable)
}

/// Deep readonly proxy.
pub fn readonly(value: impl Into<Value>) -> Value {
    make_reactive(&value.into(), ProxyMode::Readonly)
}

/// Shallow mutable proxy.
pub fn shallow_reactive(value: impl Into<Value>) -> Value {
    make_reactive(&value.into(), ProxyMode::ShallowMutable)
}

/// Shallow readonly proxy.
pub fn shallow_readonly(value: impl Into<Value>) -> Value {
    make_reactive(&value.into(), ProxyMode::ShallowReadonly)
}

/// `reactive` for objects, identity for everything else.
pub fn to_reactive(value: &Value) -> Value {
    make_reactive(value, ProxyMode::Mutable)
}

/// `readonly` for objects, identity for everything else.
pub fn to_readonly(value: &Value) -> Value {
    make_reactive(value, ProxyMode::Readonly)
}

/// Whether `value` is a mutable proxy.
pub fn is_reactive(value: &Value) -> bool {
    matches!(value, Value::Reactive(proxy) if proxy.is_reactive())
}

/// Whether `value` is a readonly proxy.
pub fn is_readonly(value: &Value) -> bool {
    matches!(value, Value::Reactive(proxy) if proxy.is_readonly())
}

/// Whether `value` is any kind of proxy.
pub fn is_proxy(value: &Value) -> bool {
    is_reactive(value) || is_readonly(value)
}

/// Whether `value` is a shallow proxy or a shallow ref.
pub fn is_shallow(value: &Value) -> bool {
    match value {
        Value::Reactive(proxy) => proxy.is_shallow(),
        Value::Ref(AnyRef::Plain(r)) => r.is_shallow(),
        _ => false,
    }
}

/// Strip every proxy layer, returning the innermost raw object.
/// Non-proxies are returned unchanged.
pub fn to_raw(value: &Value) -> Value {
    match value {
        Value::Reactive(proxy) => Value::Object(proxy.to_raw()),
        _ => value.clone(),
    }
}
