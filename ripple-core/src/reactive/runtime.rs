//! Reactive Runtime
//!
//! The runtime owns the dependency registry: for every tracked target, a map
//! from key to the `Dep` of effects that read that key.
//!
//! # How It Works
//!
//! 1. When a proxy is read inside a running effect, `track` records the
//!    effect in the `Dep` for `(target, key)`, creating both lazily.
//!
//! 2. When a proxy is written, `trigger` picks the `Dep`s the mutation can
//!    affect, merges their members into one de-duplicated list and notifies
//!    each effect (scheduler or re-run).
//!
//! 3. When a raw object is dropped, its registry entry is removed with it.
//!
//! # Teardown
//!
//! An effect whose closure holds a proxy keeps that proxy's object alive,
//! and the object's `Dep`s keep the effect alive. Such an effect and its
//! registry entries live until the effect is stopped with `stop` (or
//! `Effect::stop`), or until the host calls `Runtime::forget` for the
//! target. Hosts that create effects dynamically should stop them when done.
//!
//! # Thread Safety
//!
//! The registry is a process-wide concurrent map. The running effect lives
//! in the thread-local `ReactiveContext`. No registry lock is held while
//! effects run.

use std::sync::OnceLock;

use dashmap::DashMap;
use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::context::ReactiveContext;
use super::dep::{track_effects, trigger_effects, Dep};
use super::subscriber::{EffectId, Subscriber};
use crate::value::{Key, TargetId, Value};

/// How a tracked read observed its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackOp {
    /// The value of the key was read.
    Get,
    /// The presence of the key was checked.
    Has,
    /// The key set was enumerated.
    Iterate,
}

/// How a write changed its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerOp {
    /// An existing key got a different value.
    Set,
    /// A new key appeared.
    Add,
    /// A key was removed.
    Delete,
    /// Every key was removed.
    Clear,
}

type KeyToDepMap = IndexMap<Key, Dep>;

static REGISTRY: OnceLock<DashMap<TargetId, KeyToDepMap>> = OnceLock::new();

fn registry() -> &'static DashMap<TargetId, KeyToDepMap> {
    REGISTRY.get_or_init(DashMap::new)
}

/// Record that the running effect depends on `key` of `target`.
///
/// Does nothing unless an effect is running and tracking is enabled.
pub fn track(target: TargetId, op: TrackOp, key: &Key) {
    if !ReactiveContext::is_tracking() {
        return;
    }

    let dep = registry()
        .entry(target)
        .or_default()
        .entry(key.clone())
        .or_default()
        .clone();

    trace!(target = %target, ?op, key = %key, "track");
    track_effects(&dep);
}

/// Notify the effects that depend on a mutated key of `target`.
///
/// - `Clear` affects every key of the target.
/// - `Add` affects the key and the `Iterate` sentinel; adding an array index
///   affects `Length` in place of the (previously absent) index.
/// - `Delete` affects the key and the `Iterate` sentinel.
/// - `Set` affects only the key; setting an array's `Length` also affects
///   every index at or past the new length.
pub fn trigger(
    target: TargetId,
    op: TriggerOp,
    key: &Key,
    new_value: Option<&Value>,
    old_value: Option<&Value>,
) {
    let deps: SmallVec<[Dep; 4]> = {
        let Some(deps_map) = registry().get(&target) else {
            return;
        };

        match op {
            TriggerOp::Clear => deps_map.values().cloned().collect(),
            TriggerOp::Add => {
                let own = match key {
                    Key::Index(_) => deps_map.get(&Key::Length),
                    _ => deps_map.get(key),
                };
                own.into_iter()
                    .chain(deps_map.get(&Key::Iterate))
                    .cloned()
                    .collect()
            }
            TriggerOp::Delete => deps_map
                .get(key)
                .into_iter()
                .chain(deps_map.get(&Key::Iterate))
                .cloned()
                .collect(),
            TriggerOp::Set => {
                let mut deps: SmallVec<[Dep; 4]> =
                    deps_map.get(key).into_iter().cloned().collect();
                // Shrinking an array also affects the indices cut off.
                if let (Key::Length, Some(len)) = (key, new_value.and_then(Value::as_length)) {
                    deps.extend(
                        deps_map
                            .iter()
                            .filter(|(k, _)| matches!(k, Key::Index(i) if *i >= len))
                            .map(|(_, dep)| dep.clone()),
                    );
                }
                deps
            }
        }
    };

    let mut effects: IndexMap<EffectId, std::sync::Arc<dyn Subscriber>> = IndexMap::new();
    for dep in &deps {
        for subscriber in dep.subscribers() {
            effects.entry(subscriber.id()).or_insert(subscriber);
        }
    }

    debug!(
        target = %target,
        ?op,
        key = %key,
        ?new_value,
        ?old_value,
        effects = effects.len(),
        "trigger"
    );
    trigger_effects(effects.into_values());
}

/// Administrative access to the dependency registry.
pub struct Runtime;

impl Runtime {
    /// Drop every dependency set recorded for `target`.
    ///
    /// Called automatically when a raw object is dropped. Call it directly to
    /// release the effects subscribed to a target that is still referenced,
    /// for example one captured by an effect that was never stopped.
    pub fn forget(target: TargetId) {
        if let Some(registry) = REGISTRY.get() {
            // Dropping the map may drop effects and, through them, other
            // objects that forget themselves; do it after the shard unlocks.
            let removed = registry.remove(&target);
            drop(removed);
        }
    }

    /// Whether any key of `target` has ever been tracked.
    pub fn is_tracked(target: TargetId) -> bool {
        REGISTRY
            .get()
            .is_some_and(|registry| registry.contains_key(&target))
    }

    /// Number of effects currently subscribed to `key` of `target`.
    pub fn dependent_count(target: TargetId, key: &Key) -> usize {
        REGISTRY
            .get()
            .and_then(|registry| {
                registry
                    .get(&target)
                    .and_then(|deps_map| deps_map.get(key).map(Dep::len))
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockEffect {
        id: EffectId,
        notified: AtomicUsize,
    }

    impl MockEffect {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                id: EffectId::new(),
                notified: AtomicUsize::new(0),
            })
        }

        fn count(&self) -> usize {
            self.notified.load(Ordering::SeqCst)
        }
    }

    impl Subscriber for MockEffect {
        fn id(&self) -> EffectId {
            self.id
        }

        fn notify(self: Arc<Self>) {
            self.notified.fetch_add(1, Ordering::SeqCst);
        }

        fn allows_recurse(&self) -> bool {
            false
        }

        fn joined(&self, _dep: &Dep) {}
    }

    fn track_as(effect: &Arc<MockEffect>, target: TargetId, key: Key) {
        let _ctx = ReactiveContext::enter(effect.clone());
        track(target, TrackOp::Get, &key);
    }

    #[test]
    fn track_without_effect_is_noop() {
        let target = TargetId::new();
        track(target, TrackOp::Get, &Key::from("a"));
        assert!(!Runtime::is_tracked(target));
    }

    #[test]
    fn set_notifies_only_that_key() {
        let target = TargetId::new();
        let a = MockEffect::new();
        let b = MockEffect::new();
        track_as(&a, target, Key::from("a"));
        track_as(&b, target, Key::from("b"));

        trigger(target, TriggerOp::Set, &Key::from("a"), None, None);
        assert_eq!(a.count(), 1);
        assert_eq!(b.count(), 0);
    }

    #[test]
    fn add_and_delete_notify_iteration() {
        let target = TargetId::new();
        let iterating = MockEffect::new();
        track_as(&iterating, target, Key::Iterate);

        trigger(target, TriggerOp::Add, &Key::from("new"), None, None);
        trigger(target, TriggerOp::Delete, &Key::from("new"), None, None);
        trigger(target, TriggerOp::Set, &Key::from("new"), None, None);

        assert_eq!(iterating.count(), 2);
    }

    #[test]
    fn array_add_notifies_length() {
        let target = TargetId::new();
        let length = MockEffect::new();
        track_as(&length, target, Key::Length);

        trigger(target, TriggerOp::Add, &Key::Index(3), None, None);
        assert_eq!(length.count(), 1);
    }

    #[test]
    fn shrinking_length_notifies_cut_indices() {
        let target = TargetId::new();
        let kept = MockEffect::new();
        let cut = MockEffect::new();
        track_as(&kept, target, Key::Index(0));
        track_as(&cut, target, Key::Index(2));

        let len = Value::from(1);
        trigger(target, TriggerOp::Set, &Key::Length, Some(&len), None);
        assert_eq!(kept.count(), 0);
        assert_eq!(cut.count(), 1);
    }

    #[test]
    fn clear_notifies_every_key_once() {
        let target = TargetId::new();
        let effect = MockEffect::new();
        track_as(&effect, target, Key::from("a"));
        track_as(&effect, target, Key::from("b"));
        track_as(&effect, target, Key::Iterate);

        trigger(target, TriggerOp::Clear, &Key::Iterate, None, None);
        assert_eq!(effect.count(), 1);
    }

    #[test]
    fn trigger_on_untracked_target_is_noop() {
        trigger(TargetId::new(), TriggerOp::Clear, &Key::Iterate, None, None);
    }

    #[test]
    fn forget_drops_dependencies() {
        let target = TargetId::new();
        let effect = MockEffect::new();
        track_as(&effect, target, Key::from("a"));
        assert_eq!(Runtime::dependent_count(target, &Key::from("a")), 1);

        Runtime::forget(target);
        assert!(!Runtime::is_tracked(target));
        trigger(target, TriggerOp::Set, &Key::from("a"), None, None);
        assert_eq!(effect.count(), 0);
    }
}
