//! Dependency sets.
//!
//! A `Dep` is the set of effects subscribed to one key of one target (or to
//! one ref). Membership is keyed by `EffectId`, so an effect that reads the
//! same key many times during one run is still notified once. Insertion
//! order is kept, which makes notification order deterministic: effects run
//! in the order they first subscribed.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use super::context::ReactiveContext;
use super::subscriber::{EffectId, Subscriber};

/// A set of effects subscribed to one reactive slot.
#[derive(Clone, Default)]
pub struct Dep(Arc<Mutex<IndexMap<EffectId, Arc<dyn Subscriber>>>>);

impl Dep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of subscribed effects.
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the effect with `id` is subscribed.
    pub fn contains(&self, id: EffectId) -> bool {
        self.0.lock().contains_key(&id)
    }

    /// Whether two handles refer to the same set.
    pub fn ptr_eq(&self, other: &Dep) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Add a subscriber. Returns `false` if it was already present.
    pub(crate) fn insert(&self, subscriber: Arc<dyn Subscriber>) -> bool {
        let mut members = self.0.lock();
        let id = subscriber.id();
        if members.contains_key(&id) {
            return false;
        }
        members.insert(id, subscriber);
        true
    }

    pub(crate) fn remove(&self, id: EffectId) {
        // The removed handle may be the last one; drop it after unlocking.
        let removed = self.0.lock().shift_remove(&id);
        drop(removed);
    }

    /// Snapshot of the current members.
    pub(crate) fn subscribers(&self) -> Vec<Arc<dyn Subscriber>> {
        self.0.lock().values().cloned().collect()
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep").field("len", &self.len()).finish()
    }
}

/// Subscribe the running effect to `dep`, if tracking is on and the effect
/// has not been stopped.
pub(crate) fn track_effects(dep: &Dep) {
    let Some(effect) = ReactiveContext::tracking_subscriber() else {
        return;
    };
    if !effect.is_active() {
        return;
    }

    if dep.insert(Arc::clone(&effect)) {
        effect.joined(dep);
    }
}

/// Notify each subscriber once, in order.
///
/// The running effect is skipped unless it allows recursion, so an effect
/// that writes what it reads does not re-enter itself.
pub(crate) fn trigger_effects(subscribers: impl IntoIterator<Item = Arc<dyn Subscriber>>) {
    for subscriber in subscribers {
        let is_running = ReactiveContext::current_effect() == Some(subscriber.id());
        if !is_running || subscriber.allows_recurse() {
            subscriber.notify();
        }
    }
}
