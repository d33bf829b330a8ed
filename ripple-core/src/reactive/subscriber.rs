//! Subscriber types for the reactive system.
//!
//! A subscriber is anything that can sit in a dependency set and be notified
//! when that set is triggered. Today that is always an effect (plain effects
//! and the effects owned by computed refs), but the dependency machinery only
//! sees the type-erased `Subscriber` trait so effects of any return type can
//! share one set.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::Dep;

/// Unique identifier for an effect.
///
/// Each effect gets a unique ID when created. Dependency sets are keyed by
/// this ID, which makes membership idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(u64);

impl EffectId {
    /// Generate a new unique effect ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

/// A member of dependency sets.
pub(crate) trait Subscriber: Send + Sync {
    fn id(&self) -> EffectId;

    /// React to a triggered dependency: hand off to the scheduler if there is
    /// one, otherwise re-run.
    fn notify(self: Arc<Self>);

    /// Whether the subscriber may be notified while it is the running effect.
    fn allows_recurse(&self) -> bool;

    /// Whether the subscriber still accepts new dependencies. A stopped
    /// effect stays out of every set, even for reads made later in the run
    /// that stopped it.
    fn is_active(&self) -> bool {
        true
    }

    /// Remember that the subscriber joined `dep`, for later cleanup.
    fn joined(&self, dep: &Dep);
}
