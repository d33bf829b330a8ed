//! Effect Implementation
//!
//! An Effect is a computation that re-runs whenever reactive state it read
//! during its last run changes.
//!
//! # How Effects Work
//!
//! 1. `run_as_effect` wraps the function and, unless `lazy` is set, runs it
//!    immediately to establish the initial dependencies.
//!
//! 2. While the function runs, the effect is the current effect of the
//!    reactive context, so every tracked read subscribes it.
//!
//! 3. When a dependency is triggered the effect is notified: its scheduler is
//!    called if it has one, otherwise it re-runs synchronously.
//!
//! 4. Before each run the effect leaves every dependency set it joined in
//!    the previous run, so branches that are no longer taken stop triggering
//!    it.
//!
//! # Stopping
//!
//! `stop` calls the `on_stop` hook, removes the effect from every dependency
//! set and marks it inactive. A stopped effect can still be run by hand; it
//! then behaves like a plain function call, so its reads are attributed to
//! whatever effect is running around it.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::context::ReactiveContext;
use super::dep::Dep;
use super::subscriber::{EffectId, Subscriber};

/// Callback that takes over what happens when an effect is triggered.
pub type Scheduler = Arc<dyn Fn() + Send + Sync>;

type OnStop = Box<dyn FnOnce() + Send>;

/// Options accepted by `run_as_effect`.
#[derive(Default)]
pub struct EffectOptions {
    lazy: bool,
    scheduler: Option<Scheduler>,
    on_stop: Option<OnStop>,
    allow_recurse: bool,
}

impl EffectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not run the effect on creation.
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Call `scheduler` instead of re-running when a dependency changes.
    pub fn scheduler(mut self, scheduler: impl Fn() + Send + Sync + 'static) -> Self {
        self.scheduler = Some(Arc::new(scheduler));
        self
    }

    /// Call `on_stop` the first time the effect is stopped.
    pub fn on_stop(mut self, on_stop: impl FnOnce() + Send + 'static) -> Self {
        self.on_stop = Some(Box::new(on_stop));
        self
    }

    /// Allow the effect to be triggered by its own writes.
    pub fn allow_recurse(mut self, allow: bool) -> Self {
        self.allow_recurse = allow;
        self
    }
}

impl fmt::Debug for EffectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectOptions")
            .field("lazy", &self.lazy)
            .field("scheduler", &self.scheduler.is_some())
            .field("on_stop", &self.on_stop.is_some())
            .field("allow_recurse", &self.allow_recurse)
            .finish()
    }
}

/// A trackable, re-runnable computation.
///
/// Cloning an `Effect` clones the handle; all clones share one identity.
pub struct Effect<T: 'static = ()> {
    inner: Arc<EffectInner<T>>,
}

struct EffectInner<T> {
    id: EffectId,
    func: Box<dyn Fn() -> T + Send + Sync>,
    scheduler: Option<Scheduler>,
    allow_recurse: bool,
    state: Mutex<EffectState>,
}

struct EffectState {
    active: bool,
    /// Dependency sets joined since the last run, in join order.
    deps: SmallVec<[Dep; 4]>,
    on_stop: Option<OnStop>,
    run_count: usize,
}

impl<T: 'static> Effect<T> {
    /// Create an effect without running it.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::with_parts(func, None, None, false)
    }

    /// Create an effect whose notifications go to `scheduler`.
    pub fn with_scheduler<F, S>(func: F, scheduler: S) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        S: Fn() + Send + Sync + 'static,
    {
        Self::with_parts(func, Some(Arc::new(scheduler)), None, false)
    }

    fn with_parts<F>(
        func: F,
        scheduler: Option<Scheduler>,
        on_stop: Option<OnStop>,
        allow_recurse: bool,
    ) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(EffectInner {
                id: EffectId::new(),
                func: Box::new(func),
                scheduler,
                allow_recurse,
                state: Mutex::new(EffectState {
                    active: true,
                    deps: SmallVec::new(),
                    on_stop,
                    run_count: 0,
                }),
            }),
        }
    }

    pub fn id(&self) -> EffectId {
        self.inner.id
    }

    /// Run the function, tracking its reads if the effect is active.
    pub fn run(&self) -> T {
        EffectInner::run(&self.inner)
    }

    /// Unsubscribe from everything and stop reacting. Idempotent.
    pub fn stop(&self) {
        self.inner.stop();
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.lock().active
    }

    /// Number of tracked runs so far.
    pub fn run_count(&self) -> usize {
        self.inner.state.lock().run_count
    }

    /// Number of dependency sets the effect currently belongs to.
    pub fn dependency_count(&self) -> usize {
        self.inner.state.lock().deps.len()
    }

    pub fn has_scheduler(&self) -> bool {
        self.inner.scheduler.is_some()
    }
}

impl<T: 'static> EffectInner<T> {
    fn run(this: &Arc<Self>) -> T {
        let active = this.state.lock().active;
        if !active {
            return (this.func)();
        }

        this.cleanup();
        trace!(effect = ?this.id, "run effect");

        let _ctx = ReactiveContext::enter(Arc::clone(this) as Arc<dyn Subscriber>);
        let result = (this.func)();
        this.state.lock().run_count += 1;
        result
    }

    /// Leave every dependency set joined so far.
    fn cleanup(&self) {
        let deps = std::mem::take(&mut self.state.lock().deps);
        for dep in &deps {
            dep.remove(self.id);
        }
    }

    fn stop(&self) {
        let on_stop = {
            let mut state = self.state.lock();
            if !state.active {
                return;
            }
            state.active = false;
            state.on_stop.take()
        };

        debug!(effect = ?self.id, "stop effect");
        if let Some(on_stop) = on_stop {
            on_stop();
        }
        self.cleanup();
    }
}

impl<T: 'static> Subscriber for EffectInner<T> {
    fn id(&self) -> EffectId {
        self.id
    }

    fn notify(self: Arc<Self>) {
        if !self.state.lock().active {
            return;
        }

        match &self.scheduler {
            Some(scheduler) => scheduler(),
            None => {
                Self::run(&self);
            }
        }
    }

    fn allows_recurse(&self) -> bool {
        self.allow_recurse
    }

    fn is_active(&self) -> bool {
        self.state.lock().active
    }

    fn joined(&self, dep: &Dep) {
        self.state.lock().deps.push(dep.clone());
    }
}

impl<T: 'static> Clone for Effect<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> PartialEq for Effect<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: 'static> fmt::Debug for Effect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("active", &state.active)
            .field("run_count", &state.run_count)
            .field("dependency_count", &state.deps.len())
            .finish()
    }
}

/// Handle returned by `run_as_effect`.
///
/// `run` executes the effect directly, bypassing its scheduler.
pub struct EffectRunner<T: 'static = ()> {
    effect: Effect<T>,
}

impl<T: 'static> EffectRunner<T> {
    pub fn run(&self) -> T {
        self.effect.run()
    }

    /// The underlying effect, e.g. for a manual `stop`.
    pub fn effect(&self) -> &Effect<T> {
        &self.effect
    }
}

impl<T: 'static> Clone for EffectRunner<T> {
    fn clone(&self) -> Self {
        Self {
            effect: self.effect.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for EffectRunner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectRunner")
            .field("effect", &self.effect)
            .finish()
    }
}

/// Wrap `func` in an effect, run it unless `options` say lazy, and return
/// a runner bound to it.
pub fn run_as_effect<T, F>(func: F, options: EffectOptions) -> EffectRunner<T>
where
    T: 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    let EffectOptions {
        lazy,
        scheduler,
        on_stop,
        allow_recurse,
    } = options;

    let effect = Effect::with_parts(func, scheduler, on_stop, allow_recurse);
    if !lazy {
        effect.run();
    }

    EffectRunner { effect }
}

/// Stop the effect behind `runner`.
pub fn stop<T: 'static>(runner: &EffectRunner<T>) {
    runner.effect.stop();
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::dep::track_effects;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        (count.clone(), count)
    }

    #[test]
    fn effect_runs_on_creation() {
        let (count, count_clone) = counter();

        let runner = run_as_effect(
            move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
            },
            EffectOptions::new(),
        );

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(runner.effect().run_count(), 1);
    }

    #[test]
    fn lazy_effect_does_not_run_on_creation() {
        let (count, count_clone) = counter();

        let runner = run_as_effect(
            move || count_clone.fetch_add(1, Ordering::SeqCst) + 1,
            EffectOptions::new().lazy(true),
        );

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(runner.run(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn runner_returns_the_result() {
        let runner = run_as_effect(|| "done", EffectOptions::new());
        assert_eq!(runner.run(), "done");
    }

    #[test]
    fn run_sets_the_current_effect() {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();

        let runner = run_as_effect(
            move || {
                *seen_clone.lock() = ReactiveContext::current_effect();
            },
            EffectOptions::new(),
        );

        assert_eq!(*seen.lock(), Some(runner.effect().id()));
        assert!(ReactiveContext::current_effect().is_none());
    }

    #[test]
    fn stop_is_idempotent_and_calls_on_stop_once() {
        let (stops, stops_clone) = counter();

        let runner = run_as_effect(
            || {},
            EffectOptions::new().on_stop(move || {
                stops_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        stop(&runner);
        stop(&runner);

        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(!runner.effect().is_active());
    }

    #[test]
    fn stopped_effect_still_runs_untracked() {
        let (count, count_clone) = counter();

        let runner = run_as_effect(
            move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
                ReactiveContext::current_effect()
            },
            EffectOptions::new(),
        );
        runner.effect().stop();

        assert_eq!(runner.run(), None);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(runner.effect().run_count(), 1);
    }

    #[test]
    fn effect_stopped_during_its_run_joins_nothing_afterwards() {
        let (a, b) = (Dep::new(), Dep::new());
        let slot: Arc<Mutex<Option<Effect>>> = Arc::new(Mutex::new(None));

        let (a_clone, b_clone, slot_clone) = (a.clone(), b.clone(), slot.clone());
        let effect = Effect::new(move || {
            track_effects(&a_clone);
            let this = slot_clone.lock().clone();
            if let Some(this) = this {
                this.stop();
            }
            track_effects(&b_clone);
        });
        *slot.lock() = Some(effect.clone());

        effect.run();

        assert!(!effect.is_active());
        assert!(a.is_empty());
        assert!(b.is_empty());
        assert_eq!(effect.dependency_count(), 0);
        slot.lock().take();
    }

    #[test]
    fn notify_uses_scheduler_instead_of_running() {
        let (runs, runs_clone) = counter();
        let (scheduled, scheduled_clone) = counter();

        let effect = Effect::with_scheduler(
            move || {
                runs_clone.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                scheduled_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        Arc::clone(&effect.inner).notify();
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(scheduled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clone_shares_state() {
        let effect1 = Effect::new(|| {});
        let effect2 = effect1.clone();

        assert_eq!(effect1.id(), effect2.id());
        assert_eq!(effect1, effect2);

        effect1.run();
        assert_eq!(effect2.run_count(), 1);

        effect1.stop();
        assert!(!effect2.is_active());
    }
}
