//! Property-based tests for ripple-core using proptest.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;
use ripple_core::{computed, reactive, readonly, run_as_effect, to_raw, EffectOptions, Object, Value};

fn watch_key(state: &Value, key: &'static str, reads: usize) -> Arc<AtomicUsize> {
    let runs = Arc::new(AtomicUsize::new(0));
    let (reader, runs_clone) = (state.clone(), runs.clone());
    run_as_effect(
        move || {
            runs_clone.fetch_add(1, Ordering::SeqCst);
            for _ in 0..reads {
                reader.get(key);
            }
        },
        EffectOptions::new(),
    );
    runs
}

proptest! {
    /// Test that an effect runs once per write that changes the value.
    #[test]
    fn effect_runs_once_per_change(
        writes in prop::collection::vec(0i32..4, 0..50),
        reads in 1usize..4,
    ) {
        let state = reactive(Object::from_fields([("n", 0)]));
        let runs = watch_key(&state, "n", reads);

        let mut current = 0;
        let mut changes = 0;
        for &value in &writes {
            if value != current {
                changes += 1;
                current = value;
            }
            state.set("n", value);
        }

        prop_assert_eq!(runs.load(Ordering::SeqCst), 1 + changes);
    }

    /// Test that writes to unrelated keys never reach the effect.
    #[test]
    fn unrelated_writes_are_ignored(values in prop::collection::vec(any::<i32>(), 1..30)) {
        let state = reactive(Object::from_fields([("watched", 0), ("other", 0)]));
        let runs = watch_key(&state, "watched", 1);

        for &value in &values {
            state.set("other", value);
        }

        prop_assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    /// Test that proxies are identity stable and unwrap to their target.
    #[test]
    fn proxy_identity_is_stable(fields in prop::collection::btree_map("[a-z]{1,6}", any::<i32>(), 0..10)) {
        let obj = Object::from_fields(fields.clone());
        let raw = Value::Object(obj.clone());

        prop_assert_eq!(reactive(obj.clone()), reactive(obj.clone()));
        prop_assert_eq!(readonly(obj.clone()), readonly(obj.clone()));
        prop_assert_eq!(to_raw(&reactive(obj.clone())), raw.clone());
        prop_assert_eq!(to_raw(&readonly(reactive(obj.clone()))), raw);

        let proxy = reactive(obj);
        for (name, value) in &fields {
            prop_assert_eq!(proxy.get(name.as_str()), Value::from(*value));
        }
    }

    /// Test that a computed recomputes at most once per read, however many
    /// writes happened in between.
    #[test]
    fn computed_recomputes_at_most_once_per_read(
        rounds in prop::collection::vec(prop::collection::vec(1i32..100, 0..5), 1..10),
    ) {
        let state = reactive(Object::from_fields([("n", 0)]));
        let calls = Arc::new(AtomicUsize::new(0));

        let (reader, calls_clone) = (state.clone(), calls.clone());
        let c = computed(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            reader.get("n")
        });

        let mut expected = 0;
        let mut current = 0;
        let mut dirty = true;
        for writes in &rounds {
            for &value in writes {
                if value != current {
                    dirty = true;
                    current = value;
                }
                state.set("n", value);
            }
            prop_assert_eq!(c.value(), Value::from(current));
            if dirty {
                expected += 1;
                dirty = false;
            }
            prop_assert_eq!(calls.load(Ordering::SeqCst), expected);
        }
    }

    /// Test that pushes through a proxy keep the length in step.
    #[test]
    fn push_tracks_length(values in prop::collection::vec(any::<i32>(), 0..40)) {
        let list = reactive(Object::array());
        let seen = Arc::new(AtomicUsize::new(0));

        let (reader, seen_clone) = (list.clone(), seen.clone());
        run_as_effect(
            move || {
                let len = reader.as_reactive().map_or(0, |proxy| proxy.len());
                seen_clone.store(len, Ordering::SeqCst);
            },
            EffectOptions::new(),
        );

        let proxy = list.as_reactive().cloned();
        for &value in &values {
            prop_assert!(proxy.as_ref().is_some_and(|p| p.push(value)));
        }

        prop_assert_eq!(seen.load(Ordering::SeqCst), values.len());
    }
}
