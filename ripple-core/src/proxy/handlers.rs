//! Read and write interception.
//!
//! Every access through a `Reactive` lands here. Mutable proxies track reads
//! and trigger on writes; readonly proxies ignore writes and do not track
//! their own reads (a readonly view over a mutable proxy still tracks
//! through the inner proxy).

use tracing::warn;

use super::reactive::{is_readonly, make_reactive, Reactive, Target};
use super::ProxyMode;
use crate::reactive::{track, trigger, untracked, TrackOp, TriggerOp};
use crate::value::{has_changed, Key, Value};

impl Reactive {
    /// Read a key.
    ///
    /// Object values are returned wrapped in a proxy of the same
    /// readonly-ness unless this proxy is shallow.
    pub fn get(&self, key: impl Into<Key>) -> Value {
        let key = key.into();
        let value = match self.target() {
            Target::Object(obj) => {
                let key = obj.normalize(key);
                if self.is_reactive() {
                    track(obj.id(), TrackOp::Get, &key);
                }
                obj.get(key)
            }
            Target::Proxy(inner) => inner.get(key),
        };

        if self.is_shallow() || !value.is_object() {
            return value;
        }

        let child_mode = if self.is_readonly() {
            ProxyMode::Readonly
        } else {
            ProxyMode::Mutable
        };
        make_reactive(&value, child_mode)
    }

    /// Write a key.
    ///
    /// On a readonly proxy this is a no-op that still reports success.
    /// Returns `false` if the current value is a readonly proxy or the
    /// target cannot hold the key. Triggers `Add` for a new key, `Set` for an
    /// existing key whose value changed, and nothing otherwise.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> bool {
        let key = key.into();
        let value = value.into();

        if self.is_readonly() {
            warn!(proxy = %self.id(), key = %key, "set on readonly proxy ignored");
            return true;
        }

        let obj = match self.target() {
            Target::Object(obj) => obj,
            Target::Proxy(inner) => return inner.set(key, value),
        };

        let key = obj.normalize(key);
        let old_value = obj.get(key.clone());
        if is_readonly(&old_value) {
            return false;
        }

        let had_key = obj.contains_key(key.clone());
        if !obj.set(key.clone(), value.clone()) {
            return false;
        }

        if !had_key {
            trigger(obj.id(), TriggerOp::Add, &key, Some(&value), None);
        } else if has_changed(&value, &old_value) {
            trigger(obj.id(), TriggerOp::Set, &key, Some(&value), Some(&old_value));
        }
        true
    }

    /// Delete a key, triggering `Delete` if it existed.
    pub fn delete(&self, key: impl Into<Key>) -> bool {
        let key = key.into();

        if self.is_readonly() {
            warn!(proxy = %self.id(), key = %key, "delete on readonly proxy ignored");
            return true;
        }

        let obj = match self.target() {
            Target::Object(obj) => obj,
            Target::Proxy(inner) => return inner.delete(key),
        };

        let key = obj.normalize(key);
        let had_key = obj.contains_key(key.clone());
        let old_value = obj.get(key.clone());
        let result = obj.delete(key.clone());

        if result && had_key {
            trigger(obj.id(), TriggerOp::Delete, &key, None, Some(&old_value));
        }
        result
    }

    /// Whether a key is present. Tracked as `Has`, except for sentinel keys.
    pub fn has(&self, key: impl Into<Key>) -> bool {
        match self.target() {
            Target::Object(obj) => {
                let key = obj.normalize(key);
                let result = obj.contains_key(key.clone());
                if self.is_reactive() && !key.is_sentinel() {
                    track(obj.id(), TrackOp::Has, &key);
                }
                result
            }
            Target::Proxy(inner) => inner.has(key),
        }
    }

    /// The enumerable keys. Tracked as iteration: `Length` for arrays,
    /// `Iterate` for records.
    pub fn own_keys(&self) -> Vec<Key> {
        match self.target() {
            Target::Object(obj) => {
                if self.is_reactive() {
                    let key = if obj.is_array() { Key::Length } else { Key::Iterate };
                    track(obj.id(), TrackOp::Iterate, &key);
                }
                obj.keys()
            }
            Target::Proxy(inner) => inner.own_keys(),
        }
    }

    /// Whether the target is an array. Not tracked; shape never changes.
    pub fn is_array(&self) -> bool {
        self.to_raw().is_array()
    }

    /// Element count of an array (tracks `Length`) or field count of a
    /// record (tracks iteration).
    pub fn len(&self) -> usize {
        if self.is_array() {
            self.get(Key::Length).as_length().unwrap_or(0)
        } else {
            self.own_keys().len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append to an array.
    ///
    /// The current length is read without tracking, so an effect that
    /// pushes does not subscribe to (and re-trigger itself through) the
    /// length it changes. Returns `false` for records.
    pub fn push(&self, value: impl Into<Value>) -> bool {
        if !self.is_array() {
            return false;
        }

        match untracked(|| self.get(Key::Length)).as_length() {
            Some(len) => self.set(Key::Index(len), value),
            None => false,
        }
    }

    /// Remove every key, triggering `Clear` if anything was removed.
    pub fn clear(&self) {
        if self.is_readonly() {
            warn!(proxy = %self.id(), "clear on readonly proxy ignored");
            return;
        }

        match self.target() {
            Target::Object(obj) => {
                if obj.clear() {
                    trigger(obj.id(), TriggerOp::Clear, &Key::Iterate, None, None);
                }
            }
            Target::Proxy(inner) => inner.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{run_as_effect, EffectOptions};
    use crate::value::Object;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn count_runs(f: impl Fn() + Send + Sync + 'static) -> Arc<AtomicUsize> {
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_clone = runs.clone();
        run_as_effect(
            move || {
                runs_clone.fetch_add(1, Ordering::SeqCst);
                f();
            },
            EffectOptions::new(),
        );
        runs
    }

    #[test]
    fn get_tracks_and_set_triggers() {
        let state = Object::from_fields([("n", 0)]).reactive();
        let reader = state.clone();
        let runs = count_runs(move || {
            reader.get("n");
        });

        state.set("n", 1);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn setting_the_same_value_does_not_trigger() {
        let state = Object::from_fields([("n", f64::NAN)]).reactive();
        let reader = state.clone();
        let runs = count_runs(move || {
            reader.get("n");
        });

        state.set("n", f64::NAN);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_objects_are_wrapped() {
        let obj = Object::from_fields([("child", Object::from_fields([("x", 1)]))]);
        let proxy = obj.reactive();
        let child = proxy.get("child");
        assert!(child.as_reactive().is_some_and(Reactive::is_reactive));

        let ro_child = obj.readonly().get("child");
        assert!(ro_child.as_reactive().is_some_and(Reactive::is_readonly));

        let shallow_child = obj.shallow_reactive().get("child");
        assert!(shallow_child.as_object().is_some());
    }

    #[test]
    fn shallow_reactive_tracks_first_level_only() {
        let child = Object::from_fields([("x", 1)]);
        let obj = Object::from_fields([
            ("child", Value::Object(child.clone())),
            ("n", Value::from(0)),
        ]);
        let shallow = obj.shallow_reactive();

        let reader = shallow.clone();
        let runs = count_runs(move || {
            reader.get("n");
            reader.get("child").get("x");
        });

        child.reactive().set("x", 2);
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        shallow.set("n", 1);
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        shallow.set("child", Object::record());
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn shallow_readonly_ignores_writes() {
        let obj = Object::from_fields([("n", 1)]);
        let view = obj.shallow_readonly();

        assert!(view.set("n", 2));
        assert!(view.set("m", 3));
        assert!(view.delete("n"));
        view.clear();
        assert_eq!(obj.get("n"), Value::from(1));
        assert!(!obj.contains_key("m"));
        assert_eq!(obj.len(), 1);
    }

    #[test]
    fn readonly_writes_are_ignored() {
        let obj = Object::from_fields([("n", 1)]);
        let ro = obj.readonly();

        assert!(ro.set("n", 2));
        assert!(ro.delete("n"));
        ro.clear();
        assert_eq!(obj.get("n"), Value::from(1));
    }

    #[test]
    fn writing_over_a_readonly_value_is_refused() {
        let inner = Object::record();
        let obj = Object::from_fields([("locked", Value::Reactive(inner.readonly()))]);
        let proxy = obj.reactive();

        assert!(!proxy.set("locked", 1));
        assert!(obj.get("locked").as_reactive().is_some());
    }

    #[test]
    fn adding_a_key_triggers_iteration() {
        let state = Object::record().reactive();
        let reader = state.clone();
        let runs = count_runs(move || {
            reader.own_keys();
        });

        state.set("a", 1);
        state.set("a", 2);
        state.delete("a");
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn delete_triggers_readers_of_the_key() {
        let state = Object::from_fields([("a", 1), ("b", 2)]).reactive();
        let reader = state.clone();
        let runs = count_runs(move || {
            reader.get("a");
        });

        assert!(state.delete("b"));
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        assert!(state.delete("a"));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(state.get("a"), Value::Undefined);

        assert!(state.delete("a"));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn has_is_tracked() {
        let state = Object::record().reactive();
        let reader = state.clone();
        let runs = count_runs(move || {
            reader.has("a");
        });

        state.set("a", true);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn push_triggers_length_readers() {
        let list = Object::array().reactive();
        let reader = list.clone();
        let runs = count_runs(move || {
            reader.len();
        });

        assert!(list.push("a"));
        assert!(list.push("b"));
        assert_eq!(list.len(), 2);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn push_inside_an_effect_does_not_loop() {
        let list = Object::array().reactive();
        let writer = list.clone();
        let runs = count_runs(move || {
            writer.push(1);
        });

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn truncating_an_array_triggers_cut_elements() {
        let list = Object::from_elements([1, 2, 3]).reactive();
        let reader = list.clone();
        let runs = count_runs(move || {
            reader.get(2usize);
        });

        assert!(list.set(Key::Length, 1));
        assert_eq!(list.len(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn out_of_range_array_writes_are_refused() {
        let list = Object::from_elements([1]).reactive();
        let reader = list.clone();
        let runs = count_runs(move || {
            reader.len();
        });

        assert!(!list.set(usize::MAX, 1));
        assert!(!list.set("18446744073709551615", 1));
        assert!(!list.set(Key::Length, 1.8e19));
        assert!(!list.set(Key::Length, 1e12));
        assert_eq!(list.len(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_triggers_every_reader() {
        let state = Object::from_fields([("a", 1), ("b", 2)]).reactive();
        let reader = state.clone();
        let runs = count_runs(move || {
            reader.get("a");
            reader.get("b");
        });

        state.clear();
        state.clear();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn readonly_proxy_does_not_track() {
        let obj = Object::from_fields([("n", 0)]);
        let ro = obj.readonly();
        let runs = count_runs(move || {
            ro.get("n");
        });

        obj.reactive().set("n", 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn readonly_view_tracks_through_inner_proxy() {
        let state = Object::from_fields([("n", 0)]).reactive();
        let view = readonly_view(&state);
        let runs = count_runs(move || {
            view.get("n");
        });

        state.set("n", 1);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    fn readonly_view(proxy: &Reactive) -> Reactive {
        match make_reactive(&Value::Reactive(proxy.clone()), ProxyMode::Readonly) {
            Value::Reactive(view) => view,
            other => panic!("expected a proxy, got {other:?}"),
        }
    }
}
