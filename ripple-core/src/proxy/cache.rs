//! Proxy identity caches.
//!
//! One map per mode, from target identity to the live proxy for that
//! target. Entries hold weak handles: a proxy nobody references is dropped
//! and evicts itself, and the next wrap of the same target creates a fresh
//! one.

use std::sync::{Arc, OnceLock, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::reactive::{ProxyInner, Reactive};
use super::ProxyMode;
use crate::value::TargetId;

type ProxyMap = DashMap<TargetId, Weak<ProxyInner>>;

struct ProxyMaps {
    mutable: ProxyMap,
    readonly: ProxyMap,
    shallow_mutable: ProxyMap,
    shallow_readonly: ProxyMap,
}

static MAPS: OnceLock<ProxyMaps> = OnceLock::new();

fn map_for(mode: ProxyMode) -> &'static ProxyMap {
    let maps = MAPS.get_or_init(|| ProxyMaps {
        mutable: DashMap::new(),
        readonly: DashMap::new(),
        shallow_mutable: DashMap::new(),
        shallow_readonly: DashMap::new(),
    });

    match mode {
        ProxyMode::Mutable => &maps.mutable,
        ProxyMode::Readonly => &maps.readonly,
        ProxyMode::ShallowMutable => &maps.shallow_mutable,
        ProxyMode::ShallowReadonly => &maps.shallow_readonly,
    }
}

/// The live proxy for `(target, mode)`, created with `create` if there is none.
pub(super) fn get_or_insert_with(
    target: TargetId,
    mode: ProxyMode,
    create: impl FnOnce() -> Reactive,
) -> Reactive {
    match map_for(mode).entry(target) {
        Entry::Occupied(mut entry) => match entry.get().upgrade() {
            Some(inner) => Reactive::from_inner(inner),
            None => {
                let proxy = create();
                entry.insert(Arc::downgrade(proxy.inner()));
                proxy
            }
        },
        Entry::Vacant(entry) => {
            let proxy = create();
            entry.insert(Arc::downgrade(proxy.inner()));
            proxy
        }
    }
}

/// Remove the entry for `(target, mode)` if its proxy is gone.
pub(super) fn evict(target: TargetId, mode: ProxyMode) {
    if MAPS.get().is_some() {
        map_for(mode).remove_if(&target, |_, weak| weak.strong_count() == 0);
    }
}
