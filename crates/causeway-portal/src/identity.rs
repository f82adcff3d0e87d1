//! Identity registry
//!
//! A weak side table in both directions: guest wrappers are tagged with the
//! host object they proxy, and host objects remember their live wrapper so
//! re-crossing the boundary never produces a duplicate. Being a side table,
//! the tag is invisible to property lookup, enumeration, and the
//! interception hooks by construction.
//!
//! Entries hold no strong reference to guest objects; dead entries are
//! swept opportunistically once the table doubles past a watermark.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Weak};
use tracing::trace;

use causeway_engine::GuestObject;

use crate::host::HostObject;

const SWEEP_FLOOR: usize = 64;

struct TagEntry {
    wrapper: Weak<GuestObject>,
    host: HostObject,
}

struct Table<T> {
    entries: FxHashMap<usize, T>,
    next_sweep: usize,
}

impl<T> Table<T> {
    fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            next_sweep: SWEEP_FLOOR,
        }
    }

    fn sweep_if_needed(&mut self, live: impl Fn(&T) -> bool) {
        if self.entries.len() < self.next_sweep {
            return;
        }
        self.entries.retain(|_, entry| live(entry));
        self.next_sweep = (self.entries.len() * 2).max(SWEEP_FLOOR);
    }
}

/// Side table linking guest wrappers and the host objects they proxy
pub struct IdentityRegistry {
    tags: Mutex<Table<TagEntry>>,
    wrappers: Mutex<Table<Weak<GuestObject>>>,
}

impl IdentityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tags: Mutex::new(Table::new()),
            wrappers: Mutex::new(Table::new()),
        }
    }

    /// Tag a guest wrapper with the host object it proxies.
    ///
    /// Idempotent when called again with the same payload.
    pub fn tag(&self, wrapper: &Arc<GuestObject>, host: HostObject) {
        let key = Arc::as_ptr(wrapper) as usize;
        {
            let mut tags = self.tags.lock();
            if let Some(existing) = tags.entries.get(&key) {
                if existing.host.same(&host) && existing.wrapper.strong_count() > 0 {
                    return;
                }
            }
            tags.sweep_if_needed(|entry| entry.wrapper.strong_count() > 0);
            trace!(category = host.category(), "tagging guest wrapper");
            tags.entries.insert(
                key,
                TagEntry {
                    wrapper: Arc::downgrade(wrapper),
                    host: host.clone(),
                },
            );
        }
        let mut wrappers = self.wrappers.lock();
        wrappers.sweep_if_needed(|entry| entry.strong_count() > 0);
        wrappers
            .entries
            .insert(host.identity_key(), Arc::downgrade(wrapper));
    }

    /// The host object a wrapper was tagged with, if the tag has not expired.
    ///
    /// A stored `Weak` guards against allocator address reuse: the entry only
    /// resolves while it still points at this exact wrapper.
    pub fn resolve(&self, wrapper: &Arc<GuestObject>) -> Option<HostObject> {
        let key = Arc::as_ptr(wrapper) as usize;
        let tags = self.tags.lock();
        let entry = tags.entries.get(&key)?;
        let live = entry.wrapper.upgrade()?;
        if Arc::ptr_eq(&live, wrapper) {
            Some(entry.host.clone())
        } else {
            None
        }
    }

    /// The live wrapper already created for a host object, if any
    pub fn wrapper_for(&self, host: &HostObject) -> Option<Arc<GuestObject>> {
        self.wrappers
            .lock()
            .entries
            .get(&host.identity_key())?
            .upgrade()
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
