//! Named resources and the path-addressed resource cache.
//!
//! A resource embeds [`ResourceData`] (refcount core + path + owner set)
//! and registers its path in the process-wide [`ResourceCache`]. The cache
//! holds *non-owning* pointers: a resource evicts its own path when it is
//! destroyed, so at most one live resource exists per path.

use std::collections::{HashMap, HashSet};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use once_cell::sync::Lazy;
use tracing::{trace, warn};

use crate::refcore::{Ref, RefCore, RefCounted};
use crate::registry::ObjectId;

/// Implemented by every cacheable resource type.
pub trait Resource: RefCounted {
    /// The embedded resource bookkeeping record.
    fn resource_data(&self) -> &ResourceData;

    /// Human-readable type tag used by [`ResourceCache::dump`].
    fn resource_type(&self) -> &'static str {
        "Resource"
    }
}

/// Bookkeeping embedded in every resource: refcount core, cache path,
/// local-to-scene flag and the non-owning owner set.
///
/// Owners are recorded as [`ObjectId`]s, never as strong references;
/// lifetime is rooted at the resource, so resource ↔ owner cycles cannot
/// keep anything alive.
pub struct ResourceData {
    core: RefCore,
    path: RwLock<String>,
    name: RwLock<String>,
    local_to_scene: AtomicBool,
    owners: Mutex<HashSet<ObjectId>>,
}

impl ResourceData {
    /// Fresh record with no path and no owners.
    pub fn new() -> Self {
        Self {
            core: RefCore::new(),
            path: RwLock::new(String::new()),
            name: RwLock::new(String::new()),
            local_to_scene: AtomicBool::new(false),
            owners: Mutex::new(HashSet::new()),
        }
    }

    /// The refcount core. Resources forward [`RefCounted::ref_core`] here.
    pub fn core(&self) -> &RefCore {
        &self.core
    }

    /// The cache path, empty when uncached.
    pub fn path(&self) -> String {
        self.path.read().expect("resource path poisoned").clone()
    }

    /// Display name.
    pub fn name(&self) -> String {
        self.name.read().expect("resource name poisoned").clone()
    }

    /// Set the display name.
    pub fn set_name(&self, name: &str) {
        *self.name.write().expect("resource name poisoned") = name.to_owned();
    }

    /// Whether the resource is duplicated per scene instance.
    pub fn is_local_to_scene(&self) -> bool {
        self.local_to_scene.load(Ordering::Acquire)
    }

    /// Set the local-to-scene flag.
    pub fn set_local_to_scene(&self, local: bool) {
        self.local_to_scene.store(local, Ordering::Release);
    }

    /// Record a non-owning owner.
    pub fn add_owner(&self, id: ObjectId) {
        self.owners.lock().expect("owner set poisoned").insert(id);
    }

    /// Forget an owner.
    pub fn remove_owner(&self, id: ObjectId) {
        self.owners.lock().expect("owner set poisoned").remove(&id);
    }

    /// Snapshot of the current owner ids.
    pub fn owners(&self) -> Vec<ObjectId> {
        self.owners
            .lock()
            .expect("owner set poisoned")
            .iter()
            .copied()
            .collect()
    }

    fn store_path(&self, path: &str) {
        *self.path.write().expect("resource path poisoned") = path.to_owned();
    }
}

impl Default for ResourceData {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ResourceData {
    fn drop(&mut self) {
        let path = std::mem::take(self.path.get_mut().expect("resource path poisoned"));
        if !path.is_empty() {
            ResourceCache::global().untrack(&path, self as *const ResourceData);
        }
    }
}

#[derive(Clone, Copy)]
struct CacheEntry {
    obj: NonNull<dyn Resource>,
    // Identity token compared on eviction, never dereferenced during drop.
    data: *const ResourceData,
    type_tag: &'static str,
}

// Entries are only dereferenced under the cache lock, and eviction (which
// requires the exclusive lock) always precedes deallocation.
unsafe impl Send for CacheEntry {}
unsafe impl Sync for CacheEntry {}

/// Path-addressed cache of named resources.
///
/// Lookups run under the shared lock; insertion, take-over and eviction
/// run under the exclusive lock. The cache never owns: dropping the last
/// strong reference to a resource evicts its path via [`ResourceData`]'s
/// destructor, which acquires the exclusive lock — so the final drop must
/// never happen while the shared lock is held.
pub struct ResourceCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

static GLOBAL_CACHE: Lazy<ResourceCache> = Lazy::new(|| ResourceCache {
    entries: RwLock::new(HashMap::new()),
});

impl ResourceCache {
    /// The process-wide cache instance.
    pub fn global() -> &'static ResourceCache {
        &GLOBAL_CACHE
    }

    /// Whether a live resource is registered at `path`.
    pub fn has(&self, path: &str) -> bool {
        self.entries
            .read()
            .expect("resource cache poisoned")
            .contains_key(path)
    }

    /// Look up `path` and return an owning handle.
    ///
    /// The refcount upgrade happens under the shared lock. A resource
    /// whose count already reached zero fails the upgrade and misses, even
    /// though its destructor has not evicted the path yet.
    pub fn get(&self, path: &str) -> Option<Ref<dyn Resource>> {
        let entries = self.entries.read().expect("resource cache poisoned");
        let entry = entries.get(path)?;
        let core = unsafe { entry.obj.as_ref() }.ref_core();
        if core.reference() {
            // SAFETY: fresh strong reference taken under the shared lock;
            // eviction needs the exclusive lock, so the object is alive.
            Some(unsafe { Ref::from_raw(entry.obj) })
        } else {
            None
        }
    }

    /// Look up `path` without touching the refcount.
    ///
    /// # Safety
    /// The caller must guarantee the resource stays alive for the whole
    /// use of the returned pointer; intended for re-entrant traversal
    /// during teardown, where the caller already controls all lifetimes.
    pub unsafe fn get_unguarded(&self, path: &str) -> Option<NonNull<dyn Resource>> {
        self.entries
            .read()
            .expect("resource cache poisoned")
            .get(path)
            .map(|entry| entry.obj)
    }

    /// Register `res` at `path`, moving it from its previous path if any.
    ///
    /// With `take_over` false the call fails when `path` is already
    /// occupied by another live resource; with `take_over` true the
    /// occupant is atomically un-pathed and replaced.
    pub fn set_path(&self, res: &Ref<dyn Resource>, path: &str, take_over: bool) -> bool {
        let data = res.resource_data();
        let old_path = data.path();
        if old_path == path {
            return true;
        }

        let mut entries = self.entries.write().expect("resource cache poisoned");
        if !old_path.is_empty()
            && let Some(existing) = entries.get(&old_path)
            && std::ptr::eq(existing.data, data as *const ResourceData)
        {
            entries.remove(&old_path);
        }
        if !path.is_empty() {
            if let Some(existing) = entries.get(path) {
                if !take_over {
                    warn!(target: "object.resource", path, "path already cached, not taking over");
                    return false;
                }
                // Re-home: the previous occupant loses its path but stays
                // alive for whoever still holds it.
                unsafe { &*existing.data }.store_path("");
                trace!(target: "object.resource", path, "path_taken_over");
            }
            entries.insert(
                path.to_owned(),
                CacheEntry {
                    obj: res.as_nonnull(),
                    data: data as *const ResourceData,
                    type_tag: res.resource_type(),
                },
            );
        }
        data.store_path(path);
        true
    }

    /// Atomically re-home `path` to `res`, displacing any occupant.
    pub fn take_over(&self, res: &Ref<dyn Resource>, path: &str) -> bool {
        self.set_path(res, path, true)
    }

    /// Number of cached resources.
    pub fn cached_count(&self) -> usize {
        self.entries.read().expect("resource cache poisoned").len()
    }

    /// Per-type cache population, for diagnostics.
    pub fn dump(&self) -> Vec<(String, usize)> {
        let entries = self.entries.read().expect("resource cache poisoned");
        let mut counts: HashMap<&'static str, usize> = HashMap::new();
        for entry in entries.values() {
            *counts.entry(entry.type_tag).or_insert(0) += 1;
        }
        let mut out: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(tag, n)| (tag.to_owned(), n))
            .collect();
        out.sort();
        out
    }

    fn untrack(&self, path: &str, data: *const ResourceData) {
        let mut entries = self.entries.write().expect("resource cache poisoned");
        if let Some(entry) = entries.get(path)
            && std::ptr::eq(entry.data, data)
        {
            entries.remove(path);
            trace!(target: "object.resource", path, "path_evicted");
        }
    }
}

/// Erase a concrete resource handle to `Ref<dyn Resource>`.
pub fn upcast_resource<T: Resource>(res: Ref<T>) -> Ref<dyn Resource> {
    let ptr: NonNull<dyn Resource> = res.into_raw_ptr();
    // SAFETY: ownership of the strong reference transfers to the new
    // handle; only the pointer type changes.
    unsafe { Ref::from_raw(ptr) }
}
