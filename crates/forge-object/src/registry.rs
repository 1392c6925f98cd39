//! Process-wide object registry with generation-tagged handles.
//!
//! Every ref-counted object is registered here at construction and evicted
//! when it is destroyed. An [`ObjectId`] survives the object it names: a
//! stale id simply fails to resolve because the slot generation has moved
//! on.

use std::ptr::NonNull;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use tracing::trace;

use crate::refcore::{Ref, RefCounted};

/// Opaque 64-bit object handle. Zero is the null id.
///
/// Packs a slot index in the low 32 bits and a generation in the high 32
/// bits. Generations start at 1, so a zeroed id can never alias a live
/// slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId(u64);

impl ObjectId {
    /// The null id.
    pub const NULL: ObjectId = ObjectId(0);

    /// Whether this is the null id.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Raw 64-bit value, for storage in script bindings or serialization.
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Rebuild an id from its raw value. Resolving an id that never came
    /// from [`ObjectId::to_raw`] is harmless; it just misses.
    pub fn from_raw(raw: u64) -> Self {
        ObjectId(raw)
    }

    fn pack(generation: u32, index: u32) -> Self {
        ObjectId(((generation as u64) << 32) | index as u64)
    }

    fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    fn index(self) -> usize {
        (self.0 & 0xffff_ffff) as usize
    }
}

/// Type-erased pointer to a live ref-counted object.
///
/// Stored in registry slots only between `register` and `unregister`, which
/// brackets the object's lifetime; dereferencing is sound while the
/// registry lock is held (see [`ObjectRegistry::resolve`]).
#[derive(Clone, Copy)]
pub(crate) struct ErasedPtr(pub(crate) NonNull<dyn RefCounted>);

// The registry only hands the pointer out as an owning `Ref` after a
// successful refcount upgrade; `RefCounted` already requires Send + Sync.
unsafe impl Send for ErasedPtr {}
unsafe impl Sync for ErasedPtr {}

struct Slot {
    generation: u32,
    ptr: Option<ErasedPtr>,
}

struct RegistryInner {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

/// Slotted table mapping [`ObjectId`] to live object pointers.
///
/// Readers resolve under the shared lock; registration and eviction take
/// the exclusive lock. A freed slot increments its generation so stale ids
/// miss instead of aliasing a newer object.
pub struct ObjectRegistry {
    inner: RwLock<RegistryInner>,
}

static GLOBAL_REGISTRY: Lazy<ObjectRegistry> = Lazy::new(ObjectRegistry::new);

impl ObjectRegistry {
    fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                slots: Vec::new(),
                free: Vec::new(),
                live: 0,
            }),
        }
    }

    /// The process-wide registry instance.
    pub fn global() -> &'static ObjectRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register a live object and return its id.
    pub(crate) fn register(&self, ptr: NonNull<dyn RefCounted>) -> ObjectId {
        let mut inner = self.inner.write().expect("object registry poisoned");
        inner.live += 1;
        if let Some(index) = inner.free.pop() {
            let slot = &mut inner.slots[index as usize];
            debug_assert!(slot.ptr.is_none());
            slot.ptr = Some(ErasedPtr(ptr));
            return ObjectId::pack(slot.generation, index);
        }
        let index = inner.slots.len() as u32;
        inner.slots.push(Slot {
            generation: 1,
            ptr: Some(ErasedPtr(ptr)),
        });
        ObjectId::pack(1, index)
    }

    /// Evict an object. The slot generation is bumped so the id goes stale.
    pub(crate) fn unregister(&self, id: ObjectId) {
        if id.is_null() {
            return;
        }
        let mut inner = self.inner.write().expect("object registry poisoned");
        let index = id.index();
        let Some(slot) = inner.slots.get_mut(index) else {
            return;
        };
        if slot.generation != id.generation() || slot.ptr.is_none() {
            return;
        }
        slot.ptr = None;
        // Generation 0 is reserved for the null id.
        slot.generation = slot.generation.wrapping_add(1).max(1);
        inner.free.push(index as u32);
        inner.live -= 1;
        trace!(target: "object.registry", id = id.to_raw(), "slot_evicted");
    }

    /// Resolve an id to an owning handle, or `None` if the object is gone.
    ///
    /// The refcount upgrade happens while the shared lock is held: eviction
    /// needs the exclusive lock, so the pointed-to object cannot be freed
    /// under us. An object whose count already hit zero fails the upgrade
    /// and resolves to `None` even though eviction has not run yet.
    pub fn resolve(&self, id: ObjectId) -> Option<Ref<dyn RefCounted>> {
        if id.is_null() {
            return None;
        }
        let inner = self.inner.read().expect("object registry poisoned");
        let slot = inner.slots.get(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        let ptr = slot.ptr?;
        let core = unsafe { ptr.0.as_ref() }.ref_core();
        if core.reference() {
            // SAFETY: we hold a fresh strong reference on a live object.
            Some(unsafe { Ref::from_raw(ptr.0) })
        } else {
            None
        }
    }

    /// Resolve with a preparation step run on the core under the shared
    /// lock, before the refcount upgrade is attempted.
    ///
    /// This is the re-acquisition path for script bindings: a binding that
    /// vetoed destruction calls `revive` in `prepare` to re-raise the
    /// strong count, then receives an owning handle like any resolver.
    pub fn resolve_with(
        &self,
        id: ObjectId,
        prepare: impl FnOnce(&crate::refcore::RefCore) -> bool,
    ) -> Option<Ref<dyn RefCounted>> {
        if id.is_null() {
            return None;
        }
        let inner = self.inner.read().expect("object registry poisoned");
        let slot = inner.slots.get(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        let ptr = slot.ptr?;
        let core = unsafe { ptr.0.as_ref() }.ref_core();
        if !prepare(core) {
            return None;
        }
        if core.reference() {
            // SAFETY: fresh strong reference on a live object.
            Some(unsafe { Ref::from_raw(ptr.0) })
        } else {
            None
        }
    }

    /// Whether the id currently names a registered object.
    pub fn is_registered(&self, id: ObjectId) -> bool {
        if id.is_null() {
            return false;
        }
        let inner = self.inner.read().expect("object registry poisoned");
        inner
            .slots
            .get(id.index())
            .is_some_and(|slot| slot.generation == id.generation() && slot.ptr.is_some())
    }

    /// Number of live registered objects.
    pub fn live_count(&self) -> usize {
        self.inner.read().expect("object registry poisoned").live
    }

    /// Generation currently stored in the slot an id points at, for
    /// diagnostics and tests. `None` if the slot index was never used.
    pub fn slot_generation(&self, id: ObjectId) -> Option<u32> {
        let inner = self.inner.read().expect("object registry poisoned");
        inner.slots.get(id.index()).map(|slot| slot.generation)
    }
}
