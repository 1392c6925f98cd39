//! Intrusive reference counting: [`RefCore`], [`Ref`], [`WeakRef`] and
//! [`RefPtr`].
//!
//! Objects embed a [`RefCore`] and implement [`RefCounted`]; ownership is
//! expressed through [`Ref`], which increments on clone and decrements on
//! drop. The transition `strong: 1 → 0` is the sole destruction trigger,
//! subject to a veto from script-language bindings.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::ptr::NonNull;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::counter::{AtomicCounter, OnceFlag};
use crate::registry::{ObjectId, ObjectRegistry};

/// Number of per-language binding slots carried by every [`RefCore`].
pub const MAX_SCRIPT_BINDINGS: usize = 8;

/// Per-language hooks notified on refcount transitions.
///
/// A binding may veto destruction to keep the object alive across a
/// language boundary: when the strong count reaches zero, the object is
/// destroyed only if every installed binding votes `true`.
pub trait ScriptBinding: Send + Sync {
    /// The strong count was raised while in the transition zone (≤ 2).
    fn refcount_incremented(&self);
    /// The strong count dropped into the transition zone (≤ 1).
    /// Return `false` to veto destruction.
    fn refcount_decremented(&self) -> bool;
}

type BindingSlots = [Option<std::sync::Arc<dyn ScriptBinding>>; MAX_SCRIPT_BINDINGS];

/// Intrusive refcount base embedded in every reference-counted entity.
pub struct RefCore {
    strong: AtomicCounter,
    init_once: OnceFlag,
    id: AtomicU64,
    bindings: RwLock<BindingSlots>,
}

impl RefCore {
    /// Create an uninitialized core. [`make_ref_counted`] arms it.
    pub fn new() -> Self {
        Self {
            strong: AtomicCounter::new(),
            init_once: OnceFlag::new(),
            id: AtomicU64::new(0),
            bindings: RwLock::new(Default::default()),
        }
    }

    /// Arm the core: strong count 1, identity assigned.
    fn init(&self, id: ObjectId) {
        self.strong.init();
        self.id.store(id.to_raw(), Ordering::Release);
    }

    /// The stable identity of the owning object.
    pub fn object_id(&self) -> ObjectId {
        ObjectId::from_raw(self.id.load(Ordering::Acquire))
    }

    /// Raise the strong count. Returns `false` iff the object is already
    /// dead, in which case the call must not be retried.
    pub fn reference(&self) -> bool {
        let rc_val = self.strong.refval();
        if rc_val == 0 {
            return false;
        }
        if rc_val <= 2 {
            // Transition zone: the object is becoming externally shared.
            let bindings = self.bindings.read().expect("binding slots poisoned");
            for binding in bindings.iter().flatten() {
                binding.refcount_incremented();
            }
        }
        true
    }

    /// Drop the strong count. Returns `true` iff the count reached zero
    /// and every binding voted for destruction.
    pub fn unreference(&self) -> bool {
        let rc_val = self.strong.unrefval();
        let mut die = rc_val == 0;
        if rc_val <= 1 {
            let bindings = self.bindings.read().expect("binding slots poisoned");
            for binding in bindings.iter().flatten() {
                let vote = binding.refcount_decremented();
                die = die && vote;
            }
        }
        die
    }

    /// First-reference entry point for freshly constructed objects.
    ///
    /// Invariant: the factory returns count = 1, so the first external
    /// reference consumes `init_once` and compensates with one decrement;
    /// construction is never double-counted.
    pub fn init_ref(&self) -> bool {
        if !self.reference() {
            return false;
        }
        if self.init_once.take() {
            let died = self.unreference();
            debug_assert!(!died, "init_ref compensation destroyed the object");
        }
        true
    }

    /// Re-raise a vetoed object's strong count from 0 to 1.
    ///
    /// After a binding vetoes destruction the object survives with
    /// `strong == 0`; the binding re-acquires it through this call, taking
    /// over the new count as its own stake. Returns `false` if the count
    /// was still live.
    pub fn revive(&self) -> bool {
        self.strong.revive()
    }

    /// Whether the object has ever been externally referenced.
    ///
    /// The sentinel is the one-shot `init_once` flag, consumed by the
    /// first reference; this preserves the "never referenced" vs
    /// "currently unreferenced" distinction without a magic count value.
    pub fn is_referenced(&self) -> bool {
        !self.init_once.is_armed()
    }

    /// Current strong count.
    pub fn reference_count(&self) -> u32 {
        self.strong.get()
    }

    /// Install a script binding in `slot`. Returns `false` if the slot
    /// index is out of range.
    pub fn set_script_binding(
        &self,
        slot: usize,
        binding: std::sync::Arc<dyn ScriptBinding>,
    ) -> bool {
        if slot >= MAX_SCRIPT_BINDINGS {
            return false;
        }
        self.bindings.write().expect("binding slots poisoned")[slot] = Some(binding);
        true
    }

    /// Remove the script binding in `slot`, if any.
    pub fn clear_script_binding(&self, slot: usize) {
        if let Some(entry) = self
            .bindings
            .write()
            .expect("binding slots poisoned")
            .get_mut(slot)
        {
            *entry = None;
        }
    }
}

impl Default for RefCore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RefCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefCore")
            .field("strong", &self.strong.get())
            .field("id", &self.object_id())
            .field("referenced", &self.is_referenced())
            .finish()
    }
}

/// Implemented by every reference-counted entity.
///
/// `Any` is a supertrait so type-erased handles can be downcast back to
/// their concrete type.
pub trait RefCounted: Any + Send + Sync {
    /// The embedded refcount core.
    fn ref_core(&self) -> &RefCore;
}

/// Owning handle over a reference-counted object.
///
/// Cloning increments the strong count; dropping decrements it and frees
/// the object on the final release. Equality and hashing use pointer
/// identity.
pub struct Ref<T: ?Sized + RefCounted> {
    ptr: NonNull<T>,
}

// `RefCounted` requires Send + Sync, and the count itself is atomic.
unsafe impl<T: ?Sized + RefCounted> Send for Ref<T> {}
unsafe impl<T: ?Sized + RefCounted> Sync for Ref<T> {}

impl<T: ?Sized + RefCounted> Ref<T> {
    /// Adopt a pointer whose strong count has already been raised for us.
    ///
    /// # Safety
    /// `ptr` must point at a live registered object and the caller must
    /// own exactly one strong reference that this handle takes over.
    pub(crate) unsafe fn from_raw(ptr: NonNull<T>) -> Self {
        Self { ptr }
    }

    /// Release ownership of the strong reference and hand the pointer out.
    pub(crate) fn into_raw_ptr(self) -> NonNull<T> {
        let ptr = self.ptr;
        std::mem::forget(self);
        ptr
    }

    /// The underlying pointer, without affecting the count.
    pub(crate) fn as_nonnull(&self) -> NonNull<T> {
        self.ptr
    }

    /// Borrow the object.
    pub fn get(&self) -> &T {
        // SAFETY: the strong reference held by this handle keeps the
        // object alive.
        unsafe { self.ptr.as_ref() }
    }

    /// The object's registry identity.
    pub fn object_id(&self) -> ObjectId {
        self.get().ref_core().object_id()
    }

    /// Current strong count, for diagnostics.
    pub fn reference_count(&self) -> u32 {
        self.get().ref_core().reference_count()
    }

    /// Whether two handles point at the same object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(self.ptr.as_ptr(), other.ptr.as_ptr())
    }
}

impl<T: RefCounted> Ref<T> {
    /// Erase the concrete type.
    pub fn upcast(self) -> Ref<dyn RefCounted> {
        let ptr: NonNull<dyn RefCounted> = self.ptr;
        std::mem::forget(self);
        Ref { ptr }
    }
}

impl Ref<dyn RefCounted> {
    /// Recover the concrete type, or give the handle back on mismatch.
    pub fn downcast<T: RefCounted>(self) -> Result<Ref<T>, Ref<dyn RefCounted>> {
        let any: &dyn Any = self.get();
        if any.is::<T>() {
            let ptr = self.ptr.cast::<T>();
            std::mem::forget(self);
            // SAFETY: type checked above; the data pointer is unchanged.
            Ok(unsafe { Ref::from_raw(ptr) })
        } else {
            Err(self)
        }
    }
}

impl<T: ?Sized + RefCounted> Deref for Ref<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T: ?Sized + RefCounted> Clone for Ref<T> {
    fn clone(&self) -> Self {
        let ok = self.get().ref_core().reference();
        debug_assert!(ok, "cloned a Ref to a dead object");
        Self { ptr: self.ptr }
    }
}

impl<T: ?Sized + RefCounted> Drop for Ref<T> {
    fn drop(&mut self) {
        let core = self.get().ref_core();
        if core.unreference() {
            let id = core.object_id();
            ObjectRegistry::global().unregister(id);
            trace!(target: "object.refcore", id = id.to_raw(), "object_destroyed");
            // SAFETY: the count hit zero with no veto, and the registry
            // entry is gone, so no resolver can reach the object anymore.
            // This handle owned the final strong reference.
            unsafe { drop(Box::from_raw(self.ptr.as_ptr())) };
        }
        // On a veto the object survives with strong == 0; the binding side
        // is responsible for re-raising the count through `reference()`.
    }
}

impl<T: ?Sized + RefCounted> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: ?Sized + RefCounted> Eq for Ref<T> {}

impl<T: ?Sized + RefCounted> Hash for Ref<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.ptr.as_ptr() as *const () as usize).hash(state);
    }
}

impl<T: ?Sized + RefCounted> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("id", &self.object_id())
            .field("strong", &self.reference_count())
            .finish()
    }
}

/// Construct a reference-counted object.
///
/// The returned handle owns the initial strong count of 1; a subsequent
/// [`RefCore::init_ref`] on the same object compensates instead of
/// double-counting.
pub fn make_ref_counted<T: RefCounted>(value: T) -> Ref<T> {
    let ptr = NonNull::from(Box::leak(Box::new(value)));
    let erased: NonNull<dyn RefCounted> = ptr;
    let id = ObjectRegistry::global().register(erased);
    // SAFETY: freshly leaked, registered, not yet shared.
    unsafe { ptr.as_ref() }.ref_core().init(id);
    // SAFETY: we own the initial strong reference installed by `init`.
    unsafe { Ref::from_raw(ptr) }
}

/// Non-owning reference: an [`ObjectId`] stored in lieu of a handle.
///
/// Never pins lifetime; resolution goes through the [`ObjectRegistry`] and
/// fails once the object is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WeakRef {
    id: ObjectId,
}

impl WeakRef {
    /// A weak reference that never resolves.
    pub fn null() -> Self {
        Self { id: ObjectId::NULL }
    }

    /// Take a weak reference to an owned object.
    pub fn new<T: ?Sized + RefCounted>(target: &Ref<T>) -> Self {
        Self {
            id: target.object_id(),
        }
    }

    /// Build from a stored id.
    pub fn from_id(id: ObjectId) -> Self {
        Self { id }
    }

    /// The id this weak reference carries.
    pub fn object_id(&self) -> ObjectId {
        self.id
    }

    /// Resolve to an owning handle, or `None` if the object is gone.
    pub fn resolve(&self) -> Option<Ref<dyn RefCounted>> {
        ObjectRegistry::global().resolve(self.id)
    }

    /// Resolve and downcast in one step.
    pub fn resolve_as<T: RefCounted>(&self) -> Option<Ref<T>> {
        self.resolve().and_then(|obj| obj.downcast::<T>().ok())
    }

    /// Resolve with a preparation step run on the core first.
    ///
    /// See [`ObjectRegistry::resolve_with`]; used by script bindings to
    /// revive objects whose destruction they vetoed.
    pub fn resolve_with(
        &self,
        prepare: impl FnOnce(&RefCore) -> bool,
    ) -> Option<Ref<dyn RefCounted>> {
        ObjectRegistry::global().resolve_with(self.id, prepare)
    }
}

/// Type-erased owning handle stored inline.
///
/// A sum type over empty and owned states; no raw pointer reinterpretation
/// is involved.
#[derive(Debug, Default)]
pub enum RefPtr {
    /// Holds nothing.
    #[default]
    Empty,
    /// Holds one strong reference.
    Owned(Ref<dyn RefCounted>),
}

impl RefPtr {
    /// Whether the handle is empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, RefPtr::Empty)
    }

    /// Borrow the held object, if any.
    pub fn as_ref(&self) -> Option<&Ref<dyn RefCounted>> {
        match self {
            RefPtr::Empty => None,
            RefPtr::Owned(r) => Some(r),
        }
    }

    /// Take the held reference out, leaving the handle empty.
    pub fn take(&mut self) -> Option<Ref<dyn RefCounted>> {
        match std::mem::take(self) {
            RefPtr::Empty => None,
            RefPtr::Owned(r) => Some(r),
        }
    }
}

impl<T: RefCounted> From<Ref<T>> for RefPtr {
    fn from(value: Ref<T>) -> Self {
        RefPtr::Owned(value.upcast())
    }
}

impl Clone for RefPtr {
    fn clone(&self) -> Self {
        match self {
            RefPtr::Empty => RefPtr::Empty,
            RefPtr::Owned(r) => RefPtr::Owned(r.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    struct Probe {
        core: RefCore,
        drops: Arc<AtomicUsize>,
    }

    impl RefCounted for Probe {
        fn ref_core(&self) -> &RefCore {
            &self.core
        }
    }

    impl Drop for Probe {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn probe(drops: &Arc<AtomicUsize>) -> Ref<Probe> {
        make_ref_counted(Probe {
            core: RefCore::new(),
            drops: Arc::clone(drops),
        })
    }

    #[test]
    fn destructor_fires_exactly_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let a = probe(&drops);
        let b = a.clone();
        let c = b.clone();
        assert_eq!(a.reference_count(), 3);
        drop(b);
        drop(a);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drop(c);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn init_ref_does_not_double_count() {
        let drops = Arc::new(AtomicUsize::new(0));
        let a = probe(&drops);
        assert_eq!(a.reference_count(), 1);
        assert!(!a.ref_core().is_referenced());
        // First external reference: consumes init_once, compensates.
        assert!(a.ref_core().init_ref());
        assert_eq!(a.reference_count(), 1);
        assert!(a.ref_core().is_referenced());
        // Later references behave normally.
        assert!(a.ref_core().reference());
        assert_eq!(a.reference_count(), 2);
        assert!(!a.ref_core().unreference());
        drop(a);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn upcast_and_downcast_round_trip() {
        let drops = Arc::new(AtomicUsize::new(0));
        let a = probe(&drops);
        let id = a.object_id();
        let erased = a.upcast();
        assert_eq!(erased.object_id(), id);
        let back = erased.downcast::<Probe>().expect("same concrete type");
        assert_eq!(back.object_id(), id);
        drop(back);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn weak_never_pins_lifetime() {
        let drops = Arc::new(AtomicUsize::new(0));
        let a = probe(&drops);
        let weak = WeakRef::new(&a);
        assert!(weak.resolve().is_some());
        drop(a);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert!(weak.resolve().is_none());
        assert!(weak.resolve_as::<Probe>().is_none());
    }

    #[test]
    fn ref_ptr_is_a_sum_type() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut slot = RefPtr::default();
        assert!(slot.is_empty());
        slot = RefPtr::from(probe(&drops));
        assert!(!slot.is_empty());
        let held = slot.take().expect("owned");
        assert!(slot.is_empty());
        drop(held);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    struct Veto {
        allow: AtomicBool,
        decrements: AtomicUsize,
    }

    impl ScriptBinding for Veto {
        fn refcount_incremented(&self) {}
        fn refcount_decremented(&self) -> bool {
            self.decrements.fetch_add(1, Ordering::SeqCst);
            self.allow.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn binding_veto_keeps_object_alive() {
        let drops = Arc::new(AtomicUsize::new(0));
        let a = probe(&drops);
        let veto = Arc::new(Veto {
            allow: AtomicBool::new(false),
            decrements: AtomicUsize::new(0),
        });
        assert!(a.ref_core().set_script_binding(0, veto.clone()));
        let weak = WeakRef::new(&a);
        let id = weak.object_id();
        drop(a);
        // Vetoed: the object survives with strong == 0 and stays
        // registered, but resolution fails while the count is down.
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        assert!(veto.decrements.load(Ordering::SeqCst) >= 1);
        assert!(ObjectRegistry::global().is_registered(id));
        assert!(weak.resolve().is_none());
        // The binding re-raises the count; resolution works again.
        let revived = weak
            .resolve_with(|core| core.revive())
            .expect("revived by binding");
        assert_eq!(revived.reference_count(), 2);
        // Binding releases its stake and stops vetoing.
        veto.allow.store(true, Ordering::SeqCst);
        assert!(!revived.ref_core().unreference());
        drop(revived);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}
