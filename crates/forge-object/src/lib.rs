#![warn(missing_docs)]
//! Forge Object - Object & Resource Lifetime Core
//!
//! The ownership machinery underneath every engine entity:
//!
//! - **Intrusive refcounting**: objects embed a [`RefCore`] and are held
//!   through [`Ref`], which increments on clone and decrements on drop.
//!   The transition `strong: 1 → 0` is the sole destruction trigger,
//!   subject to script-binding votes.
//! - **Object registry**: every object gets a generation-tagged
//!   [`ObjectId`]; a [`WeakRef`] stores only the id and resolves through
//!   the [`ObjectRegistry`] without pinning lifetime.
//! - **Resource cache**: named resources register their path in the
//!   process-wide [`ResourceCache`]; at most one live resource per path,
//!   with atomic take-over semantics.
//!
//! The crate is thread-safe throughout: counters are atomic, and the
//! registry and cache use reader/writer locking with lookups under the
//! shared lock.
//!
//! # Quick start
//!
//! ```rust
//! use forge_object::{RefCore, RefCounted, WeakRef, make_ref_counted};
//!
//! struct Icon {
//!     core: RefCore,
//!     name: String,
//! }
//!
//! impl RefCounted for Icon {
//!     fn ref_core(&self) -> &RefCore {
//!         &self.core
//!     }
//! }
//!
//! let icon = make_ref_counted(Icon {
//!     core: RefCore::new(),
//!     name: "play".to_string(),
//! });
//! let weak = WeakRef::new(&icon);
//! assert_eq!(icon.name, "play");
//! assert!(weak.resolve().is_some());
//! drop(icon);
//! assert!(weak.resolve().is_none());
//! ```

pub mod counter;
pub mod refcore;
pub mod registry;
pub mod resource;

pub use counter::{AtomicCounter, OnceFlag};
pub use refcore::{
    MAX_SCRIPT_BINDINGS, Ref, RefCore, RefCounted, RefPtr, ScriptBinding, WeakRef,
    make_ref_counted,
};
pub use registry::{ObjectId, ObjectRegistry};
pub use resource::{Resource, ResourceCache, ResourceData, upcast_resource};
