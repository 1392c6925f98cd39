//! Lock-free reference counter primitives.
//!
//! [`AtomicCounter`] implements the conditional-increment discipline the
//! object core is built on: once the count reaches zero the object is dead
//! and the count can never be raised again through [`AtomicCounter::refer`].

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// A reference counter with conditional increment.
///
/// The counter distinguishes a *dead* state (value 0) from every live state.
/// `refer`/`refval` refuse to resurrect a dead counter, which lets a reader
/// that found a stale pointer detect that the object is already on its way
/// out.
#[derive(Debug)]
pub struct AtomicCounter {
    count: AtomicU32,
}

impl AtomicCounter {
    /// Create a counter in the dead state (value 0).
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Initialize the counter to 1, marking the object live.
    pub fn init(&self) {
        self.count.store(1, Ordering::Release);
    }

    /// Conditionally increment. Returns `false` iff the counter was 0.
    pub fn refer(&self) -> bool {
        self.refval() != 0
    }

    /// Conditionally increment and return the new value, or 0 if the
    /// counter was already dead.
    pub fn refval(&self) -> u32 {
        let mut current = self.count.load(Ordering::Relaxed);
        loop {
            if current == 0 {
                return 0;
            }
            match self.count.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return current + 1,
                Err(observed) => current = observed,
            }
        }
    }

    /// Decrement. Returns `true` iff the counter reached 0.
    ///
    /// Must be balanced against a successful `init`/`refer`; decrementing a
    /// dead counter is a logic error and debug-asserts.
    pub fn unrefer(&self) -> bool {
        let prev = self.count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev != 0, "unrefer on a dead counter");
        prev == 1
    }

    /// Decrement and return the new value.
    pub fn unrefval(&self) -> u32 {
        let prev = self.count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev != 0, "unrefval on a dead counter");
        prev - 1
    }

    /// Raise a dead counter back to 1. Returns `false` if the counter was
    /// still live. Only meaningful on objects whose destruction was vetoed.
    pub fn revive(&self) -> bool {
        self.count
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    /// Current value.
    pub fn get(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// A one-shot sentinel, armed at construction and consumed at most once.
///
/// Used to distinguish "never referenced" from "was referenced and then
/// dropped": the first successful reference consumes the flag.
#[derive(Debug)]
pub struct OnceFlag {
    armed: AtomicBool,
}

impl OnceFlag {
    /// Create an armed flag.
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(true),
        }
    }

    /// Consume the flag. Returns `true` only for the first caller.
    pub fn take(&self) -> bool {
        self.armed.swap(false, Ordering::AcqRel)
    }

    /// Whether the flag is still armed (has never been taken).
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }
}

impl Default for OnceFlag {
    fn default() -> Self {
        Self::new()
    }
}
