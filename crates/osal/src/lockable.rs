//! Lock composition for driver types, plus scope guards.
//!
//! A driver gains a uniform locking surface by embedding one
//! [`RecursiveTimedMutex`] and pointing [`Lockable::class_mutex`] at it;
//! the remaining methods are provided. Used through generics this costs no
//! vtable pointer per instance, which is the reason drivers compose a
//! mutex instead of inheriting a virtual interface.

use core::time::Duration;

use crate::backend;
use crate::fault;
use crate::mutex::{BlockingLock, RecursiveTimedMutex, TimedLock};

/// Mutual-exclusion surface for driver types.
pub trait Lockable {
    /// The embedded class mutex. Each instance owns exactly one; it is
    /// never shared between instances.
    fn class_mutex(&self) -> &RecursiveTimedMutex;

    /// Blocks until this instance is exclusively reserved.
    fn lock(&self) {
        self.class_mutex().lock();
    }

    /// ISR-safe reservation. Interrupt context must never block, so this
    /// hard-faults on contention instead of waiting, and unconditionally
    /// on backends with no interrupt model.
    fn lock_from_isr(&self) {
        if !backend::HAS_INTERRUPTS {
            fault::hard_fault("lock_from_isr on a backend without interrupts");
        }
        if !self.class_mutex().try_lock() {
            fault::hard_fault("contended lock_from_isr in interrupt context");
        }
    }

    /// Bounded-blocking reservation.
    fn try_lock_for(&self, timeout: Duration) -> bool {
        self.class_mutex().try_lock_for(timeout)
    }

    /// Releases the reservation. The caller must hold it.
    fn unlock(&self) {
        self.class_mutex().unlock();
    }

    /// ISR-safe release.
    fn unlock_from_isr(&self) {
        if !backend::HAS_INTERRUPTS {
            fault::hard_fault("unlock_from_isr on a backend without interrupts");
        }
        self.class_mutex().unlock();
    }
}

/// Scope-bound lock ownership: acquires on construction, releases on drop.
///
/// Release happens on every exit path, including unwinding.
pub struct LockGuard<'a, M: BlockingLock> {
    lock: &'a M,
}

impl<'a, M: BlockingLock> LockGuard<'a, M> {
    pub fn new(lock: &'a M) -> Self {
        lock.lock();
        Self { lock }
    }
}

impl<M: BlockingLock> Drop for LockGuard<'_, M> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}

/// Scope guard with deferred, bounded acquisition.
///
/// Construction does not acquire; call [`try_lock_for`](Self::try_lock_for)
/// explicitly. Drop releases if and only if acquisition succeeded; a
/// failed attempt never produces an unlock.
pub struct TimedLockGuard<'a, M: TimedLock> {
    lock: &'a M,
    held: bool,
}

impl<'a, M: TimedLock> TimedLockGuard<'a, M> {
    pub fn new(lock: &'a M) -> Self {
        Self { lock, held: false }
    }

    pub fn try_lock_for(&mut self, timeout: Duration) -> bool {
        self.held = self.lock.try_lock_for(timeout);
        self.held
    }

    pub fn is_held(&self) -> bool {
        self.held
    }
}

impl<M: TimedLock> Drop for TimedLockGuard<'_, M> {
    fn drop(&mut self) {
        if self.held {
            self.lock.unlock();
        }
    }
}
