//! Mutual exclusion primitives.
//!
//! Four wrappers over the backend's native raw locks, mirroring the split
//! between plain, recursive, and timed acquisition. The wrappers own no
//! guarded data: like the driver classes that embed them, callers pair
//! `lock`/`unlock` explicitly or use the scope guards in
//! [`lockable`](crate::lockable).
//!
//! Recursive variants tolerate repeated `lock` calls from the owning
//! context and require a matching number of `unlock` calls; that
//! bookkeeping lives entirely in [`lock_api::RawReentrantMutex`].
//!
//! None of these types can be copied or cloned; lock ownership is not
//! shareable. Calling `unlock` without holding the lock violates the native
//! primitive's contract; it is not re-validated here.

use core::time::Duration;

use lock_api::{RawMutex as _, RawMutexTimed as _};

use crate::backend;
use crate::time::{self, Instant};

/// Blocking acquisition shared by every mutex variant.
pub trait BlockingLock {
    /// Blocks the calling context until ownership is acquired.
    fn lock(&self);
    /// Attempts acquisition without blocking.
    fn try_lock(&self) -> bool;
    /// Releases ownership. The caller must hold the lock.
    fn unlock(&self);
}

/// Bounded-blocking acquisition for the timed variants.
pub trait TimedLock: BlockingLock {
    /// Attempts acquisition, waiting at most `timeout`.
    fn try_lock_for(&self, timeout: Duration) -> bool;
    /// Attempts acquisition until the absolute tick `deadline`.
    fn try_lock_until(&self, deadline: Instant) -> bool;
}

fn remaining_until(deadline: Instant) -> Duration {
    Duration::from_millis(deadline.as_millis().saturating_sub(time::millis()))
}

pub struct Mutex {
    raw: backend::NativeMutex,
}

impl Mutex {
    pub const fn new() -> Self {
        Self {
            raw: backend::native_mutex(),
        }
    }

    pub fn lock(&self) {
        self.raw.lock();
    }

    pub fn try_lock(&self) -> bool {
        self.raw.try_lock()
    }

    pub fn unlock(&self) {
        // SAFETY: caller holds the lock; an unlock without ownership is the
        // caller's contract violation, delegated to the native primitive.
        unsafe { self.raw.unlock() }
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockingLock for Mutex {
    fn lock(&self) {
        Mutex::lock(self);
    }

    fn try_lock(&self) -> bool {
        Mutex::try_lock(self)
    }

    fn unlock(&self) {
        Mutex::unlock(self);
    }
}

/// Same-context re-entrant mutex.
pub struct RecursiveMutex {
    raw: backend::NativeRecursiveMutex,
}

impl RecursiveMutex {
    pub const fn new() -> Self {
        Self {
            raw: backend::native_recursive_mutex(),
        }
    }

    pub fn lock(&self) {
        self.raw.lock();
    }

    pub fn try_lock(&self) -> bool {
        self.raw.try_lock()
    }

    pub fn unlock(&self) {
        // SAFETY: caller holds the lock (see `Mutex::unlock`).
        unsafe { self.raw.unlock() }
    }
}

impl Default for RecursiveMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockingLock for RecursiveMutex {
    fn lock(&self) {
        RecursiveMutex::lock(self);
    }

    fn try_lock(&self) -> bool {
        RecursiveMutex::try_lock(self)
    }

    fn unlock(&self) {
        RecursiveMutex::unlock(self);
    }
}

/// Mutex with bounded-blocking acquisition.
pub struct TimedMutex {
    raw: backend::NativeTimedMutex,
}

impl TimedMutex {
    pub const fn new() -> Self {
        Self {
            raw: backend::native_timed_mutex(),
        }
    }

    pub fn lock(&self) {
        self.raw.lock();
    }

    pub fn try_lock(&self) -> bool {
        self.raw.try_lock()
    }

    pub fn try_lock_for(&self, timeout: Duration) -> bool {
        self.raw.try_lock_for(timeout)
    }

    pub fn try_lock_until(&self, deadline: Instant) -> bool {
        self.raw.try_lock_for(remaining_until(deadline))
    }

    pub fn unlock(&self) {
        // SAFETY: caller holds the lock (see `Mutex::unlock`).
        unsafe { self.raw.unlock() }
    }
}

impl Default for TimedMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockingLock for TimedMutex {
    fn lock(&self) {
        TimedMutex::lock(self);
    }

    fn try_lock(&self) -> bool {
        TimedMutex::try_lock(self)
    }

    fn unlock(&self) {
        TimedMutex::unlock(self);
    }
}

impl TimedLock for TimedMutex {
    fn try_lock_for(&self, timeout: Duration) -> bool {
        TimedMutex::try_lock_for(self, timeout)
    }

    fn try_lock_until(&self, deadline: Instant) -> bool {
        TimedMutex::try_lock_until(self, deadline)
    }
}

/// Re-entrant mutex with bounded-blocking acquisition.
///
/// This is the variant every [`Lockable`](crate::lockable::Lockable) driver
/// embeds: re-entrancy lets a driver's public methods call each other while
/// locked, and the timed interface backs `try_lock_for` on the composition
/// surface.
pub struct RecursiveTimedMutex {
    raw: backend::NativeRecursiveTimedMutex,
}

impl RecursiveTimedMutex {
    pub const fn new() -> Self {
        Self {
            raw: backend::native_recursive_timed_mutex(),
        }
    }

    pub fn lock(&self) {
        self.raw.lock();
    }

    pub fn try_lock(&self) -> bool {
        self.raw.try_lock()
    }

    pub fn try_lock_for(&self, timeout: Duration) -> bool {
        self.raw.try_lock_for(timeout)
    }

    pub fn try_lock_until(&self, deadline: Instant) -> bool {
        self.raw.try_lock_for(remaining_until(deadline))
    }

    pub fn unlock(&self) {
        // SAFETY: caller holds the lock (see `Mutex::unlock`).
        unsafe { self.raw.unlock() }
    }
}

impl Default for RecursiveTimedMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockingLock for RecursiveTimedMutex {
    fn lock(&self) {
        RecursiveTimedMutex::lock(self);
    }

    fn try_lock(&self) -> bool {
        RecursiveTimedMutex::try_lock(self)
    }

    fn unlock(&self) {
        RecursiveTimedMutex::unlock(self);
    }
}

impl TimedLock for RecursiveTimedMutex {
    fn try_lock_for(&self, timeout: Duration) -> bool {
        RecursiveTimedMutex::try_lock_for(self, timeout)
    }

    fn try_lock_until(&self, deadline: Instant) -> bool {
        RecursiveTimedMutex::try_lock_until(self, deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutex_try_lock_reports_contention() {
        let mutex = Mutex::new();
        assert!(mutex.try_lock());
        // Plain mutexes are not re-entrant even from the owning thread.
        mutex.unlock();
        assert!(mutex.try_lock());
        mutex.unlock();
    }

    #[test]
    fn recursive_mutex_reenters_same_thread() {
        let mutex = RecursiveMutex::new();
        mutex.lock();
        assert!(mutex.try_lock());
        mutex.lock();
        mutex.unlock();
        mutex.unlock();
        mutex.unlock();
        // Fully released again.
        assert!(mutex.try_lock());
        mutex.unlock();
    }

    #[test]
    fn timed_mutex_acquires_within_timeout_when_free() {
        let mutex = TimedMutex::new();
        assert!(mutex.try_lock_for(Duration::from_millis(10)));
        mutex.unlock();
    }

    #[test]
    fn timed_mutex_until_past_deadline_behaves_like_try_lock() {
        let mutex = TimedMutex::new();
        mutex.lock();
        let stale = Instant::from_millis(0);
        assert!(!mutex.try_lock_until(stale));
        mutex.unlock();
    }

    #[test]
    fn recursive_timed_mutex_times_out_against_itself_only_never() {
        // Re-entry must succeed immediately, not consume the timeout.
        let mutex = RecursiveTimedMutex::new();
        mutex.lock();
        let begin = time::millis();
        assert!(mutex.try_lock_for(Duration::from_millis(500)));
        assert!(time::millis() - begin < 400);
        mutex.unlock();
        mutex.unlock();
    }
}
