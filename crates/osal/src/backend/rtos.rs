//! RTOS backend: a bare-metal port layer.
//!
//! Mutual exclusion is a CAS spin lock wired into `lock_api`, so timed
//! acquisition runs against the port tick and recursion bookkeeping stays
//! delegated to `lock_api::RawReentrantMutex`. Semaphore and queue state is
//! guarded with `critical-section`, which makes the ISR-safe entry points
//! real operations rather than host-style faults. The port must provide a
//! `critical-section` implementation and drive [`crate::time::tick`] from
//! its tick interrupt.

use alloc::collections::VecDeque;
use core::cell::{Cell, RefCell};
use core::hint;
use core::num::NonZeroUsize;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use core::time::Duration;

use critical_section::Mutex as CsMutex;
use lock_api::{GetThreadId, RawMutex, RawMutexTimed, RawReentrantMutex};

use crate::error::Error;
use crate::thread::TaskFunc;
use crate::time;

pub const HAS_INTERRUPTS: bool = true;

/// Execution context id for code running outside any registered task
/// (startup, the idle loop).
pub const MAIN_CONTEXT_ID: usize = 1;

static CURRENT_CONTEXT: AtomicUsize = AtomicUsize::new(MAIN_CONTEXT_ID);

/// Port hook: record which task context is executing. The kernel calls this
/// on every context switch; recursive mutex ownership is tracked against it.
pub fn set_current_context(id: usize) {
    CURRENT_CONTEXT.store(id, Ordering::Relaxed);
}

/// The currently executing task context.
pub fn current_context() -> usize {
    CURRENT_CONTEXT.load(Ordering::Relaxed)
}

/// CAS spin lock. This is the native mutex of the port layer.
pub struct RawRtosMutex {
    locked: AtomicBool,
}

unsafe impl RawMutex for RawRtosMutex {
    const INIT: Self = Self {
        locked: AtomicBool::new(false),
    };

    type GuardMarker = lock_api::GuardSend;

    fn lock(&self) {
        while !self.try_lock() {
            hint::spin_loop();
        }
    }

    fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    unsafe fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }
}

unsafe impl RawMutexTimed for RawRtosMutex {
    type Duration = Duration;
    type Instant = u64;

    fn try_lock_for(&self, timeout: Duration) -> bool {
        let deadline = time::millis().saturating_add(timeout.as_millis() as u64);
        self.try_lock_until(deadline)
    }

    fn try_lock_until(&self, deadline: u64) -> bool {
        loop {
            if self.try_lock() {
                return true;
            }
            if time::millis() >= deadline {
                return false;
            }
            hint::spin_loop();
        }
    }
}

/// Resolves lock ownership to the running task context.
pub struct RtosThreadId(());

unsafe impl GetThreadId for RtosThreadId {
    const INIT: Self = Self(());

    fn nonzero_thread_id(&self) -> NonZeroUsize {
        NonZeroUsize::new(current_context()).unwrap_or(NonZeroUsize::MIN)
    }
}

pub type NativeMutex = RawRtosMutex;
pub type NativeTimedMutex = RawRtosMutex;
pub type NativeRecursiveMutex = RawReentrantMutex<RawRtosMutex, RtosThreadId>;
pub type NativeRecursiveTimedMutex = NativeRecursiveMutex;
pub type NativeTaskId = usize;

pub const fn native_mutex() -> NativeMutex {
    <RawRtosMutex as RawMutex>::INIT
}

pub const fn native_timed_mutex() -> NativeTimedMutex {
    native_mutex()
}

pub const fn native_recursive_mutex() -> NativeRecursiveMutex {
    NativeRecursiveMutex::INIT
}

pub const fn native_recursive_timed_mutex() -> NativeRecursiveTimedMutex {
    NativeRecursiveMutex::INIT
}

/// Counting semaphore with critical-section-guarded state.
///
/// Blocking acquisition spins against the tick; the `*_from_isr` variants
/// perform the same state update inside the interrupt-masked section and
/// never wait.
pub struct NativeCountingSemaphore {
    max: usize,
    count: CsMutex<Cell<usize>>,
}

impl NativeCountingSemaphore {
    /// Starts full: the initial count equals the ceiling.
    pub const fn new(max_count: usize) -> Self {
        Self {
            max: max_count,
            count: CsMutex::new(Cell::new(max_count)),
        }
    }

    /// Adds `update` to the count, clamping at the ceiling. Over-release is
    /// silently dropped, not an error.
    pub fn release(&self, update: usize) {
        critical_section::with(|cs| {
            let count = self.count.borrow(cs);
            count.set(count.get().saturating_add(update).min(self.max));
        });
    }

    pub fn acquire(&self) {
        while !self.try_acquire() {
            hint::spin_loop();
        }
    }

    pub fn try_acquire(&self) -> bool {
        critical_section::with(|cs| {
            let count = self.count.borrow(cs);
            if count.get() > 0 {
                count.set(count.get() - 1);
                true
            } else {
                false
            }
        })
    }

    pub fn try_acquire_for(&self, timeout: Duration) -> bool {
        let deadline = time::millis().saturating_add(timeout.as_millis() as u64);
        loop {
            if self.try_acquire() {
                return true;
            }
            if time::millis() >= deadline {
                return false;
            }
            hint::spin_loop();
        }
    }

    pub fn count(&self) -> usize {
        critical_section::with(|cs| self.count.borrow(cs).get())
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn release_from_isr(&self) {
        self.release(1);
    }

    pub fn try_acquire_from_isr(&self) -> bool {
        self.try_acquire()
    }
}

/// Bounded FIFO queue with critical-section-guarded storage.
pub struct NativeQueue<T> {
    capacity: usize,
    items: CsMutex<RefCell<VecDeque<T>>>,
}

impl<T> NativeQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: CsMutex::new(RefCell::new(VecDeque::with_capacity(capacity))),
        }
    }

    pub fn try_send(&self, value: T) -> Result<(), T> {
        critical_section::with(|cs| {
            let mut items = self.items.borrow_ref_mut(cs);
            if items.len() >= self.capacity {
                Err(value)
            } else {
                items.push_back(value);
                Ok(())
            }
        })
    }

    pub fn send(&self, value: T, timeout: Duration) -> Result<(), T> {
        let deadline = time::millis().saturating_add(timeout.as_millis() as u64);
        let mut value = value;
        loop {
            value = match self.try_send(value) {
                Ok(()) => return Ok(()),
                Err(v) => v,
            };
            if time::millis() >= deadline {
                return Err(value);
            }
            hint::spin_loop();
        }
    }

    pub fn try_recv(&self) -> Option<T> {
        critical_section::with(|cs| self.items.borrow_ref_mut(cs).pop_front())
    }

    pub fn recv(&self, timeout: Duration) -> Option<T> {
        let deadline = time::millis().saturating_add(timeout.as_millis() as u64);
        loop {
            if let Some(value) = self.try_recv() {
                return Some(value);
            }
            if time::millis() >= deadline {
                return None;
            }
            hint::spin_loop();
        }
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.items.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        critical_section::with(|cs| self.items.borrow_ref(cs).is_empty())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn try_send_from_isr(&self, value: T) -> Result<(), T> {
        self.try_send(value)
    }

    pub fn try_recv_from_isr(&self) -> Option<T> {
        self.try_recv()
    }
}

/// A task record held for the port kernel.
///
/// This backend does not context-switch by itself; it models the task for
/// the registry and hands the entry closure to the kernel, which runs it on
/// the stack it allocates for the task.
pub struct NativeThread {
    id: NativeTaskId,
    entry: Option<TaskFunc>,
}

impl NativeThread {
    pub const JOINABLE: bool = false;
    pub const SUSPENDABLE: bool = true;

    pub fn spawn(
        _name: &str,
        _stack_size: usize,
        task_id: usize,
        entry: TaskFunc,
    ) -> Result<Self, Error> {
        Ok(Self {
            id: task_id,
            entry: Some(entry),
        })
    }

    pub fn join(self) -> Result<(), Error> {
        Err(Error::NotSupported)
    }

    pub fn id(&self) -> NativeTaskId {
        self.id
    }

    /// Port hook: the kernel takes the entry closure to execute it in the
    /// task's own context. Returns `None` once taken.
    pub fn take_entry(&mut self) -> Option<TaskFunc> {
        self.entry.take()
    }
}
