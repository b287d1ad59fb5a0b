//! Host backend: OS threads and `parking_lot` primitives.
//!
//! This backend has no interrupt model. Every `*_from_isr` entry point is a
//! programming error here and goes through the hard-fault policy instead of
//! silently succeeding.

use alloc::collections::VecDeque;
use core::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::error::Error;
use crate::fault;
use crate::thread::TaskFunc;

pub const HAS_INTERRUPTS: bool = false;

/// Execution context id reserved for code running outside any task.
pub const MAIN_CONTEXT_ID: usize = 1;

pub type NativeMutex = parking_lot::RawMutex;
pub type NativeTimedMutex = parking_lot::RawMutex;
pub type NativeRecursiveMutex =
    lock_api::RawReentrantMutex<parking_lot::RawMutex, parking_lot::RawThreadId>;
pub type NativeRecursiveTimedMutex = NativeRecursiveMutex;
pub type NativeTaskId = std::thread::ThreadId;

pub const fn native_mutex() -> NativeMutex {
    <parking_lot::RawMutex as lock_api::RawMutex>::INIT
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

/// Counting semaphore over a mutex/condvar pair.
pub struct NativeCountingSemaphore {
    max: usize,
    count: Mutex<usize>,
    available: Condvar,
}

impl NativeCountingSemaphore {
    /// Starts full: the initial count equals the ceiling.
    pub const fn new(max_count: usize) -> Self {
        Self {
            max: max_count,
            count: Mutex::new(max_count),
            available: Condvar::new(),
        }
    }

    /// Adds `update` to the count, clamping at the ceiling. Over-release is
    /// silently dropped, not an error.
    pub fn release(&self, update: usize) {
        let mut count = self.count.lock();
        *count = count.saturating_add(update).min(self.max);
        self.available.notify_all();
    }

    pub fn acquire(&self) {
        let mut count = self.count.lock();
        while *count == 0 {
            self.available.wait(&mut count);
        }
        *count -= 1;
    }

    pub fn try_acquire(&self) -> bool {
        let mut count = self.count.lock();
        if *count > 0 {
            *count -= 1;
            true
        } else {
            false
        }
    }

    pub fn try_acquire_for(&self, timeout: Duration) -> bool {
        let Some(deadline) = std::time::Instant::now().checked_add(timeout) else {
            // A timeout too large to represent is an unbounded wait.
            self.acquire();
            return true;
        };

        let mut count = self.count.lock();
        loop {
            if *count > 0 {
                *count -= 1;
                return true;
            }
            if self.available.wait_until(&mut count, deadline).timed_out() {
                if *count > 0 {
                    *count -= 1;
                    return true;
                }
                return false;
            }
        }
    }

    pub fn count(&self) -> usize {
        *self.count.lock()
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn release_from_isr(&self) {
        fault::hard_fault("semaphore release_from_isr on a backend without interrupts");
    }

    pub fn try_acquire_from_isr(&self) -> bool {
        fault::hard_fault("semaphore try_acquire_from_isr on a backend without interrupts");
    }
}

/// Bounded FIFO queue over a mutex/condvar pair.
pub struct NativeQueue<T> {
    capacity: usize,
    items: Mutex<VecDeque<T>>,
    readable: Condvar,
    writable: Condvar,
}

impl<T> NativeQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            readable: Condvar::new(),
            writable: Condvar::new(),
        }
    }

    pub fn try_send(&self, value: T) -> Result<(), T> {
        let mut items = self.items.lock();
        if items.len() >= self.capacity {
            return Err(value);
        }
        items.push_back(value);
        self.readable.notify_one();
        Ok(())
    }

    pub fn send(&self, value: T, timeout: Duration) -> Result<(), T> {
        let Some(deadline) = std::time::Instant::now().checked_add(timeout) else {
            let mut items = self.items.lock();
            while items.len() >= self.capacity {
                self.writable.wait(&mut items);
            }
            items.push_back(value);
            self.readable.notify_one();
            return Ok(());
        };

        let mut items = self.items.lock();
        while items.len() >= self.capacity {
            if self.writable.wait_until(&mut items, deadline).timed_out()
                && items.len() >= self.capacity
            {
                return Err(value);
            }
        }
        items.push_back(value);
        self.readable.notify_one();
        Ok(())
    }

    pub fn try_recv(&self) -> Option<T> {
        let mut items = self.items.lock();
        let value = items.pop_front();
        if value.is_some() {
            self.writable.notify_one();
        }
        value
    }

    pub fn recv(&self, timeout: Duration) -> Option<T> {
        let Some(deadline) = std::time::Instant::now().checked_add(timeout) else {
            let mut items = self.items.lock();
            loop {
                if let Some(value) = items.pop_front() {
                    self.writable.notify_one();
                    return Some(value);
                }
                self.readable.wait(&mut items);
            }
        };

        let mut items = self.items.lock();
        loop {
            if let Some(value) = items.pop_front() {
                self.writable.notify_one();
                return Some(value);
            }
            if self.readable.wait_until(&mut items, deadline).timed_out() {
                let value = items.pop_front();
                if value.is_some() {
                    self.writable.notify_one();
                }
                return value;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn try_send_from_isr(&self, _value: T) -> Result<(), T> {
        fault::hard_fault("queue try_send_from_isr on a backend without interrupts");
    }

    pub fn try_recv_from_isr(&self) -> Option<T> {
        fault::hard_fault("queue try_recv_from_isr on a backend without interrupts");
    }
}

/// A spawned OS thread.
pub struct NativeThread {
    handle: std::thread::JoinHandle<()>,
}

impl NativeThread {
    pub const JOINABLE: bool = true;
    pub const SUSPENDABLE: bool = false;

    pub fn spawn(
        name: &str,
        stack_size: usize,
        _task_id: usize,
        entry: TaskFunc,
    ) -> Result<Self, Error> {
        let mut builder = std::thread::Builder::new().name(name.to_owned());
        if stack_size > 0 {
            builder = builder.stack_size(stack_size);
        }
        match builder.spawn(entry) {
            Ok(handle) => Ok(Self { handle }),
            Err(err) => {
                log::warn!("failed to spawn thread '{name}': {err}");
                Err(Error::TaskFailed)
            }
        }
    }

    pub fn join(self) -> Result<(), Error> {
        self.handle.join().map_err(|_| Error::TaskFailed)
    }

    pub fn id(&self) -> NativeTaskId {
        self.handle.thread().id()
    }
}
