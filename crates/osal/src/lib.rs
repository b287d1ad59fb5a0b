//! # peregrine-osal
//!
//! OS abstraction layer for the Peregrine embedded HAL. Driver code in the
//! wider HAL is written once against the primitives in this crate and runs
//! unchanged on two very different runtimes:
//!
//! - **host**: preemptive OS threads on a development machine, used for
//!   simulation, tooling, and the test suite.
//! - **rtos**: a bare-metal port layer for preemptive RTOS targets, built
//!   from spin locks, critical sections, and a port-supplied tick.
//!
//! The backend is chosen once, at build time, through cargo features. The
//! rest of the crate (and everything downstream) sees only the abstract
//! names re-exported here.
//!
//! ## Module Overview
//!
//! - [`mutex`]     – blocking, recursive, and timed mutual exclusion
//! - [`semaphore`] – counting/binary semaphores with ISR-safe entry points
//! - [`queue`]     – bounded FIFO message passing between tasks
//! - [`thread`]    – task lifecycle wrapper and the task registry
//! - [`lockable`]  – lock composition for driver types, scope guards
//! - [`asyncio`]   – event-wait composition for interrupt-driven drivers
//! - [`time`]      – monotonic millisecond clock shared by all timed waits
//! - [`fault`]     – the single hard-fault policy for unsupported operations

#![cfg_attr(not(feature = "host"), no_std)]

extern crate alloc;

#[cfg(all(feature = "host", feature = "rtos"))]
compile_error!("features `host` and `rtos` are mutually exclusive: select exactly one threading backend");

#[cfg(not(any(feature = "host", feature = "rtos")))]
compile_error!("no threading backend selected: enable either the `host` or the `rtos` feature");

pub mod asyncio;
pub mod backend;
pub mod error;
pub mod event;
pub mod fault;
pub mod lockable;
pub mod mutex;
pub mod queue;
pub mod semaphore;
pub mod thread;
pub mod time;

pub use asyncio::{AsyncIo, AsyncIoCapable};
pub use error::{Error, Result};
pub use event::Trigger;
pub use lockable::{LockGuard, Lockable, TimedLockGuard};
pub use mutex::{BlockingLock, Mutex, RecursiveMutex, RecursiveTimedMutex, TimedLock, TimedMutex};
pub use queue::MessageQueue;
pub use semaphore::{BinarySemaphore, CountingSemaphore};
pub use thread::{Priority, Task, TaskId, TaskRegistry, TaskState};
