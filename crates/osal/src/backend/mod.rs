//! Backend selection.
//!
//! Exactly one backend module is compiled per build; both define the same
//! set of native type names and constructors, so nothing outside this
//! module branches on the active backend. Enabling both features, or
//! neither, is rejected in `lib.rs` with a compile error; there is no
//! silent fallback.
//!
//! Names exported by each backend:
//!
//! - `NativeMutex`, `NativeTimedMutex`: a [`lock_api::RawMutex`] +
//!   [`lock_api::RawMutexTimed`] implementation
//! - `NativeRecursiveMutex`, `NativeRecursiveTimedMutex`: a
//!   [`lock_api::RawReentrantMutex`] instantiation; recursion bookkeeping
//!   is always delegated there, never reimplemented
//! - `NativeCountingSemaphore`, `NativeQueue`: blocking primitives with
//!   ISR-safe entry points where the backend has an interrupt model
//! - `NativeThread`, `NativeTaskId`: the schedulable unit of execution
//! - `HAS_INTERRUPTS`: whether ISR-safe entry points are meaningful

#[cfg(feature = "host")]
mod host;
#[cfg(feature = "host")]
pub use host::*;

#[cfg(feature = "rtos")]
mod rtos;
#[cfg(feature = "rtos")]
pub use rtos::*;
