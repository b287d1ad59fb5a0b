//! # peregrine-sched
//!
//! Software-timer scheduling for the Peregrine HAL, in two layers:
//!
//! - [`polled`] – a single-slot dispatcher driven entirely by an external
//!   `poll()` call; no thread, no blocking, suitable for tight loops and
//!   low-priority background tasks.
//! - [`lores`] – a bounded multi-slot scheduler built from polled slots,
//!   with an optional service task that pumps it at a fixed resolution.
//!
//! Timing comes from the OSAL millisecond clock; neither layer performs any
//! internal timekeeping beyond reading it.

#![cfg_attr(not(feature = "host"), no_std)]

extern crate alloc;

pub mod lores;
pub mod polled;

pub use lores::Scheduler;
pub use polled::{CallType, Polled, TimingType};
