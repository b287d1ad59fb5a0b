//! Event-wait composition for interrupt-driven drivers.
//!
//! A driver embeds one [`AsyncIo`] instance. Its interrupt (or completion
//! callback) calls [`AsyncIo::signal_event`]; application code blocks in
//! [`AsyncIo::await_event`] until the expected trigger fires, the driver
//! reports a system error, or the timeout lapses. One waiter at a time: an
//! internal mutex serializes waiting contexts, keeping the signal path
//! single-producer/single-consumer.

use core::sync::atomic::{AtomicU8, Ordering};
use core::time::Duration;

use crate::error::Error;
use crate::event::{Trigger, ALL_TRIGGERS};
use crate::lockable::LockGuard;
use crate::mutex::Mutex;
use crate::semaphore::BinarySemaphore;
use crate::time;

pub struct AsyncIo {
    /// Most recent trigger signalled by the driver.
    event: AtomicU8,
    /// Bit mask of triggers this driver can produce.
    allowed: u32,
    /// Released once per signal; waiters pend on it.
    signal: BinarySemaphore,
    /// Serializes waiting contexts.
    waiter: Mutex,
}

impl AsyncIo {
    /// An instance accepting every trigger.
    pub fn new() -> Self {
        Self::with_allowed(ALL_TRIGGERS)
    }

    /// An instance accepting only the triggers in `allowed`.
    /// [`Trigger::SystemError`] is always accepted.
    pub fn with_allowed(allowed: u32) -> Self {
        let signal = BinarySemaphore::new();
        // Binary semaphores construct full; drain so the first wait blocks.
        signal.try_acquire();
        Self {
            event: AtomicU8::new(Trigger::Unknown as u8),
            allowed: allowed | Trigger::SystemError.mask(),
            signal,
            waiter: Mutex::new(),
        }
    }

    /// Blocks until `event` fires or `timeout` lapses.
    ///
    /// Returns [`Error::NotSupported`] for triggers outside the allowed
    /// mask, [`Error::SystemError`] if the driver signals a fault while
    /// waiting, and [`Error::Timeout`] when the window closes without the
    /// event. Signals for other triggers re-arm the wait with the time
    /// remaining.
    pub fn await_event(&self, event: Trigger, timeout: Duration) -> Result<(), Error> {
        if event == Trigger::Unknown || self.allowed & event.mask() == 0 {
            return Err(Error::NotSupported);
        }

        let _exclusive = LockGuard::new(&self.waiter);

        let start = time::millis();
        let total = timeout.as_millis() as u64;
        let mut remaining = timeout;
        loop {
            let _ = self.signal.try_acquire_for(remaining);

            let fired = Trigger::from_u8(self.event.load(Ordering::Acquire));
            if fired == Trigger::SystemError {
                return Err(Error::SystemError);
            }
            if fired == event {
                return Ok(());
            }

            let elapsed = time::millis().saturating_sub(start);
            if elapsed >= total {
                return Err(Error::Timeout);
            }
            remaining = Duration::from_millis(total - elapsed);
        }
    }

    /// As [`await_event`](Self::await_event), additionally releasing
    /// `notifier` on success so a caller further up the stack can observe
    /// the completion.
    pub fn await_with_notifier(
        &self,
        event: Trigger,
        notifier: &BinarySemaphore,
        timeout: Duration,
    ) -> Result<(), Error> {
        let result = self.await_event(event, timeout);
        if result.is_ok() {
            notifier.release(1);
        }
        result
    }

    /// Records `trigger` and wakes the waiter. Called from the driver's
    /// completion path.
    pub fn signal_event(&self, trigger: Trigger) {
        self.event.store(trigger as u8, Ordering::Release);
        self.signal.release(1);
    }

    /// ISR-safe variant of [`signal_event`](Self::signal_event).
    pub fn signal_event_from_isr(&self, trigger: Trigger) {
        self.event.store(trigger as u8, Ordering::Release);
        self.signal.release_from_isr();
    }

    /// Returns the signal state to not-triggered. Call before starting a
    /// new transaction.
    pub fn reset(&self) {
        self.event.store(Trigger::Unknown as u8, Ordering::Release);
        self.signal.try_acquire();
    }
}

impl Default for AsyncIo {
    fn default() -> Self {
        Self::new()
    }
}

/// Event-wait surface for driver types, by delegation to an embedded
/// [`AsyncIo`].
pub trait AsyncIoCapable {
    fn async_io(&self) -> &AsyncIo;

    fn await_event(&self, event: Trigger, timeout: Duration) -> Result<(), Error> {
        self.async_io().await_event(event, timeout)
    }

    fn await_with_notifier(
        &self,
        event: Trigger,
        notifier: &BinarySemaphore,
        timeout: Duration,
    ) -> Result<(), Error> {
        self.async_io().await_with_notifier(event, notifier, timeout)
    }

    fn signal_event(&self, trigger: Trigger) {
        self.async_io().signal_event(trigger);
    }
}
