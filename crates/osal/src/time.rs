//! Monotonic millisecond clock.
//!
//! Every timed wait in this crate, and the polling schedulers downstream,
//! measure time against [`millis`]. On the host backend the counter is
//! anchored to the process start; on the rtos backend the port's tick
//! interrupt advances it via [`tick`].

use core::time::Duration;

/// An absolute point on the [`millis`] timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Instant(u64);

impl Instant {
    /// Wraps an absolute millisecond tick value.
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// The current point on the timeline.
    pub fn now() -> Self {
        Self(millis())
    }

    /// The raw tick value.
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Milliseconds from `earlier` to `self`, zero if `earlier` is later.
    pub const fn saturating_since(self, earlier: Instant) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

#[cfg(feature = "host")]
mod clock {
    use once_cell::sync::Lazy;
    use std::time::Instant;

    static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

    pub fn millis() -> u64 {
        EPOCH.elapsed().as_millis() as u64
    }

    pub fn delay_ms(ms: u64) {
        std::thread::sleep(core::time::Duration::from_millis(ms));
    }
}

#[cfg(feature = "rtos")]
mod clock {
    use core::hint;
    use core::sync::atomic::{AtomicU32, Ordering};

    /// Advanced by the port's tick interrupt. 32 bits keeps the counter a
    /// single atomic on 32-bit cores; it wraps after ~49.7 days of uptime.
    static TICKS: AtomicU32 = AtomicU32::new(0);

    pub fn millis() -> u64 {
        TICKS.load(Ordering::Relaxed) as u64
    }

    /// Port hook: advance the clock by `elapsed_ms`. Call from the system
    /// tick interrupt.
    pub fn tick(elapsed_ms: u32) {
        TICKS.fetch_add(elapsed_ms, Ordering::Relaxed);
    }

    pub fn delay_ms(ms: u64) {
        let deadline = millis().saturating_add(ms);
        while millis() < deadline {
            hint::spin_loop();
        }
    }
}

/// Milliseconds elapsed since system start.
pub fn millis() -> u64 {
    clock::millis()
}

/// Blocks the calling context for at least `ms` milliseconds.
pub fn delay_ms(ms: u64) {
    clock::delay_ms(ms);
}

/// Port hook (rtos backend): advance the clock from the tick interrupt.
#[cfg(feature = "rtos")]
pub fn tick(elapsed_ms: u32) {
    clock::tick(elapsed_ms);
}

#[cfg(all(test, feature = "host"))]
mod tests {
    use super::*;

    #[test]
    fn millis_is_monotonic() {
        let a = millis();
        delay_ms(2);
        let b = millis();
        assert!(b >= a + 2);
    }

    #[test]
    fn instant_saturates_backwards() {
        let early = Instant::from_millis(100);
        let late = Instant::from_millis(350);
        assert_eq!(late.saturating_since(early), Duration::from_millis(250));
        assert_eq!(early.saturating_since(late), Duration::ZERO);
    }
}
