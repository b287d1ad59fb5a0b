//! Single-slot polling dispatcher.
//!
//! One callback record, armed as one-shot, periodic, or periodic-limited,
//! and driven entirely by an external [`Polled::poll`] call. `poll()` never
//! blocks and reads the millisecond clock exactly once per invocation; it
//! is meant to run from a tight loop or a low-priority background task.
//!
//! Periodic rescheduling advances from the previously *scheduled* time, not
//! from "now", so jitter in the polling cadence does not accumulate into
//! long-term drift.

use alloc::boxed::Box;

use peregrine_osal::time;

/// How an armed callback repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    /// Fire once, then disarm.
    OneShot,
    /// Fire every `call_rate` milliseconds until rearmed or cancelled.
    Periodic,
    /// Fire every `call_rate` milliseconds, disarming after a fixed number
    /// of invocations.
    PeriodicLimited,
}

/// Whether a one-shot deadline is an absolute tick or relative to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingType {
    Absolute,
    Relative,
}

struct TimerEntry {
    func: Box<dyn FnMut() + Send>,
    call_type: CallType,
    call_rate: u64,
    next_call_time: u64,
    num_calls: usize,
    max_calls: usize,
}

/// The dispatcher. Holds at most one armed callback at a time; arming
/// replaces whatever was there.
pub struct Polled {
    clock: Box<dyn Fn() -> u64 + Send>,
    slot: Option<TimerEntry>,
}

impl Polled {
    /// Sentinel returned by [`poll`](Self::poll) when nothing is armed.
    pub const IDLE: i64 = i64::MIN;

    /// A dispatcher reading the OSAL millisecond clock.
    pub fn new() -> Self {
        Self::with_clock(time::millis)
    }

    /// A dispatcher reading a caller-supplied millisecond clock. The test
    /// suites drive this with a manually advanced counter.
    pub fn with_clock(clock: impl Fn() -> u64 + Send + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            slot: None,
        }
    }

    /// Arms a callback to fire once at `when`: an absolute tick, or an
    /// offset from now, per `relation`.
    pub fn one_shot(&mut self, func: impl FnMut() + Send + 'static, when: u64, relation: TimingType) {
        let next_call_time = match relation {
            TimingType::Absolute => when,
            TimingType::Relative => (self.clock)().saturating_add(when),
        };
        self.slot = Some(TimerEntry {
            func: Box::new(func),
            call_type: CallType::OneShot,
            call_rate: 0,
            next_call_time,
            num_calls: 0,
            max_calls: 0,
        });
    }

    /// Arms a callback to fire every `rate` milliseconds.
    pub fn periodic(&mut self, func: impl FnMut() + Send + 'static, rate: u64) {
        self.slot = Some(TimerEntry {
            func: Box::new(func),
            call_type: CallType::Periodic,
            call_rate: rate,
            next_call_time: (self.clock)().saturating_add(rate),
            num_calls: 0,
            max_calls: 0,
        });
    }

    /// Arms a callback to fire every `rate` milliseconds, disarming after
    /// exactly `num_times` invocations.
    pub fn periodic_limited(
        &mut self,
        func: impl FnMut() + Send + 'static,
        rate: u64,
        num_times: usize,
    ) {
        self.slot = Some(TimerEntry {
            func: Box::new(func),
            call_type: CallType::PeriodicLimited,
            call_rate: rate,
            next_call_time: (self.clock)().saturating_add(rate),
            num_calls: 0,
            max_calls: num_times,
        });
    }

    /// Disarms the slot without invoking the callback.
    pub fn cancel(&mut self) {
        self.slot = None;
    }

    pub fn is_armed(&self) -> bool {
        self.slot.is_some()
    }

    /// Whether the next [`poll`](Self::poll) would invoke the callback.
    pub fn is_due(&self) -> bool {
        match &self.slot {
            Some(entry) => entry.next_call_time <= (self.clock)(),
            None => false,
        }
    }

    /// Runs the callback if it is due. Never blocks.
    ///
    /// Returns [`Polled::IDLE`] when unarmed; a negative early indicator
    /// (`now - next_call_time`, in milliseconds) when polled before the
    /// deadline, without invoking the callback; otherwise invokes the
    /// callback exactly once and returns how far past the scheduled time
    /// the call landed, as a non-positive delta.
    pub fn poll(&mut self) -> i64 {
        let now = (self.clock)();

        let Some(entry) = self.slot.as_mut() else {
            return Self::IDLE;
        };

        if entry.next_call_time > now {
            return now as i64 - entry.next_call_time as i64;
        }
        let call_time = entry.next_call_time as i64 - now as i64;

        (entry.func)();
        entry.num_calls += 1;

        let disarm = match entry.call_type {
            CallType::OneShot => true,
            CallType::Periodic => {
                entry.next_call_time = entry.next_call_time.saturating_add(entry.call_rate);
                false
            }
            CallType::PeriodicLimited => {
                if entry.num_calls >= entry.max_calls {
                    true
                } else {
                    entry.next_call_time = entry.next_call_time.saturating_add(entry.call_rate);
                    false
                }
            }
        };
        if disarm {
            self.slot = None;
        }

        call_time
    }
}

impl Default for Polled {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    /// Manually advanced clock shared between the test and the dispatcher.
    fn test_clock() -> (Arc<AtomicU64>, Polled) {
        let now = Arc::new(AtomicU64::new(0));
        let handle = now.clone();
        let polled = Polled::with_clock(move || handle.load(Ordering::Relaxed));
        (now, polled)
    }

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        (count, move || {
            inner.fetch_add(1, Ordering::Relaxed);
        })
    }

    #[test]
    fn unarmed_poll_returns_the_idle_sentinel() {
        let (_now, mut polled) = test_clock();
        assert!(!polled.is_armed());
        assert_eq!(polled.poll(), Polled::IDLE);
    }

    #[test]
    fn one_shot_fires_exactly_once_at_the_deadline() {
        let (now, mut polled) = test_clock();
        let (count, cb) = counter();

        polled.one_shot(cb, 100, TimingType::Relative);

        // Early polls report the negative time remaining and do not fire.
        now.store(40, Ordering::Relaxed);
        assert_eq!(polled.poll(), -60);
        assert_eq!(count.load(Ordering::Relaxed), 0);

        now.store(99, Ordering::Relaxed);
        assert_eq!(polled.poll(), -1);
        assert_eq!(count.load(Ordering::Relaxed), 0);

        // First due poll fires.
        now.store(103, Ordering::Relaxed);
        assert_eq!(polled.poll(), -3);
        assert_eq!(count.load(Ordering::Relaxed), 1);

        // Disarmed afterwards: subsequent polls are no-ops.
        assert!(!polled.is_armed());
        now.store(500, Ordering::Relaxed);
        assert_eq!(polled.poll(), Polled::IDLE);
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn one_shot_absolute_ignores_the_current_time_base() {
        let (now, mut polled) = test_clock();
        let (count, cb) = counter();

        now.store(1000, Ordering::Relaxed);
        polled.one_shot(cb, 1200, TimingType::Absolute);

        now.store(1199, Ordering::Relaxed);
        assert_eq!(polled.poll(), -1);
        now.store(1200, Ordering::Relaxed);
        assert_eq!(polled.poll(), 0);
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn periodic_reschedules_from_the_scheduled_time_not_now() {
        let (now, mut polled) = test_clock();
        let (count, cb) = counter();

        polled.periodic(cb, 50);

        // Poll deliberately late each period; the schedule must not drift.
        // Scheduled times are 50, 100, 150, ... regardless of poll jitter.
        now.store(73, Ordering::Relaxed);
        polled.poll();
        assert_eq!(count.load(Ordering::Relaxed), 1);

        // Next deadline is 100 (not 73 + 50 = 123): a poll at 110 fires.
        now.store(110, Ordering::Relaxed);
        polled.poll();
        assert_eq!(count.load(Ordering::Relaxed), 2);

        // And the one after is 150.
        now.store(149, Ordering::Relaxed);
        assert_eq!(polled.poll(), -1);
        now.store(150, Ordering::Relaxed);
        polled.poll();
        assert_eq!(count.load(Ordering::Relaxed), 3);

        // Call count over a fixed window matches the rate.
        for tick in (200..=400).step_by(50) {
            now.store(tick, Ordering::Relaxed);
            polled.poll();
        }
        assert_eq!(count.load(Ordering::Relaxed), 8);
        assert!(polled.is_armed());
    }

    #[test]
    fn periodic_limited_disarms_after_exactly_n_invocations() {
        let (now, mut polled) = test_clock();
        let (count, cb) = counter();

        polled.periodic_limited(cb, 10, 3);

        for tick in [10, 20, 30] {
            now.store(tick, Ordering::Relaxed);
            polled.poll();
        }
        assert_eq!(count.load(Ordering::Relaxed), 3);
        assert!(!polled.is_armed());

        // A fourth due poll is a no-op.
        now.store(40, Ordering::Relaxed);
        assert_eq!(polled.poll(), Polled::IDLE);
        assert_eq!(count.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn rearming_replaces_the_previous_callback() {
        let (now, mut polled) = test_clock();
        let (first, first_cb) = counter();
        let (second, second_cb) = counter();

        polled.periodic(first_cb, 10);
        polled.one_shot(second_cb, 5, TimingType::Relative);

        now.store(20, Ordering::Relaxed);
        polled.poll();
        assert_eq!(first.load(Ordering::Relaxed), 0);
        assert_eq!(second.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn cancel_disarms_without_invoking() {
        let (now, mut polled) = test_clock();
        let (count, cb) = counter();

        polled.one_shot(cb, 10, TimingType::Relative);
        polled.cancel();
        now.store(50, Ordering::Relaxed);
        assert_eq!(polled.poll(), Polled::IDLE);
        assert_eq!(count.load(Ordering::Relaxed), 0);
    }
}
