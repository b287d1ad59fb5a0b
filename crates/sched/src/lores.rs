//! Low-resolution software-timer scheduler.
//!
//! A bounded set of [`Polled`] slots behind one owner. Arm entries with
//! [`Scheduler::one_shot`] / [`Scheduler::periodic`], pump them with
//! [`Scheduler::process`], or hand the scheduler to a dedicated service
//! task with [`spawn_service`], which polls at a fixed resolution until
//! stopped.
//!
//! Millisecond timing makes this suitable only for relatively low-frequency
//! work; callback start times shift with the polling cadence and with the
//! runtime of earlier callbacks in the same pass.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};

use peregrine_osal::thread::{Priority, Task};
use peregrine_osal::{time, Error};

use crate::polled::{Polled, TimingType};

/// Number of timer slots per scheduler.
pub const MAX_TIMERS: usize = 15;

/// Default service polling period, in milliseconds.
pub const DEFAULT_RESOLUTION_MS: u64 = 5;

/// Handle to an armed entry. Stale handles (entries that expired or were
/// rearmed) are rejected rather than cancelling an unrelated entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    slot: usize,
    generation: u32,
}

struct Slot {
    polled: Polled,
    generation: u32,
}

pub struct Scheduler {
    slots: Vec<Slot>,
    resolution: u64,
}

impl Scheduler {
    /// A scheduler reading the OSAL millisecond clock.
    pub fn new() -> Self {
        Self::build(Polled::new)
    }

    /// A scheduler reading a caller-supplied clock (shared by every slot).
    pub fn with_clock(clock: impl Fn() -> u64 + Clone + Send + 'static) -> Self {
        Self::build(move || Polled::with_clock(clock.clone()))
    }

    fn build(mut make_polled: impl FnMut() -> Polled) -> Self {
        let slots = (0..MAX_TIMERS)
            .map(|_| Slot {
                polled: make_polled(),
                generation: 0,
            })
            .collect();
        Self {
            slots,
            resolution: DEFAULT_RESOLUTION_MS,
        }
    }

    /// The period, in milliseconds, at which a service task polls this
    /// scheduler.
    pub fn resolution(&self) -> u64 {
        self.resolution
    }

    pub fn set_resolution(&mut self, resolution_ms: u64) {
        self.resolution = resolution_ms.max(1);
    }

    fn arm(
        &mut self,
        arm_slot: impl FnOnce(&mut Polled),
    ) -> Result<TimerHandle, Error> {
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| !slot.polled.is_armed())
            .ok_or(Error::Full)?;
        slot.generation = slot.generation.wrapping_add(1);
        arm_slot(&mut slot.polled);
        log::debug!("timer slot {index} armed (generation {})", slot.generation);
        Ok(TimerHandle {
            slot: index,
            generation: slot.generation,
        })
    }

    /// Schedules `func` to run once at `when`.
    pub fn one_shot(
        &mut self,
        func: impl FnMut() + Send + 'static,
        when: u64,
        relation: TimingType,
    ) -> Result<TimerHandle, Error> {
        self.arm(|polled| polled.one_shot(func, when, relation))
    }

    /// Schedules `func` to run every `rate` milliseconds.
    pub fn periodic(
        &mut self,
        func: impl FnMut() + Send + 'static,
        rate: u64,
    ) -> Result<TimerHandle, Error> {
        self.arm(|polled| polled.periodic(func, rate))
    }

    /// Schedules `func` to run every `rate` milliseconds, at most
    /// `num_times` times.
    pub fn periodic_limited(
        &mut self,
        func: impl FnMut() + Send + 'static,
        rate: u64,
        num_times: usize,
    ) -> Result<TimerHandle, Error> {
        self.arm(|polled| polled.periodic_limited(func, rate, num_times))
    }

    /// Cancels a pending entry. Fails with [`Error::NotFound`] when the
    /// handle is stale or out of range.
    pub fn cancel(&mut self, handle: TimerHandle) -> Result<(), Error> {
        let slot = self.slots.get_mut(handle.slot).ok_or(Error::NotFound)?;
        if slot.generation != handle.generation || !slot.polled.is_armed() {
            return Err(Error::NotFound);
        }
        slot.polled.cancel();
        Ok(())
    }

    /// Runs every due entry once. Returns the number of callbacks invoked.
    pub fn process(&mut self) -> usize {
        let mut fired = 0;
        for slot in &mut self.slots {
            if slot.polled.is_due() {
                slot.polled.poll();
                fired += 1;
            }
        }
        fired
    }

    /// Number of armed entries.
    pub fn armed(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.polled.is_armed())
            .count()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// A running scheduler service task.
pub struct ServiceHandle {
    running: Arc<AtomicBool>,
    task: Task,
}

impl ServiceHandle {
    /// Asks the service loop to exit and waits for it.
    ///
    /// On backends whose tasks cannot be joined the service still stops,
    /// but this reports [`Error::NotSupported`] for the wait itself.
    pub fn stop(mut self) -> Result<(), Error> {
        self.running.store(false, Ordering::Relaxed);
        self.task.join()
    }
}

/// Moves `scheduler` into a dedicated task that pumps it at its configured
/// resolution until [`ServiceHandle::stop`] is called.
///
/// Arm every entry before handing the scheduler over; the service owns it
/// from here on.
pub fn spawn_service(mut scheduler: Scheduler, priority: Priority) -> Result<ServiceHandle, Error> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    let resolution = scheduler.resolution();

    let mut task = Task::new();
    task.initialize(
        move || {
            while flag.load(Ordering::Relaxed) {
                scheduler.process();
                time::delay_ms(resolution);
            }
        },
        priority,
        32 * 1024,
        "swtimer",
    )?;
    task.start()?;
    log::info!("software timer service started ({resolution} ms resolution)");
    Ok(ServiceHandle { running, task })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    fn test_scheduler() -> (Arc<AtomicU64>, Scheduler) {
        let now = Arc::new(AtomicU64::new(0));
        let handle = now.clone();
        let scheduler = Scheduler::with_clock(move || handle.load(Ordering::Relaxed));
        (now, scheduler)
    }

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        (count, move || {
            inner.fetch_add(1, Ordering::Relaxed);
        })
    }

    #[test]
    fn mixed_entries_fire_on_their_own_schedules() {
        let (now, mut scheduler) = test_scheduler();
        let (ones, one_cb) = counter();
        let (pers, per_cb) = counter();

        scheduler.one_shot(one_cb, 30, TimingType::Relative).unwrap();
        scheduler.periodic(per_cb, 20).unwrap();
        assert_eq!(scheduler.armed(), 2);

        now.store(20, Ordering::Relaxed);
        assert_eq!(scheduler.process(), 1);
        now.store(30, Ordering::Relaxed);
        assert_eq!(scheduler.process(), 1);
        now.store(40, Ordering::Relaxed);
        assert_eq!(scheduler.process(), 1);

        assert_eq!(ones.load(Ordering::Relaxed), 1);
        assert_eq!(pers.load(Ordering::Relaxed), 2);
        assert_eq!(scheduler.armed(), 1);
    }

    #[test]
    fn capacity_is_bounded_and_fails_closed() {
        let (_now, mut scheduler) = test_scheduler();
        for _ in 0..MAX_TIMERS {
            scheduler.periodic(|| {}, 100).unwrap();
        }
        assert_eq!(
            scheduler.periodic(|| {}, 100).unwrap_err(),
            Error::Full
        );
    }

    #[test]
    fn expired_slots_become_reusable() {
        let (now, mut scheduler) = test_scheduler();
        for _ in 0..MAX_TIMERS {
            scheduler.one_shot(|| {}, 10, TimingType::Relative).unwrap();
        }
        now.store(10, Ordering::Relaxed);
        assert_eq!(scheduler.process(), MAX_TIMERS);
        assert_eq!(scheduler.armed(), 0);

        scheduler.periodic(|| {}, 50).unwrap();
        assert_eq!(scheduler.armed(), 1);
    }

    #[test]
    fn stale_handles_do_not_cancel_new_entries() {
        let (now, mut scheduler) = test_scheduler();
        let stale = scheduler.one_shot(|| {}, 10, TimingType::Relative).unwrap();

        now.store(10, Ordering::Relaxed);
        scheduler.process();

        // Same slot, new generation.
        let fresh = scheduler.periodic(|| {}, 50).unwrap();
        assert_eq!(scheduler.cancel(stale), Err(Error::NotFound));
        assert_eq!(scheduler.armed(), 1);
        scheduler.cancel(fresh).unwrap();
        assert_eq!(scheduler.armed(), 0);
        assert_eq!(scheduler.cancel(fresh), Err(Error::NotFound));
    }
}
