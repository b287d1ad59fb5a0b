#![cfg(feature = "host")]

//! The scheduler service task pumping real wall-clock timers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use peregrine_osal::thread::Priority;
use peregrine_osal::time;
use peregrine_sched::lores::{spawn_service, Scheduler};
use peregrine_sched::polled::TimingType;

#[test]
fn service_task_drives_armed_timers() {
    let one_shots = Arc::new(AtomicUsize::new(0));
    let periodics = Arc::new(AtomicUsize::new(0));

    let mut scheduler = Scheduler::new();
    scheduler.set_resolution(2);

    let hits = one_shots.clone();
    scheduler
        .one_shot(
            move || {
                hits.fetch_add(1, Ordering::Relaxed);
            },
            30,
            TimingType::Relative,
        )
        .unwrap();

    let ticks = periodics.clone();
    scheduler
        .periodic(
            move || {
                ticks.fetch_add(1, Ordering::Relaxed);
            },
            25,
        )
        .unwrap();

    let service = spawn_service(scheduler, Priority::Level1).unwrap();

    // Generous window: at 25 ms period, 300 ms yields 12 nominal firings.
    time::delay_ms(300);
    service.stop().unwrap();

    assert_eq!(one_shots.load(Ordering::Relaxed), 1);
    let fired = periodics.load(Ordering::Relaxed);
    assert!(fired >= 5, "periodic fired only {fired} times");

    // Stopped: no further callbacks arrive.
    let settled = periodics.load(Ordering::Relaxed);
    time::delay_ms(80);
    assert_eq!(periodics.load(Ordering::Relaxed), settled);
}
