//! Drives a Polled dispatcher from a plain loop: a limited heartbeat
//! message followed by a one-shot farewell.

use peregrine_osal::time;
use peregrine_sched::polled::{Polled, TimingType};

fn main() {
    let mut heartbeat = Polled::new();
    heartbeat.periodic_limited(|| println!("heartbeat at {} ms", time::millis()), 100, 5);

    while heartbeat.is_armed() {
        heartbeat.poll();
        time::delay_ms(5);
    }

    let mut farewell = Polled::new();
    farewell.one_shot(|| println!("done"), 50, TimingType::Relative);
    while farewell.is_armed() {
        farewell.poll();
        time::delay_ms(5);
    }
}
