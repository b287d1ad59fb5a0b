#![cfg(feature = "host")]

//! Cross-thread event signalling through the AsyncIo composition.

use std::sync::Arc;
use std::time::Duration;

use peregrine_osal::asyncio::{AsyncIo, AsyncIoCapable};
use peregrine_osal::semaphore::BinarySemaphore;
use peregrine_osal::thread::{Priority, Task};
use peregrine_osal::{Error, Trigger};

struct FakeUart {
    aio: AsyncIo,
}

impl FakeUart {
    fn new() -> Self {
        Self { aio: AsyncIo::new() }
    }
}

impl AsyncIoCapable for FakeUart {
    fn async_io(&self) -> &AsyncIo {
        &self.aio
    }
}

#[test]
fn waiter_unblocks_on_the_expected_trigger() {
    let uart = Arc::new(FakeUart::new());
    let completer = uart.clone();

    let mut task = Task::new();
    task.initialize(
        move || {
            peregrine_osal::time::delay_ms(20);
            completer.signal_event(Trigger::TransferComplete);
        },
        Priority::Level2,
        0,
        "uart-isr",
    )
    .unwrap();
    task.start().unwrap();

    assert_eq!(
        uart.await_event(Trigger::TransferComplete, Duration::from_millis(500)),
        Ok(())
    );
    task.join().unwrap();
}

#[test]
fn wrong_trigger_rearms_until_timeout() {
    let uart = Arc::new(FakeUart::new());
    let completer = uart.clone();

    let mut task = Task::new();
    task.initialize(
        move || {
            peregrine_osal::time::delay_ms(10);
            completer.signal_event(Trigger::WriteComplete);
        },
        Priority::Level2,
        0,
        "uart-isr",
    )
    .unwrap();
    task.start().unwrap();

    // Waiting for a read: the write completion must not satisfy it.
    assert_eq!(
        uart.await_event(Trigger::ReadComplete, Duration::from_millis(60)),
        Err(Error::Timeout)
    );
    task.join().unwrap();
}

#[test]
fn notifier_is_released_on_success_only() {
    let uart = FakeUart::new();
    let notifier = BinarySemaphore::new();
    notifier.try_acquire();

    uart.signal_event(Trigger::ReadComplete);
    assert_eq!(
        uart.await_with_notifier(Trigger::ReadComplete, &notifier, Duration::from_millis(50)),
        Ok(())
    );
    assert!(notifier.try_acquire());

    uart.async_io().reset();
    assert_eq!(
        uart.await_with_notifier(Trigger::ReadComplete, &notifier, Duration::from_millis(20)),
        Err(Error::Timeout)
    );
    assert!(!notifier.try_acquire());
}
