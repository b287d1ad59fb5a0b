//! A minimal driver built from the composition mixins: a lockable,
//! event-signalling "SPI controller" shared between an application thread
//! and a completion thread standing in for the transfer interrupt.

use std::sync::Arc;
use std::time::Duration;

use peregrine_osal::asyncio::{AsyncIo, AsyncIoCapable};
use peregrine_osal::lockable::Lockable;
use peregrine_osal::mutex::RecursiveTimedMutex;
use peregrine_osal::thread::{Priority, Task};
use peregrine_osal::Trigger;

struct SpiController {
    mutex: RecursiveTimedMutex,
    aio: AsyncIo,
}

impl SpiController {
    fn new() -> Self {
        Self {
            mutex: RecursiveTimedMutex::new(),
            aio: AsyncIo::new(),
        }
    }

    fn start_transfer(&self, bytes: &[u8]) {
        self.lock();
        self.aio.reset();
        println!("transfer of {} bytes started", bytes.len());
    }

    fn finish_transfer(&self) {
        self.unlock();
    }
}

impl Lockable for SpiController {
    fn class_mutex(&self) -> &RecursiveTimedMutex {
        &self.mutex
    }
}

impl AsyncIoCapable for SpiController {
    fn async_io(&self) -> &AsyncIo {
        &self.aio
    }
}

fn main() {
    let spi = Arc::new(SpiController::new());
    let completer = spi.clone();

    let mut dma_done = Task::new();
    dma_done
        .initialize(
            move || {
                peregrine_osal::time::delay_ms(50);
                completer.signal_event(Trigger::TransferComplete);
            },
            Priority::Level4,
            0,
            "dma-complete",
        )
        .expect("task configuration");
    dma_done.start().expect("task start");

    spi.start_transfer(&[0xAA, 0x55, 0x0F]);
    match spi.await_event(Trigger::TransferComplete, Duration::from_millis(500)) {
        Ok(()) => println!("transfer complete"),
        Err(err) => println!("transfer failed: {err}"),
    }
    spi.finish_transfer();

    dma_done.join().expect("task join");
}
