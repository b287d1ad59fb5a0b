//! Bounded FIFO message queue.
//!
//! Thin facade over the backend queue. Sends fail (returning the value)
//! rather than overwriting when the queue is full; receives are
//! non-blocking or bounded-blocking. The `*_from_isr` variants follow the
//! same backend policy as the semaphores: real operations under the rtos
//! backend, hard faults on the host.

use core::time::Duration;

use crate::backend;

pub struct MessageQueue<T> {
    native: backend::NativeQueue<T>,
}

impl<T> MessageQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            native: backend::NativeQueue::new(capacity),
        }
    }

    /// Enqueues without blocking; gives the value back if the queue is full.
    pub fn try_send(&self, value: T) -> Result<(), T> {
        self.native.try_send(value)
    }

    /// Enqueues, waiting at most `timeout` for a free slot.
    pub fn send(&self, value: T, timeout: Duration) -> Result<(), T> {
        self.native.send(value, timeout)
    }

    /// Dequeues without blocking.
    pub fn try_recv(&self) -> Option<T> {
        self.native.try_recv()
    }

    /// Dequeues, waiting at most `timeout` for an element.
    pub fn recv(&self, timeout: Duration) -> Option<T> {
        self.native.recv(timeout)
    }

    pub fn len(&self) -> usize {
        self.native.len()
    }

    pub fn is_empty(&self) -> bool {
        self.native.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.native.len() >= self.native.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.native.capacity()
    }

    /// ISR-safe non-blocking enqueue.
    pub fn try_send_from_isr(&self, value: T) -> Result<(), T> {
        self.native.try_send_from_isr(value)
    }

    /// ISR-safe non-blocking dequeue.
    pub fn try_recv_from_isr(&self) -> Option<T> {
        self.native.try_recv_from_isr()
    }
}
