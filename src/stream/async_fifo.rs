//! Cross-domain FIFO.
//!
//! The only object shared between the link domain and the system domain. It
//! is split into a writer half and a reader half so each domain owns exactly
//! one side and the halves can live on different threads. The queue itself is
//! a bounded `crossbeam_channel`, which provides the memory-visibility
//! guarantees the hardware got from gray-coded pointers.
//!
//! Resetting either domain never touches this FIFO: words already committed
//! by the writer stay available to the reader.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::traits::{StreamSink, StreamSource};

/// Creates a cross-domain FIFO holding at most `capacity` words.
///
/// The reader keeps the presented word outside the queue, so the queue is
/// sized one smaller and the total capacity is exactly `capacity`. Capacities
/// below two are raised to two.
pub fn async_fifo<T>(capacity: usize) -> (AsyncFifoWriter<T>, AsyncFifoReader<T>) {
    let capacity = capacity.max(2);
    let (tx, rx) = bounded(capacity - 1);
    (
        AsyncFifoWriter {
            tx,
            pushed: false,
            capacity,
        },
        AsyncFifoReader {
            rx,
            head: None,
            popped: false,
        },
    )
}

/// Write half of a cross-domain FIFO.
#[derive(Debug)]
pub struct AsyncFifoWriter<T> {
    tx: Sender<T>,
    pushed: bool,
    capacity: usize,
}

impl<T> AsyncFifoWriter<T> {
    /// Ends the writer's tick; one push is allowed per tick.
    pub fn commit(&mut self) {
        self.pushed = false;
    }

    /// Words queued but not yet presented to the reader.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> StreamSink<T> for AsyncFifoWriter<T> {
    fn ready(&self) -> bool {
        !self.pushed && !self.tx.is_full()
    }

    fn push(&mut self, item: T) -> bool {
        if self.pushed {
            return false;
        }
        match self.tx.try_send(item) {
            Ok(()) => {
                self.pushed = true;
                true
            }
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Read half of a cross-domain FIFO.
#[derive(Debug)]
pub struct AsyncFifoReader<T> {
    rx: Receiver<T>,
    /// Word presented to the consumer.
    head: Option<T>,
    popped: bool,
}

impl<T> AsyncFifoReader<T> {
    /// Ends the reader's tick and presents the next queued word, if any.
    pub fn commit(&mut self) {
        self.popped = false;
        if self.head.is_none() {
            self.head = self.rx.try_recv().ok();
        }
    }

    /// Words held by the FIFO on the reader's side, including the presented one.
    pub fn len(&self) -> usize {
        self.rx.len() + usize::from(self.head.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none() && self.rx.is_empty()
    }
}

impl<T> StreamSource<T> for AsyncFifoReader<T> {
    fn peek(&self) -> Option<&T> {
        if self.popped {
            None
        } else {
            self.head.as_ref()
        }
    }

    fn pop(&mut self) -> Option<T> {
        if self.popped {
            return None;
        }
        let item = self.head.take()?;
        self.popped = true;
        Some(item)
    }
}
