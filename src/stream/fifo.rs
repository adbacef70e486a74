//! Same-domain FIFO.
//!
//! Unlike [`Channel`](super::Channel), a `SyncFifo` is private storage inside
//! a single component: pushes and pops take effect immediately. It is used
//! where a component needs to look at more than the head word, e.g. the TLP
//! sender measuring a buffered packet before framing it.

use std::collections::VecDeque;

use super::traits::{Buffer, StreamSink, StreamSource};

/// Bounded first-in first-out queue.
#[derive(Clone, Debug)]
pub struct SyncFifo<T> {
    queue: VecDeque<T>,
    depth: usize,
}

impl<T> SyncFifo<T> {
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            queue: VecDeque::with_capacity(depth),
            depth,
        }
    }

    pub fn is_full(&self) -> bool {
        self.queue.len() >= self.depth
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.queue.iter()
    }
}

impl<T> StreamSink<T> for SyncFifo<T> {
    fn ready(&self) -> bool {
        !self.is_full()
    }

    fn push(&mut self, item: T) -> bool {
        if self.is_full() {
            return false;
        }
        self.queue.push_back(item);
        true
    }
}

impl<T> StreamSource<T> for SyncFifo<T> {
    fn peek(&self) -> Option<&T> {
        self.queue.front()
    }

    fn pop(&mut self) -> Option<T> {
        self.queue.pop_front()
    }
}

impl<T> Buffer for SyncFifo<T> {
    fn flush(&mut self) {
        self.queue.clear();
    }

    fn level(&self) -> usize {
        self.queue.len()
    }

    fn capacity(&self) -> usize {
        self.depth
    }
}
