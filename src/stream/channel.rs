//! Link word channel.
//!
//! A `Channel` is the registered point-to-point connection between two
//! components in the same domain. Words pushed during a tick become visible
//! to the consumer only after [`Channel::commit`] runs at the tick boundary,
//! and a slot freed by a pop is only reusable after the same boundary. This
//! makes the outcome of a tick independent of the order in which components
//! are evaluated.

use std::collections::VecDeque;

use super::traits::{Buffer, StreamSink, StreamSource};

/// Bounded, registered, single-producer/single-consumer word channel.
#[derive(Clone, Debug)]
pub struct Channel<T> {
    queue: VecDeque<T>,
    /// Word accepted this tick, committed at the tick boundary.
    staged: Option<T>,
    /// Whether the consumer already took a word this tick.
    popped: bool,
    capacity: usize,
}

impl<T> Channel<T> {
    /// Creates a channel holding at most `capacity` words.
    ///
    /// A capacity of zero is raised to one; a channel always has a slot.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: VecDeque::with_capacity(capacity),
            staged: None,
            popped: false,
            capacity,
        }
    }

    /// Applies this tick's transfers.
    ///
    /// Must be called exactly once per tick, after every component of the
    /// domain has been evaluated.
    pub fn commit(&mut self) {
        if let Some(item) = self.staged.take() {
            self.queue.push_back(item);
        }
        self.popped = false;
    }

    /// Iterates over the committed words, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.queue.iter()
    }
}

impl<T> StreamSink<T> for Channel<T> {
    #[inline]
    fn ready(&self) -> bool {
        self.staged.is_none() && self.queue.len() + usize::from(self.popped) < self.capacity
    }

    #[inline]
    fn push(&mut self, item: T) -> bool {
        if !self.ready() {
            return false;
        }
        self.staged = Some(item);
        true
    }
}

impl<T> StreamSource<T> for Channel<T> {
    #[inline]
    fn peek(&self) -> Option<&T> {
        if self.popped {
            None
        } else {
            self.queue.front()
        }
    }

    #[inline]
    fn pop(&mut self) -> Option<T> {
        if self.popped {
            return None;
        }
        let item = self.queue.pop_front()?;
        self.popped = true;
        Some(item)
    }
}

impl<T> Buffer for Channel<T> {
    fn flush(&mut self) {
        self.queue.clear();
        self.staged = None;
        self.popped = false;
    }

    fn level(&self) -> usize {
        self.queue.len() + usize::from(self.staged.is_some())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
