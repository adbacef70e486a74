//! Stream Endpoint and Buffer Interfaces.
//!
//! Defines the two halves of the ready/valid handshake and the common
//! behaviors of the buffers that connect components. Every component in the
//! design talks to its neighbours only through these traits, so the same FSM
//! can sit behind a same-domain channel or a cross-domain FIFO.

/// The consuming side of a stream, as seen by a producer.
///
/// Mirrors a `try_send`: the producer observes `ready` and never waits on it.
pub trait StreamSink<T> {
    /// Returns `true` if a word offered this tick would be accepted.
    fn ready(&self) -> bool;

    /// Offers a word.
    ///
    /// # Returns
    ///
    /// `true` if the word was transferred. On `false` the caller still owns
    /// the obligation to re-offer the same word on a later tick.
    fn push(&mut self, item: T) -> bool;
}

/// The producing side of a stream, as seen by a consumer.
pub trait StreamSource<T> {
    /// Returns the word currently presented, if `valid` is asserted.
    fn peek(&self) -> Option<&T>;

    /// Accepts the presented word (asserts `ready` for this tick).
    fn pop(&mut self) -> Option<T>;

    /// Returns `true` if a word is presented this tick.
    fn valid(&self) -> bool {
        self.peek().is_some()
    }
}

/// Represents a bounded buffer between two components.
///
/// Buffers must support flushing (domain reset discards their contents) and
/// report their occupancy so the system can detect quiescence.
pub trait Buffer {
    /// Discards every stored word.
    fn flush(&mut self);

    /// Number of words currently stored.
    fn level(&self) -> usize;

    /// Fixed capacity chosen at construction.
    fn capacity(&self) -> usize;

    /// Checks if the buffer holds no words.
    fn is_empty(&self) -> bool {
        self.level() == 0
    }
}

/// A clocked component with a resettable state machine.
pub trait Component {
    /// Forces the component back to its initial state.
    fn reset(&mut self);

    /// Returns `true` when the component holds no in-flight packet.
    fn is_idle(&self) -> bool;
}
