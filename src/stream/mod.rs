//! Flow-controlled streams.
//!
//! This module contains the ready/valid stream interfaces, the registered
//! same-domain channel that wires components together, a private same-domain
//! FIFO, and the cross-domain FIFO used between the link and system domains.

/// Cross-domain (asynchronous) FIFO.
pub mod async_fifo;

/// Registered point-to-point word channel.
pub mod channel;

/// Same-domain FIFO with immediate visibility.
pub mod fifo;

/// Stream, buffer and component traits.
pub mod traits;

pub use async_fifo::{async_fifo, AsyncFifoReader, AsyncFifoWriter};
pub use channel::Channel;
pub use fifo::SyncFifo;
pub use traits::{Buffer, Component, StreamSink, StreamSource};
