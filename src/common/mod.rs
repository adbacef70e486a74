//! Common types used throughout the bridge model.
//!
//! This module provides the beat types that travel over every stream in the
//! design, the wire-level constants of the link framing, and the crate error
//! type shared by all setup paths.

/// Wire-level constants (preamble, header geometry, byte-enable masks).
pub mod constants;

/// Error types for configuration and setup failures.
pub mod error;

/// Beat and packet types carried by the streams.
pub mod word;

pub use constants::{HEADER_WORDS, PREAMBLE};
pub use error::BridgeError;
pub use word::{LinkPacket, MsiVector, PacketBeat, TlpBeat};
