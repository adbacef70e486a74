//! Etherbone register-access path.
//!
//! This module contains the Etherbone packet codec and the bridge that turns
//! Etherbone packets from the crossbar into Wishbone transactions.

/// Etherbone to Wishbone bridge.
pub mod bridge;

/// Etherbone packet codec.
pub mod packet;

pub use bridge::EtherboneBridge;
pub use packet::{EtherbonePacket, EtherboneReads, EtherboneRecord, EtherboneWrites};
