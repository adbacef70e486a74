//! USB core: framing engine and destination crossbar.
//!
//! The core sits between the PHY's cross-domain FIFOs and the user ports.
//! Inbound words are deframed by the [`Depacketizer`] and dispatched by the
//! [`Crossbar`]; outbound packets are arbitrated by the crossbar and framed
//! by the [`Packetizer`].

/// Destination crossbar and user ports.
pub mod crossbar;

/// Link word stream to packet recovery.
pub mod depacketizer;

/// Packet to link word stream framing.
pub mod packetizer;

/// Software wire codec.
pub mod wire;

pub use crossbar::{Crossbar, UserPort};
pub use depacketizer::{Depacketizer, DepacketizerState};
pub use packetizer::{Packetizer, PacketizerState};
