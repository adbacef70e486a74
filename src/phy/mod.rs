//! Link-side physical layer.
//!
//! This module contains the model of the external USB FIFO chip, the
//! anti-starvation timers, the Link-Bus FSM that arbitrates the half-duplex
//! bus, and the standalone loopback design.

/// Per-direction anti-starvation timer.
pub mod arbiter;

/// Link-Bus FSM and PHY.
pub mod ft245;

/// Host-side USB FIFO chip model.
pub mod host;

/// PHY loopback design.
pub mod loopback;

pub use arbiter::AntiStarvation;
pub use ft245::{BusState, LinkBus};
pub use host::HostLink;
pub use loopback::LoopbackSystem;
