//! System assembly and the Wishbone side of the bridge.
//!
//! This module wires both execution domains together and implements the
//! Wishbone bus and the devices reachable through the Etherbone bridge.

/// Domain and system assembly.
pub mod builder;

/// Wishbone devices (SRAM, MSI controller).
pub mod devices;

/// Wishbone address decoder.
pub mod interconnect;

/// Wishbone slave trait.
pub mod traits;

pub use builder::{LinkDomain, System, SystemDomain};
pub use interconnect::WishboneBus;
pub use traits::WishboneSlave;
