//! USB FIFO to PCIe TLP / Etherbone Bridge Library.
//!
//! This crate implements a tick-level model of a bridge between a USB FIFO
//! link and an on-board packet interconnect carrying PCI-Express TLPs and
//! Etherbone register accesses. It recovers tagged packets from the flat
//! link word stream, routes them by destination, converts TLP beats between
//! 64 and 32 bits, and frames the replies back onto the link.
//!
//! # Architecture
//!
//! * **Link domain**: USB FIFO chip model and the Link-Bus FSM that
//!   time-slices the half-duplex bus under anti-starvation limits.
//! * **System domain**: Depacketizer, Crossbar and Packetizer, the TLP
//!   sender/receiver with a PCIe endpoint model, and the Etherbone bridge
//!   with its Wishbone devices.
//! * **Cross-domain FIFOs**: the only state the two domains share.
//!
//! # Modules
//!
//! * `common`: Beat types, wire constants, and error handling.
//! * `config`: Configuration loading and parsing.
//! * `core`: Packet framing engine and destination crossbar.
//! * `etherbone`: Etherbone codec and Wishbone bridge.
//! * `phy`: Host link model, anti-starvation timers, and the Link-Bus FSM.
//! * `sim`: Runners, host stream loader, and the built-in demo.
//! * `soc`: System assembly, Wishbone bus, and devices.
//! * `stats`: Traffic and drop counters.
//! * `stream`: Ready/valid stream traits, channels, and FIFOs.
//! * `tlp`: TLP width converters, header codec, and endpoint model.

/// Shared beat types, wire constants, and error handling.
///
/// Provides the data carried by every stream and the single error type
/// returned by setup and host-side decoding paths.
pub mod common;

/// Configuration system for link, core, TLP, and Etherbone settings.
///
/// Loads and parses TOML configuration files and rejects values that cannot
/// describe a working bridge.
pub mod config;

/// USB core: depacketizer, packetizer, crossbar, and the software wire codec.
pub mod core;

/// Etherbone register-access path.
pub mod etherbone;

/// Link-side physical layer.
///
/// Models the USB FIFO chip and arbitrates its half-duplex bus between the
/// receive and transmit directions.
pub mod phy;

/// Simulation harness, host stream loading, and execution orchestration.
pub mod sim;

/// System assembly plus the Wishbone bus and devices.
pub mod soc;

/// Traffic statistics collection and reporting.
///
/// Tracks link words, bus turnarounds, framing and routing events, and every
/// drop the data path reports instead of failing.
pub mod stats;

/// Ready/valid streams and the buffers that connect components.
pub mod stream;

/// TLP path between the crossbar and the PCIe core.
pub mod tlp;
