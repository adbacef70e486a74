//! Bridge error type.
//!
//! Only setup and host-side decoding paths return errors. The steady-state
//! data path never fails: malformed traffic is resynchronized or dropped and
//! counted in [`SimStats`](crate::stats::SimStats).

use thiserror::Error;

/// Errors raised while configuring the bridge or decoding host-side records.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A crossbar port was registered twice for the same destination tag.
    #[error("destination {0:#x} already assigned")]
    DuplicatePort(u8),

    /// A port was registered after traffic started flowing.
    #[error("cannot register destination {0:#x}: crossbar already sealed")]
    PortsSealed(u8),

    /// A component referenced a destination tag with no registered port.
    #[error("no port registered for destination {0:#x}")]
    UnknownPort(u8),

    /// Configuration values that cannot describe a working system.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The TOML configuration could not be parsed.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// File access failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A dword sequence is not a TLP this bridge understands.
    #[error("malformed TLP: {0}")]
    MalformedTlp(String),

    /// A bounded run ended with traffic still in flight.
    #[error("simulation still busy after {0} ticks")]
    NotIdle(u64),

    /// A word sequence is not a valid Etherbone packet.
    #[error("malformed Etherbone packet: {0}")]
    MalformedEtherbone(String),
}
