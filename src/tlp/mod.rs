//! TLP path between the crossbar and the PCIe core.
//!
//! This module contains the width converters that carry 64-bit TLP beats
//! over the 32-bit link packets of the crossbar, the TLP header codec, and
//! an endpoint model standing in for the PCIe core.

/// PCIe endpoint model.
pub mod endpoint;

/// TLP header and record codec.
pub mod header;

/// 32 to 64 bit converter (host to PCIe).
pub mod receiver;

/// 64 to 32 bit converter (PCIe to host).
pub mod sender;

pub use endpoint::TlpEndpoint;
pub use header::{CompletionHeader, RequestHeader, TlpHeader, TlpRecord, TLP_HEADER_DWORDS};
pub use receiver::TlpReceiver;
pub use sender::TlpSender;
