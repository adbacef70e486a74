//! Wishbone devices reachable through the Etherbone bridge.

/// MSI interrupt controller.
pub mod msi;

/// Word-addressed scratch memory.
pub mod sram;

pub use msi::{MsiController, MsiState};
pub use sram::Sram;
