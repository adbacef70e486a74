//! Wishbone Slave Trait.
//!
//! This module defines the interface implemented by every memory-mapped
//! device behind the Etherbone bridge. It allows the Wishbone bus to decode
//! addresses and reach disparate devices uniformly.

use crate::soc::devices::MsiController;

/// Trait for 32-bit Wishbone slaves.
///
/// All devices attached to the Wishbone bus must implement this trait to
/// handle word reads and writes at specific offsets. It also provides a
/// clock hook and a downcast used to reach the MSI controller.
pub trait WishboneSlave: Send {
    /// Returns the user-friendly name of the device.
    ///
    /// Used for logging purposes.
    fn name(&self) -> &str;

    /// Returns the address range (Base Address, Size) of the device in bytes.
    ///
    /// Used by the bus to route accesses to the correct device.
    fn address_range(&self) -> (u64, u64);

    /// Reads a word from the device at the specified byte offset.
    fn read_u32(&mut self, offset: u64) -> u32;

    /// Writes a word to the device at the specified byte offset.
    fn write_u32(&mut self, offset: u64, val: u32);

    /// Writes consecutive words starting at the specified byte offset.
    ///
    /// Default implementation writes the words individually.
    fn write_words(&mut self, offset: u64, data: &[u32]) {
        for (i, word) in data.iter().enumerate() {
            self.write_u32(offset + 4 * i as u64, *word);
        }
    }

    /// Advances the device state by one clock cycle.
    fn tick(&mut self) {}

    /// Returns the device's state machine to its initial state.
    ///
    /// Storage contents are kept.
    fn reset(&mut self) {}

    /// Returns `true` while the device has an operation in progress.
    fn is_busy(&self) -> bool {
        false
    }

    /// Downcasts the device to a mutable MSI controller reference if applicable.
    ///
    /// Used by the bus to connect the controller to the interrupt channel.
    fn as_msi_mut(&mut self) -> Option<&mut MsiController> {
        None
    }
}
