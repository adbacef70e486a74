//! Wishbone Bus Interconnect.
//!
//! This module implements the Wishbone bus driven by the Etherbone bridge. It
//! routes word accesses to the device whose address range contains them.
//! Accesses that hit no device complete anyway: reads return zero and writes
//! are ignored, and the caller is told so it can count them.

use log::info;

use super::traits::WishboneSlave;
use crate::common::MsiVector;
use crate::soc::devices::MsiController;
use crate::stats::SimStats;
use crate::stream::StreamSink;

/// Address decoder over the attached Wishbone slaves.
pub struct WishboneBus {
    devices: Vec<Box<dyn WishboneSlave>>,

    last_device_idx: usize,
}

impl Default for WishboneBus {
    fn default() -> Self {
        Self::new()
    }
}

impl WishboneBus {
    /// Creates a bus with no devices attached.
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            last_device_idx: 0,
        }
    }

    /// Adds a device to the bus.
    ///
    /// Devices are kept sorted by base address.
    ///
    /// # Arguments
    ///
    /// * `dev` - The device to add to the bus
    pub fn add_device(&mut self, dev: Box<dyn WishboneSlave>) {
        let (base, size) = dev.address_range();
        info!(
            "[Wishbone] Registered device: {:<12} @ {:#010x} - {:#010x} ({} bytes)",
            dev.name(),
            base,
            base + size,
            size
        );
        self.devices.push(dev);
        self.devices.sort_by_key(|d| d.address_range().0);
        self.last_device_idx = 0;
    }

    /// Advances every device by one cycle and lets the MSI controller offer
    /// its vector.
    ///
    /// # Arguments
    ///
    /// * `msi` - Interrupt channel towards the PCIe endpoint
    /// * `stats` - Counters of the system domain
    pub fn tick<M: StreamSink<MsiVector>>(&mut self, msi: &mut M, stats: &mut SimStats) {
        for dev in self.devices.iter_mut() {
            dev.tick();
        }
        if let Some(controller) = self.find_msi() {
            controller.drive(msi, stats);
        }
    }

    /// Resets every device's state machine.
    pub fn reset(&mut self) {
        for dev in self.devices.iter_mut() {
            dev.reset();
        }
    }

    /// Returns `true` when no device has an operation in progress.
    pub fn is_idle(&self) -> bool {
        !self.devices.iter().any(|dev| dev.is_busy())
    }

    /// Helper to find the MSI controller in the device list.
    fn find_msi(&mut self) -> Option<&mut MsiController> {
        for dev in &mut self.devices {
            if let Some(msi) = dev.as_msi_mut() {
                return Some(msi);
            }
        }
        None
    }

    /// Helper to find the device mapped to a specific address.
    ///
    /// Returns a mutable reference to the device and the offset within that device.
    #[inline(always)]
    fn find_device(&mut self, addr: u64) -> Option<(&mut Box<dyn WishboneSlave>, u64)> {
        if self.last_device_idx < self.devices.len() {
            let (start, size) = self.devices[self.last_device_idx].address_range();
            if addr >= start && addr < start + size {
                return Some((&mut self.devices[self.last_device_idx], addr - start));
            }
        }

        for (i, dev) in self.devices.iter_mut().enumerate() {
            let (start, size) = dev.address_range();
            if addr >= start && addr < start + size {
                self.last_device_idx = i;
                return Some((dev, addr - start));
            }
        }
        None
    }

    /// Reads a word from the specified byte address.
    ///
    /// # Returns
    ///
    /// `None` if no device is mapped there.
    #[inline(always)]
    pub fn read_u32(&mut self, addr: u64) -> Option<u32> {
        self.find_device(addr).map(|(dev, offset)| dev.read_u32(offset))
    }

    /// Writes a word to the specified byte address.
    ///
    /// # Returns
    ///
    /// `false` if no device is mapped there.
    #[inline(always)]
    pub fn write_u32(&mut self, addr: u64, val: u32) -> bool {
        if let Some((dev, offset)) = self.find_device(addr) {
            dev.write_u32(offset, val);
            true
        } else {
            false
        }
    }

    /// Writes consecutive words starting at a byte address.
    ///
    /// A block that fits one device goes to it in a single call; a block
    /// spanning devices or unmapped space falls back to single-word writes.
    ///
    /// # Arguments
    ///
    /// * `addr` - The byte address of the first word
    /// * `data` - The words to write
    ///
    /// # Returns
    ///
    /// The number of words that hit no device.
    pub fn write_words(&mut self, addr: u64, data: &[u32]) -> usize {
        if let Some((dev, offset)) = self.find_device(addr) {
            let (_, size) = dev.address_range();
            if offset + 4 * data.len() as u64 <= size {
                dev.write_words(offset, data);
                return 0;
            }
        }
        data.iter()
            .enumerate()
            .filter(|(i, word)| !self.write_u32(addr + 4 * *i as u64, **word))
            .count()
    }
}
