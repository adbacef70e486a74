//! MSI Controller.
//!
//! Lets register accesses over Etherbone raise a PCIe message-signalled
//! interrupt. Three CSRs are exposed:
//!
//! * `SEND` (write) - writing a value with bit 0 set starts a send
//! * `DONE` (read)  - 1 while the controller is idle
//! * `DATA` (r/w)   - 8-bit vector number to send
//!
//! Once started, the controller offers the vector on the interrupt channel
//! every tick until it is accepted, then returns to idle.

use log::debug;

use crate::common::MsiVector;
use crate::soc::traits::WishboneSlave;
use crate::stats::SimStats;
use crate::stream::StreamSink;

/// Offset of the send strobe register.
pub const MSI_SEND: u64 = 0x0;
/// Offset of the done status register.
pub const MSI_DONE: u64 = 0x4;
/// Offset of the vector register.
pub const MSI_DATA: u64 = 0x8;

/// Bytes decoded by the controller.
pub const MSI_SIZE: u64 = 0xC;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MsiState {
    Idle,
    Send,
}

pub struct MsiController {
    base: u64,
    state: MsiState,
    data: MsiVector,
}

impl MsiController {
    pub fn new(base: u64) -> Self {
        Self {
            base,
            state: MsiState::Idle,
            data: 0,
        }
    }

    pub fn state(&self) -> MsiState {
        self.state
    }

    /// Offers the pending vector on the interrupt channel.
    pub fn drive<M: StreamSink<MsiVector>>(&mut self, msi: &mut M, stats: &mut SimStats) {
        if self.state == MsiState::Send && msi.push(self.data) {
            debug!("[MSI] sent vector {}", self.data);
            stats.msi_sent += 1;
            self.state = MsiState::Idle;
        }
    }
}

impl WishboneSlave for MsiController {
    fn name(&self) -> &str {
        "MSI"
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base, MSI_SIZE)
    }

    fn read_u32(&mut self, offset: u64) -> u32 {
        match offset & !0x3 {
            MSI_DONE => u32::from(self.state == MsiState::Idle),
            MSI_DATA => u32::from(self.data),
            _ => 0,
        }
    }

    fn write_u32(&mut self, offset: u64, val: u32) {
        match offset & !0x3 {
            MSI_SEND => {
                if val & 1 != 0 && self.state == MsiState::Idle {
                    self.state = MsiState::Send;
                }
            }
            MSI_DATA => self.data = (val & 0xFF) as MsiVector,
            _ => {}
        }
    }

    fn reset(&mut self) {
        self.state = MsiState::Idle;
    }

    fn is_busy(&self) -> bool {
        self.state == MsiState::Send
    }

    fn as_msi_mut(&mut self) -> Option<&mut MsiController> {
        Some(self)
    }
}
