//! On-chip SRAM.
//!
//! Word-addressed scratch memory used to check Etherbone reads and writes
//! end to end.

use crate::soc::traits::WishboneSlave;

pub struct Sram {
    base: u64,
    words: Vec<u32>,
}

impl Sram {
    /// Creates a zeroed SRAM.
    ///
    /// # Arguments
    ///
    /// * `base` - Base byte address
    /// * `size` - Size in bytes, a multiple of four
    pub fn new(base: u64, size: u64) -> Self {
        Self {
            base,
            words: vec![0; (size / 4) as usize],
        }
    }
}

impl WishboneSlave for Sram {
    fn name(&self) -> &str {
        "SRAM"
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base, self.words.len() as u64 * 4)
    }

    fn read_u32(&mut self, offset: u64) -> u32 {
        self.words.get((offset / 4) as usize).copied().unwrap_or(0)
    }

    fn write_u32(&mut self, offset: u64, val: u32) {
        if let Some(word) = self.words.get_mut((offset / 4) as usize) {
            *word = val;
        }
    }

    fn write_words(&mut self, offset: u64, data: &[u32]) {
        let start = (offset / 4) as usize;
        let end = (start + data.len()).min(self.words.len());
        if start < end {
            self.words[start..end].copy_from_slice(&data[..end - start]);
        }
    }
}
