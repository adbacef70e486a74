//! Host-side USB FIFO chip model.
//!
//! Stands in for the FT245/FT601 chip and the host software behind it. The
//! chip exposes two bounded queues to the device: host-to-device words signal
//! "data available" (`rxf`) and device-to-host space signals "space available"
//! (`txe`). Host software pushes and drains the queues through the byte and
//! word helpers.

use std::collections::VecDeque;

/// Bounded bidirectional word queue modelling the USB FIFO chip.
#[derive(Clone, Debug)]
pub struct HostLink {
    to_device: VecDeque<u32>,
    from_device: VecDeque<u32>,
    capacity: usize,
    /// Host stopped draining; `txe` stays deasserted.
    tx_paused: bool,
}

impl HostLink {
    /// Creates a link whose queues each hold `capacity` words.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Depth of each direction in 32-bit words (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            to_device: VecDeque::with_capacity(capacity),
            from_device: VecDeque::with_capacity(capacity),
            capacity,
            tx_paused: false,
        }
    }

    /// Data available for the device to read.
    #[inline]
    pub fn rxf(&self) -> bool {
        !self.to_device.is_empty()
    }

    /// Space available for the device to write.
    #[inline]
    pub fn txe(&self) -> bool {
        !self.tx_paused && self.from_device.len() < self.capacity
    }

    /// Device-side read of the next host word.
    pub fn device_read(&mut self) -> Option<u32> {
        self.to_device.pop_front()
    }

    /// Device-side write of one word towards the host.
    ///
    /// # Returns
    ///
    /// `false` when the chip has no space; the word is not stored.
    pub fn device_write(&mut self, word: u32) -> bool {
        if !self.txe() {
            return false;
        }
        self.from_device.push_back(word);
        true
    }

    /// Queues words for the device.
    ///
    /// # Returns
    ///
    /// The number of words accepted; words past the free space are refused.
    pub fn write_words(&mut self, words: &[u32]) -> usize {
        let free = self.capacity - self.to_device.len();
        let accepted = words.len().min(free);
        self.to_device.extend(&words[..accepted]);
        accepted
    }

    /// Queues a host byte stream for the device.
    ///
    /// Bytes are packed into big-endian words; a trailing partial word is
    /// zero-padded.
    ///
    /// # Returns
    ///
    /// The number of words accepted.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        let words: Vec<u32> = bytes
            .chunks(4)
            .map(|chunk| {
                let mut word = [0u8; 4];
                word[..chunk.len()].copy_from_slice(chunk);
                u32::from_be_bytes(word)
            })
            .collect();
        self.write_words(&words)
    }

    /// Drains every word the device has sent.
    pub fn read_words(&mut self) -> Vec<u32> {
        self.from_device.drain(..).collect()
    }

    /// Drains every word the device has sent, as big-endian bytes.
    pub fn read_bytes(&mut self) -> Vec<u8> {
        self.read_words()
            .into_iter()
            .flat_map(u32::to_be_bytes)
            .collect()
    }

    /// Stops or resumes host-side draining of the device-to-host queue.
    pub fn set_tx_paused(&mut self, paused: bool) {
        self.tx_paused = paused;
    }

    /// Words queued for the device and not yet read.
    pub fn pending_to_device(&self) -> usize {
        self.to_device.len()
    }

    /// Words sent by the device and not yet drained by the host.
    pub fn pending_from_device(&self) -> usize {
        self.from_device.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
