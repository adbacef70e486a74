//! Beat and packet types.
//!
//! A beat is one word-sized transfer on a stream. The `valid`/`ready` half of
//! the handshake lives in the stream objects (see [`crate::stream`]); the
//! types here only carry the payload and the side flags that travel with it.

use crate::common::constants::MIN_PAYLOAD_WORDS;

/// MSI vector number delivered to the PCIe endpoint.
pub type MsiVector = u8;

/// One beat of a tagged user packet on the 32-bit side of the crossbar.
///
/// The packet parameters (`dst`, `length`) ride along with every beat, so any
/// stage can look at the head beat to decide where a packet goes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PacketBeat {
    /// Destination tag used by the crossbar.
    pub dst: u8,
    /// Payload length of the packet in 32-bit words.
    pub length: u32,
    /// Payload word.
    pub data: u32,
    /// Marks the final beat of the packet.
    pub last: bool,
    /// Per-byte error flags.
    pub error: u8,
}

/// One 64-bit beat of a TLP stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TlpBeat {
    /// Two dwords; the first dword of the pair sits in bits `[31:0]`.
    pub dat: u64,
    /// Byte enables, one bit per byte of `dat`.
    pub be: u8,
    /// Marks the final beat of the TLP.
    pub last: bool,
}

impl TlpBeat {
    /// Number of 32-bit words this lane carries.
    ///
    /// A lane carries its upper dword only when some upper byte is enabled.
    /// Every lane carries at least its lower dword.
    pub fn dwords(&self) -> u32 {
        if self.be & 0xF0 != 0 {
            2
        } else {
            1
        }
    }
}

/// A complete link packet: destination tag and payload words.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkPacket {
    pub dst: u8,
    pub payload: Vec<u32>,
}

impl LinkPacket {
    pub fn new(dst: u8, payload: Vec<u32>) -> Self {
        Self { dst, payload }
    }

    /// Length field for this packet, in 32-bit words.
    pub fn length(&self) -> u32 {
        (self.payload.len() as u32).max(MIN_PAYLOAD_WORDS)
    }

    /// Splits the packet into the beats a producer offers to the crossbar.
    ///
    /// An empty payload is sent as one zero word, so the length field always
    /// matches the number of beats.
    pub fn beats(&self) -> Vec<PacketBeat> {
        let length = self.length();
        let words: Vec<u32> = if self.payload.is_empty() {
            vec![0]
        } else {
            self.payload.clone()
        };
        let count = words.len();
        words
            .into_iter()
            .enumerate()
            .map(|(i, data)| PacketBeat {
                dst: self.dst,
                length,
                data,
                last: i + 1 == count,
                error: 0,
            })
            .collect()
    }

    /// Rebuilds a packet from the beats of one packet.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_beats(beats: &[PacketBeat]) -> Option<Self> {
        let first = beats.first()?;
        Some(Self {
            dst: first.dst,
            payload: beats.iter().map(|b| b.data).collect(),
        })
    }
}
