//! TLP header codec.
//!
//! Encodes and decodes the 3-dword headers of the TLP kinds the bridge
//! exchanges with the host: 32-bit memory reads and writes, and completions
//! with or without data. Field positions follow the PCIe base layout:
//!
//! ```text
//! dw0  [30:29] fmt  [28:24] type  [9:0] length
//! request     dw1  [31:16] requester id  [15:8] tag  [7:4] last BE  [3:0] first BE
//!             dw2  [31:2]  address
//! completion  dw1  [31:16] completer id  [15:13] status  [12] BCM  [11:0] byte count
//!             dw2  [31:16] requester id  [15:8] tag  [6:0] lower address
//! ```

use crate::common::constants::{BE_FULL, BE_LOWER};
use crate::common::{BridgeError, TlpBeat};

/// Dwords in every header this codec handles.
pub const TLP_HEADER_DWORDS: usize = 3;

const FMT_NO_DATA: u32 = 0b00;
const FMT_WITH_DATA: u32 = 0b10;
const TYPE_MEM: u32 = 0b0_0000;
const TYPE_CPL: u32 = 0b0_1010;

const LENGTH_MASK: u32 = 0x3FF;

/// Fields of a memory request header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestHeader {
    /// Payload length in dwords; 0 encodes 1024.
    pub length: u16,
    pub requester_id: u16,
    pub tag: u8,
    pub first_be: u8,
    pub last_be: u8,
    /// Byte address; the two low bits are always clear.
    pub address: u32,
}

/// Fields of a completion header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompletionHeader {
    pub length: u16,
    pub completer_id: u16,
    pub status: u8,
    pub bcm: bool,
    pub byte_count: u16,
    pub requester_id: u16,
    pub tag: u8,
    pub lower_address: u8,
}

/// A decoded TLP header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TlpHeader {
    MemRead32(RequestHeader),
    MemWrite32(RequestHeader),
    Completion(CompletionHeader),
    CompletionWithData(CompletionHeader),
}

impl TlpHeader {
    /// Short mnemonic used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            TlpHeader::MemRead32(_) => "RD32",
            TlpHeader::MemWrite32(_) => "WR32",
            TlpHeader::Completion(_) => "CPL",
            TlpHeader::CompletionWithData(_) => "CPLD",
        }
    }

    fn fmt_type(&self) -> (u32, u32) {
        match self {
            TlpHeader::MemRead32(_) => (FMT_NO_DATA, TYPE_MEM),
            TlpHeader::MemWrite32(_) => (FMT_WITH_DATA, TYPE_MEM),
            TlpHeader::Completion(_) => (FMT_NO_DATA, TYPE_CPL),
            TlpHeader::CompletionWithData(_) => (FMT_WITH_DATA, TYPE_CPL),
        }
    }

    /// Length field in dwords, as encoded.
    pub fn length(&self) -> u16 {
        match self {
            TlpHeader::MemRead32(h) | TlpHeader::MemWrite32(h) => h.length,
            TlpHeader::Completion(h) | TlpHeader::CompletionWithData(h) => h.length,
        }
    }

    /// Data dwords that follow this header.
    pub fn data_dwords(&self) -> usize {
        match self {
            TlpHeader::MemWrite32(_) | TlpHeader::CompletionWithData(_) => {
                let length = usize::from(self.length()) & LENGTH_MASK as usize;
                if length == 0 {
                    1024
                } else {
                    length
                }
            }
            TlpHeader::MemRead32(_) | TlpHeader::Completion(_) => 0,
        }
    }

    /// Encodes the header into its three dwords.
    pub fn encode(&self) -> [u32; TLP_HEADER_DWORDS] {
        let (fmt, ty) = self.fmt_type();
        let dw0 = (fmt << 29) | (ty << 24) | (u32::from(self.length()) & LENGTH_MASK);
        match self {
            TlpHeader::MemRead32(h) | TlpHeader::MemWrite32(h) => [
                dw0,
                (u32::from(h.requester_id) << 16)
                    | (u32::from(h.tag) << 8)
                    | (u32::from(h.last_be & 0xF) << 4)
                    | u32::from(h.first_be & 0xF),
                h.address & !0x3,
            ],
            TlpHeader::Completion(h) | TlpHeader::CompletionWithData(h) => [
                dw0,
                (u32::from(h.completer_id) << 16)
                    | (u32::from(h.status & 0x7) << 13)
                    | (u32::from(h.bcm) << 12)
                    | (u32::from(h.byte_count) & 0xFFF),
                (u32::from(h.requester_id) << 16)
                    | (u32::from(h.tag) << 8)
                    | (u32::from(h.lower_address) & 0x7F),
            ],
        }
    }

    /// Decodes a header from the start of `dwords`.
    ///
    /// # Returns
    ///
    /// [`BridgeError::MalformedTlp`] when fewer than three dwords are given
    /// or the fmt/type pair is not one of the supported kinds.
    pub fn decode(dwords: &[u32]) -> Result<Self, BridgeError> {
        if dwords.len() < TLP_HEADER_DWORDS {
            return Err(BridgeError::MalformedTlp(format!(
                "header needs {} dwords, got {}",
                TLP_HEADER_DWORDS,
                dwords.len()
            )));
        }
        let (dw0, dw1, dw2) = (dwords[0], dwords[1], dwords[2]);
        let fmt = (dw0 >> 29) & 0x3;
        let ty = (dw0 >> 24) & 0x1F;
        let length = (dw0 & LENGTH_MASK) as u16;

        let request = || RequestHeader {
            length,
            requester_id: (dw1 >> 16) as u16,
            tag: (dw1 >> 8) as u8,
            last_be: ((dw1 >> 4) & 0xF) as u8,
            first_be: (dw1 & 0xF) as u8,
            address: dw2 & !0x3,
        };
        let completion = || CompletionHeader {
            length,
            completer_id: (dw1 >> 16) as u16,
            status: ((dw1 >> 13) & 0x7) as u8,
            bcm: (dw1 >> 12) & 0x1 != 0,
            byte_count: (dw1 & 0xFFF) as u16,
            requester_id: (dw2 >> 16) as u16,
            tag: (dw2 >> 8) as u8,
            lower_address: (dw2 & 0x7F) as u8,
        };

        match (fmt, ty) {
            (FMT_NO_DATA, TYPE_MEM) => Ok(TlpHeader::MemRead32(request())),
            (FMT_WITH_DATA, TYPE_MEM) => Ok(TlpHeader::MemWrite32(request())),
            (FMT_NO_DATA, TYPE_CPL) => Ok(TlpHeader::Completion(completion())),
            (FMT_WITH_DATA, TYPE_CPL) => Ok(TlpHeader::CompletionWithData(completion())),
            _ => Err(BridgeError::MalformedTlp(format!(
                "unsupported fmt={:#b} type={:#07b}",
                fmt, ty
            ))),
        }
    }
}

/// A complete TLP: header plus data dwords.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlpRecord {
    pub header: TlpHeader,
    pub data: Vec<u32>,
}

impl TlpRecord {
    pub fn new(header: TlpHeader, data: Vec<u32>) -> Self {
        Self { header, data }
    }

    /// Builds a single-dword memory read request.
    pub fn mem_read32(requester_id: u16, tag: u8, address: u32) -> Self {
        Self::new(
            TlpHeader::MemRead32(RequestHeader {
                length: 1,
                requester_id,
                tag,
                first_be: 0xF,
                last_be: 0,
                address,
            }),
            Vec::new(),
        )
    }

    /// Builds a memory write request carrying `data`.
    pub fn mem_write32(requester_id: u16, tag: u8, address: u32, data: Vec<u32>) -> Self {
        let length = (data.len() as u32 & LENGTH_MASK) as u16;
        Self::new(
            TlpHeader::MemWrite32(RequestHeader {
                length,
                requester_id,
                tag,
                first_be: 0xF,
                last_be: if data.len() > 1 { 0xF } else { 0 },
                address,
            }),
            data,
        )
    }

    /// Header and data dwords in transmission order.
    pub fn to_dwords(&self) -> Vec<u32> {
        let mut dwords = self.header.encode().to_vec();
        dwords.extend_from_slice(&self.data);
        dwords
    }

    /// Decodes one TLP from an exact dword sequence.
    pub fn from_dwords(dwords: &[u32]) -> Result<Self, BridgeError> {
        let header = TlpHeader::decode(dwords)?;
        let expected = TLP_HEADER_DWORDS + header.data_dwords();
        if dwords.len() != expected {
            return Err(BridgeError::MalformedTlp(format!(
                "{} expects {} dwords, got {}",
                header.name(),
                expected,
                dwords.len()
            )));
        }
        Ok(Self::new(header, dwords[TLP_HEADER_DWORDS..].to_vec()))
    }

    /// Packs the dwords into 64-bit beats, first dword of a pair in the low
    /// half. A lone final dword only enables the lower four bytes.
    pub fn to_beats(&self) -> Vec<TlpBeat> {
        let dwords = self.to_dwords();
        let count = dwords.chunks(2).len();
        dwords
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| {
                let lo = u64::from(pair[0]);
                let (dat, be) = match pair.get(1) {
                    Some(&hi) => (lo | (u64::from(hi) << 32), BE_FULL),
                    None => (lo, BE_LOWER),
                };
                TlpBeat {
                    dat,
                    be,
                    last: i + 1 == count,
                }
            })
            .collect()
    }

    /// Reassembles a TLP from its beats, honoring the byte enables.
    pub fn from_beats(beats: &[TlpBeat]) -> Result<Self, BridgeError> {
        let mut dwords = Vec::with_capacity(beats.len() * 2);
        for beat in beats {
            dwords.push(beat.dat as u32);
            if beat.dwords() == 2 {
                dwords.push((beat.dat >> 32) as u32);
            }
        }
        Self::from_dwords(&dwords)
    }
}
