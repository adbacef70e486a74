//! Etherbone packet codec.
//!
//! Etherbone carries Wishbone transactions as packets of big-endian 32-bit
//! words:
//!
//! ```text
//! word 0  magic 0x4e6f | version 1 | flags | addr size 4 | port size 4
//! word 1  padding
//! then per record:
//!   header  flags | byte enable | wcount | rcount
//!   writes  base address, wcount data words        (if wcount != 0)
//!   reads   return base address, rcount addresses  (if rcount != 0)
//! ```
//!
//! A read is answered with a record whose write section targets the return
//! base address and carries the read values.

use crate::common::BridgeError;

pub const ETHERBONE_MAGIC: u32 = 0x4e6f;
pub const ETHERBONE_VERSION: u32 = 1;
/// Address and port widths, both 32-bit.
const SIZES: u32 = 0x44;
const HEADER_WORDS: usize = 2;
const DEFAULT_BYTE_ENABLE: u8 = 0x0f;

/// Write section of a record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EtherboneWrites {
    pub base_addr: u32,
    pub data: Vec<u32>,
}

/// Read section of a record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EtherboneReads {
    pub base_ret_addr: u32,
    pub addrs: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EtherboneRecord {
    pub flags: u8,
    pub byte_enable: u8,
    pub writes: EtherboneWrites,
    pub reads: EtherboneReads,
}

impl Default for EtherboneRecord {
    fn default() -> Self {
        Self {
            flags: 0,
            byte_enable: DEFAULT_BYTE_ENABLE,
            writes: EtherboneWrites::default(),
            reads: EtherboneReads::default(),
        }
    }
}

impl EtherboneRecord {
    /// Record writing `data` to consecutive words from `base_addr`.
    pub fn write(base_addr: u32, data: Vec<u32>) -> Self {
        Self {
            writes: EtherboneWrites { base_addr, data },
            ..Self::default()
        }
    }

    /// Record reading each of `addrs`.
    pub fn read(addrs: Vec<u32>) -> Self {
        Self {
            reads: EtherboneReads {
                base_ret_addr: 0,
                addrs,
            },
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EtherbonePacket {
    pub flags: u8,
    pub records: Vec<EtherboneRecord>,
}

impl EtherbonePacket {
    pub fn new(records: Vec<EtherboneRecord>) -> Self {
        Self { flags: 0, records }
    }

    /// Encodes the packet into words.
    pub fn encode(&self) -> Vec<u32> {
        let mut words = vec![
            (ETHERBONE_MAGIC << 16)
                | (ETHERBONE_VERSION << 12)
                | (u32::from(self.flags & 0xF) << 8)
                | SIZES,
            0,
        ];
        for record in &self.records {
            let wcount = record.writes.data.len() as u32 & 0xFF;
            let rcount = record.reads.addrs.len() as u32 & 0xFF;
            words.push(
                (u32::from(record.flags) << 24)
                    | (u32::from(record.byte_enable) << 16)
                    | (wcount << 8)
                    | rcount,
            );
            if wcount != 0 {
                words.push(record.writes.base_addr);
                words.extend(record.writes.data.iter().take(wcount as usize));
            }
            if rcount != 0 {
                words.push(record.reads.base_ret_addr);
                words.extend(record.reads.addrs.iter().take(rcount as usize));
            }
        }
        words
    }

    /// Decodes a packet.
    ///
    /// # Returns
    ///
    /// [`BridgeError::MalformedEtherbone`] on a bad magic, unsupported sizes,
    /// or a record running past the end of `words`.
    pub fn decode(words: &[u32]) -> Result<Self, BridgeError> {
        if words.len() < HEADER_WORDS {
            return Err(BridgeError::MalformedEtherbone(format!(
                "{} words is shorter than the header",
                words.len()
            )));
        }
        let header = words[0];
        if header >> 16 != ETHERBONE_MAGIC {
            return Err(BridgeError::MalformedEtherbone(format!(
                "bad magic {:#06x}",
                header >> 16
            )));
        }
        if header & 0xFF != SIZES {
            return Err(BridgeError::MalformedEtherbone(format!(
                "unsupported address/port sizes {:#04x}",
                header & 0xFF
            )));
        }
        let flags = ((header >> 8) & 0xF) as u8;

        let mut records = Vec::new();
        let mut rest = &words[HEADER_WORDS..];
        while let Some((&record_header, tail)) = rest.split_first() {
            let wcount = ((record_header >> 8) & 0xFF) as usize;
            let rcount = (record_header & 0xFF) as usize;
            let mut record = EtherboneRecord {
                flags: (record_header >> 24) as u8,
                byte_enable: (record_header >> 16) as u8,
                ..EtherboneRecord::default()
            };
            rest = tail;
            if wcount != 0 {
                let (section, tail) = take_section(rest, wcount)?;
                record.writes = EtherboneWrites {
                    base_addr: section[0],
                    data: section[1..].to_vec(),
                };
                rest = tail;
            }
            if rcount != 0 {
                let (section, tail) = take_section(rest, rcount)?;
                record.reads = EtherboneReads {
                    base_ret_addr: section[0],
                    addrs: section[1..].to_vec(),
                };
                rest = tail;
            }
            records.push(record);
        }
        Ok(Self { flags, records })
    }
}

/// Splits off a base address plus `count` words.
fn take_section(words: &[u32], count: usize) -> Result<(&[u32], &[u32]), BridgeError> {
    if words.len() < count + 1 {
        return Err(BridgeError::MalformedEtherbone(format!(
            "record needs {} words, {} left",
            count + 1,
            words.len()
        )));
    }
    Ok(words.split_at(count + 1))
}
