//! Etherbone to Wishbone bridge.
//!
//! Collects Etherbone packets from its crossbar port, performs their writes
//! and reads on the Wishbone bus, and sends read results back to the host as
//! a response packet through the same port. One packet is handled at a time:
//! the next request is only taken once the previous response has left.

use std::collections::VecDeque;

use log::{debug, warn};

use super::packet::{EtherbonePacket, EtherboneRecord, EtherboneWrites};
use crate::common::PacketBeat;
use crate::core::UserPort;
use crate::soc::WishboneBus;
use crate::stats::SimStats;
use crate::stream::{Component, StreamSink, StreamSource};

#[derive(Debug)]
pub struct EtherboneBridge {
    tag: u8,
    request: Vec<u32>,
    response: VecDeque<u32>,
    response_length: u32,
}

impl EtherboneBridge {
    /// Creates a bridge answering on crossbar tag `tag`.
    pub fn new(tag: u8) -> Self {
        Self {
            tag,
            request: Vec::new(),
            response: VecDeque::new(),
            response_length: 0,
        }
    }

    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// Evaluates one tick.
    ///
    /// # Arguments
    ///
    /// * `port` - The bridge's crossbar port
    /// * `bus` - Wishbone bus the transactions are performed on
    /// * `stats` - Counters of the system domain
    pub fn tick(&mut self, port: &mut UserPort, bus: &mut WishboneBus, stats: &mut SimStats) {
        if let Some(&data) = self.response.front() {
            let beat = PacketBeat {
                dst: self.tag,
                length: self.response_length,
                data,
                last: self.response.len() == 1,
                error: 0,
            };
            if port.sink.push(beat) {
                self.response.pop_front();
            }
            return;
        }

        if let Some(beat) = port.source.pop() {
            self.request.push(beat.data);
            if beat.last {
                let words = std::mem::take(&mut self.request);
                self.execute(&words, bus, stats);
            }
        }
    }

    fn execute(&mut self, words: &[u32], bus: &mut WishboneBus, stats: &mut SimStats) {
        let packet = match EtherbonePacket::decode(words) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("[Etherbone] {}", e);
                stats.etherbone_malformed += 1;
                return;
            }
        };

        let mut replies = Vec::new();
        for record in &packet.records {
            let writes = &record.writes;
            if !writes.data.is_empty() {
                let base = u64::from(writes.base_addr);
                debug!(
                    "[Etherbone] write {} words @ {:#010x}",
                    writes.data.len(),
                    base
                );
                let unmapped = bus.write_words(base, &writes.data);
                if unmapped > 0 {
                    warn!(
                        "[Etherbone] {} of {} writes @ {:#010x} hit unmapped addresses",
                        unmapped,
                        writes.data.len(),
                        base
                    );
                    stats.wishbone_unmapped += unmapped as u64;
                }
                stats.etherbone_writes += writes.data.len() as u64;
            }

            if record.reads.addrs.is_empty() {
                continue;
            }
            let data = record
                .reads
                .addrs
                .iter()
                .map(|&addr| {
                    let value = bus.read_u32(u64::from(addr)).unwrap_or_else(|| {
                        warn!("[Etherbone] read from unmapped address {:#010x}", addr);
                        stats.wishbone_unmapped += 1;
                        0
                    });
                    debug!("[Etherbone] read {:#010x} @ {:#010x}", value, addr);
                    stats.etherbone_reads += 1;
                    value
                })
                .collect();
            replies.push(EtherboneRecord {
                writes: EtherboneWrites {
                    base_addr: record.reads.base_ret_addr,
                    data,
                },
                ..EtherboneRecord::default()
            });
        }

        if !replies.is_empty() {
            let words = EtherbonePacket::new(replies).encode();
            self.response_length = words.len() as u32;
            self.response = words.into();
        }
    }
}

impl Component for EtherboneBridge {
    fn reset(&mut self) {
        self.request.clear();
        self.response.clear();
        self.response_length = 0;
    }

    fn is_idle(&self) -> bool {
        self.request.is_empty() && self.response.is_empty()
    }
}
