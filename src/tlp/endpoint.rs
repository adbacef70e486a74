//! PCIe endpoint model.
//!
//! Stands in for the PCIe core on the far side of the TLP sender and
//! receiver. It collects the TLPs the host injects, keeps a sparse dword
//! memory that memory writes land in, answers memory reads with a completion
//! when auto-completion is on, records MSI vectors, and sources any TLPs
//! queued with [`TlpEndpoint::inject`] back towards the host.

use std::collections::{HashMap, VecDeque};

use log::{debug, warn};

use super::header::{CompletionHeader, RequestHeader, TlpHeader, TlpRecord};
use crate::common::{MsiVector, TlpBeat};
use crate::config::TlpConfig;
use crate::stats::SimStats;
use crate::stream::{Component, StreamSink, StreamSource};

const CPL_STATUS_SUCCESS: u8 = 0;

/// Most recent TLPs and MSI vectors kept for inspection.
pub const HISTORY_LIMIT: usize = 1024;

#[derive(Debug)]
pub struct TlpEndpoint {
    inbound: Vec<TlpBeat>,
    outbound: VecDeque<TlpBeat>,
    memory: HashMap<u32, u32>,
    received: Vec<TlpRecord>,
    msis: Vec<MsiVector>,
    auto_complete: bool,
    completer_id: u16,
}

impl TlpEndpoint {
    pub fn new(config: &TlpConfig) -> Self {
        Self {
            inbound: Vec::new(),
            outbound: VecDeque::new(),
            memory: HashMap::new(),
            received: Vec::new(),
            msis: Vec::new(),
            auto_complete: config.auto_complete,
            completer_id: config.completer_id,
        }
    }

    /// Queues a TLP to be sent towards the host.
    pub fn inject(&mut self, record: &TlpRecord) {
        debug!("[Endpoint] injecting {}", record.header.name());
        self.outbound.extend(record.to_beats());
    }

    /// TLPs received from the host, at most the last [`HISTORY_LIMIT`].
    pub fn received(&self) -> &[TlpRecord] {
        &self.received
    }

    pub fn take_received(&mut self) -> Vec<TlpRecord> {
        std::mem::take(&mut self.received)
    }

    /// MSI vectors delivered, at most the last [`HISTORY_LIMIT`].
    pub fn msis(&self) -> &[MsiVector] {
        &self.msis
    }

    pub fn take_msis(&mut self) -> Vec<MsiVector> {
        std::mem::take(&mut self.msis)
    }

    pub fn read_mem(&self, address: u32) -> u32 {
        self.memory.get(&(address & !0x3)).copied().unwrap_or(0)
    }

    pub fn write_mem(&mut self, address: u32, value: u32) {
        self.memory.insert(address & !0x3, value);
    }

    /// Evaluates one tick.
    ///
    /// # Arguments
    ///
    /// * `down` - TLP beats from the receiver (host to PCIe)
    /// * `up` - TLP beats towards the sender (PCIe to host)
    /// * `msi` - Interrupt vectors from the MSI controller
    /// * `stats` - Counters of the system domain
    pub fn tick<D, U, M>(&mut self, down: &mut D, up: &mut U, msi: &mut M, stats: &mut SimStats)
    where
        D: StreamSource<TlpBeat>,
        U: StreamSink<TlpBeat>,
        M: StreamSource<MsiVector>,
    {
        if let Some(&beat) = self.outbound.front() {
            if up.push(beat) {
                self.outbound.pop_front();
            }
        }

        if let Some(beat) = down.pop() {
            self.inbound.push(beat);
            if beat.last {
                let beats = std::mem::take(&mut self.inbound);
                match TlpRecord::from_beats(&beats) {
                    Ok(record) => self.handle(record),
                    Err(e) => {
                        warn!("[Endpoint] {}", e);
                        stats.tlp_malformed += 1;
                    }
                }
            }
        }

        if let Some(vector) = msi.pop() {
            debug!("[Endpoint] MSI vector {}", vector);
            push_bounded(&mut self.msis, vector);
        }
    }

    fn handle(&mut self, record: TlpRecord) {
        debug!("[Endpoint] received {}", record.header.name());
        match record.header {
            TlpHeader::MemWrite32(h) => {
                for (i, &value) in record.data.iter().enumerate() {
                    self.write_mem(h.address.wrapping_add(4 * i as u32), value);
                }
            }
            TlpHeader::MemRead32(h) if self.auto_complete => {
                let completion = self.complete(&h);
                self.inject(&completion);
            }
            _ => {}
        }
        push_bounded(&mut self.received, record);
    }

    fn complete(&self, request: &RequestHeader) -> TlpRecord {
        let dwords = match usize::from(request.length) & 0x3FF {
            0 => 1024,
            n => n,
        };
        let data: Vec<u32> = (0..dwords)
            .map(|i| self.read_mem(request.address.wrapping_add(4 * i as u32)))
            .collect();
        TlpRecord::new(
            TlpHeader::CompletionWithData(CompletionHeader {
                length: request.length,
                completer_id: self.completer_id,
                status: CPL_STATUS_SUCCESS,
                bcm: false,
                byte_count: ((dwords * 4) & 0xFFF) as u16,
                requester_id: request.requester_id,
                tag: request.tag,
                lower_address: (request.address & 0x7F) as u8,
            }),
            data,
        )
    }
}

/// Appends to a history, dropping the oldest entry once it is full.
fn push_bounded<T>(history: &mut Vec<T>, item: T) {
    if history.len() >= HISTORY_LIMIT {
        history.remove(0);
    }
    history.push(item);
}

impl Component for TlpEndpoint {
    fn reset(&mut self) {
        self.inbound.clear();
        self.outbound.clear();
    }

    fn is_idle(&self) -> bool {
        self.inbound.is_empty() && self.outbound.is_empty()
    }
}
