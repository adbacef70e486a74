//! TLP sender (64 to 32 bit).
//!
//! Buffers 64-bit TLP beats until a whole TLP is stored, measures it, and
//! sends it as one tagged link packet. Each beat yields its lower dword and,
//! when its upper byte enables are set, its upper dword. The length
//! parameter is the number of 32-bit words produced and `last` marks the
//! final word.

use log::{debug, trace, warn};

use crate::common::constants::MIN_PAYLOAD_WORDS;
use crate::common::{PacketBeat, TlpBeat};
use crate::stats::SimStats;
use crate::stream::{Buffer, Component, StreamSink, StreamSource, SyncFifo};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SenderState {
    Idle,
    Send {
        length: u32,
        sent: u32,
        /// Next word is the upper dword of the head beat.
        upper: bool,
    },
}

#[derive(Debug)]
pub struct TlpSender {
    identifier: u8,
    fifo: SyncFifo<TlpBeat>,
    /// Whole TLPs stored in the FIFO.
    complete: usize,
    /// Discarding the rest of a TLP that overflowed the FIFO.
    dropping: bool,
    state: SenderState,
    trace: bool,
}

impl TlpSender {
    /// Creates a sender.
    ///
    /// # Arguments
    ///
    /// * `identifier` - Crossbar tag stamped on every outgoing packet
    /// * `fifo_depth` - Buffer depth in 64-bit beats
    /// * `trace` - Log every word produced
    pub fn new(identifier: u8, fifo_depth: usize, trace: bool) -> Self {
        Self {
            identifier,
            fifo: SyncFifo::new(fifo_depth),
            complete: 0,
            dropping: false,
            state: SenderState::Idle,
            trace,
        }
    }

    pub fn identifier(&self) -> u8 {
        self.identifier
    }

    /// Beats currently buffered.
    pub fn level(&self) -> usize {
        self.fifo.level()
    }

    /// Evaluates one tick.
    ///
    /// # Arguments
    ///
    /// * `input` - TLP beats from the PCIe side
    /// * `output` - Link packet beats towards the crossbar port
    /// * `stats` - Counters of the system domain
    pub fn tick<I, O>(&mut self, input: &mut I, output: &mut O, stats: &mut SimStats)
    where
        I: StreamSource<TlpBeat>,
        O: StreamSink<PacketBeat>,
    {
        self.send(output, stats);
        self.ingest(input, stats);
    }

    fn ingest<I: StreamSource<TlpBeat>>(&mut self, input: &mut I, stats: &mut SimStats) {
        if self.dropping {
            if let Some(beat) = input.pop() {
                if beat.last {
                    self.dropping = false;
                }
            }
            return;
        }
        if self.fifo.is_full() && self.complete == 0 && self.state == SenderState::Idle {
            warn!(
                "[TlpSender] TLP longer than {} beats, dropping",
                self.fifo.capacity()
            );
            stats.tlp_overflows += 1;
            self.fifo.flush();
            self.dropping = true;
            return;
        }
        if input.valid() && self.fifo.ready() {
            if let Some(beat) = input.pop() {
                stats.tlp_beats_in += 1;
                self.fifo.push(beat);
                if beat.last {
                    self.complete += 1;
                }
            }
        }
    }

    /// Number of 32-bit words the TLP at the head of the FIFO produces.
    fn head_length(&self) -> u32 {
        let mut length = 0;
        for beat in self.fifo.iter() {
            length += beat.dwords();
            if beat.last {
                break;
            }
        }
        length.max(MIN_PAYLOAD_WORDS)
    }

    fn send<O: StreamSink<PacketBeat>>(&mut self, output: &mut O, stats: &mut SimStats) {
        if self.state == SenderState::Idle {
            if self.complete == 0 {
                return;
            }
            let length = self.head_length();
            debug!(
                "[TlpSender] sending TLP dst={:#x} length={}",
                self.identifier, length
            );
            self.state = SenderState::Send {
                length,
                sent: 0,
                upper: false,
            };
        }

        let SenderState::Send {
            length,
            sent,
            upper,
        } = self.state
        else {
            return;
        };
        let Some(&beat) = self.fifo.peek() else {
            return;
        };
        let data = if upper {
            (beat.dat >> 32) as u32
        } else {
            beat.dat as u32
        };
        let last = sent + 1 == length;
        let word = PacketBeat {
            dst: self.identifier,
            length,
            data,
            last,
            error: 0,
        };
        if !output.push(word) {
            return;
        }
        if self.trace {
            trace!("[TlpSender] word {:#010x}", data);
        }

        let beat_done = upper || beat.dwords() == 1;
        if beat_done {
            self.fifo.pop();
        }
        if last {
            self.complete -= 1;
            stats.tlp_packets_sent += 1;
            self.state = SenderState::Idle;
        } else {
            self.state = SenderState::Send {
                length,
                sent: sent + 1,
                upper: !beat_done,
            };
        }
    }
}

impl Component for TlpSender {
    fn reset(&mut self) {
        self.fifo.flush();
        self.complete = 0;
        self.dropping = false;
        self.state = SenderState::Idle;
    }

    fn is_idle(&self) -> bool {
        self.state == SenderState::Idle && self.fifo.is_empty() && !self.dropping
    }
}
