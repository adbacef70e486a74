//! Packetizer.
//!
//! Re-frames tagged user packets into the flat link word stream. The header
//! is built from the parameters carried by the head beat; the payload then
//! passes through one word per tick. Nothing is buffered.

use log::{debug, trace};

use crate::common::{PacketBeat, HEADER_WORDS};
use crate::core::wire::header_words;
use crate::stats::SimStats;
use crate::stream::{Component, StreamSink, StreamSource};

/// Packetizer FSM state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketizerState {
    Idle,
    /// Emitting header word `n`.
    InsertHeader(usize),
    Copy,
}

#[derive(Debug)]
pub struct Packetizer {
    state: PacketizerState,
    header: [u32; HEADER_WORDS],
    trace: bool,
}

impl Packetizer {
    pub fn new(trace: bool) -> Self {
        Self {
            state: PacketizerState::Idle,
            header: [0; HEADER_WORDS],
            trace,
        }
    }

    pub fn state(&self) -> PacketizerState {
        self.state
    }

    /// Evaluates one tick.
    ///
    /// # Arguments
    ///
    /// * `input` - Packets from the crossbar master port
    /// * `output` - Link words towards the PHY
    /// * `stats` - Counters of the system domain
    pub fn tick<I, O>(&mut self, input: &mut I, output: &mut O, stats: &mut SimStats)
    where
        I: StreamSource<PacketBeat>,
        O: StreamSink<u32>,
    {
        match self.state {
            PacketizerState::Idle => {
                if let Some(beat) = input.peek() {
                    self.header = header_words(beat.dst, beat.length);
                    debug!(
                        "[Packetizer] framing packet dst={:#x} length={}",
                        beat.dst, beat.length
                    );
                    self.state = PacketizerState::InsertHeader(0);
                }
            }
            PacketizerState::InsertHeader(n) => {
                if output.push(self.header[n]) {
                    self.state = if n + 1 == HEADER_WORDS {
                        PacketizerState::Copy
                    } else {
                        PacketizerState::InsertHeader(n + 1)
                    };
                }
            }
            PacketizerState::Copy => {
                if input.valid() && output.ready() {
                    if let Some(beat) = input.pop() {
                        if self.trace {
                            trace!("[Packetizer] word {:#010x}", beat.data);
                        }
                        output.push(beat.data);
                        if beat.last {
                            stats.packets_framed += 1;
                            self.state = PacketizerState::Idle;
                        }
                    }
                }
            }
        }
    }
}

impl Component for Packetizer {
    fn reset(&mut self) {
        self.state = PacketizerState::Idle;
    }

    fn is_idle(&self) -> bool {
        self.state == PacketizerState::Idle
    }
}
