//! Depacketizer.
//!
//! Recovers tagged packets from the flat link word stream. Words are scanned
//! one at a time for the preamble; anything else is dropped, which
//! resynchronizes the stream after garbage or a lost frame. After the
//! preamble the two header words give the destination and the payload
//! length, then the payload is collected.
//!
//! Payloads are stored and forwarded: a packet is only offered downstream
//! once all of its words arrived, so an aborted frame never leaks a partial
//! packet. Frames longer than the configured maximum are consumed and
//! discarded.
//!
//! An idle timer bounds every state between the preamble and the last
//! payload word: after `timeout` consecutive ticks without an incoming word
//! the frame is abandoned and the FSM returns to `Idle`.

use log::{debug, trace, warn};

use crate::common::constants::{HEADER_FIELD_WORDS, MIN_PAYLOAD_WORDS, PREAMBLE};
use crate::common::PacketBeat;
use crate::config::CoreConfig;
use crate::stats::SimStats;
use crate::stream::{Component, StreamSink, StreamSource};

/// Depacketizer FSM state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepacketizerState {
    /// Scanning for the preamble.
    Idle,
    ReceiveHeader,
    /// Collecting payload words.
    Copy,
    /// Offering the collected packet downstream.
    Deliver,
    /// Consuming the payload of an oversize frame.
    Discard,
}

#[derive(Debug)]
pub struct Depacketizer {
    state: DepacketizerState,
    header: [u32; HEADER_FIELD_WORDS],
    header_count: usize,
    dst: u8,
    /// Payload length in words, never below one.
    words: u32,
    payload: Vec<u32>,
    delivered: usize,
    /// Words still to drop in `Discard`.
    discard_left: u32,
    idle_ticks: u32,
    timeout: u32,
    max_payload_words: u32,
    trace: bool,
}

impl Depacketizer {
    /// Creates a depacketizer.
    ///
    /// # Arguments
    ///
    /// * `config` - Core configuration (timeout and maximum payload length)
    /// * `trace` - Log every word taken from the link
    pub fn new(config: &CoreConfig, trace: bool) -> Self {
        Self {
            state: DepacketizerState::Idle,
            header: [0; HEADER_FIELD_WORDS],
            header_count: 0,
            dst: 0,
            words: 0,
            payload: Vec::new(),
            delivered: 0,
            discard_left: 0,
            idle_ticks: 0,
            timeout: config.depacketizer_timeout,
            max_payload_words: config.max_payload_words,
            trace,
        }
    }

    pub fn state(&self) -> DepacketizerState {
        self.state
    }

    /// Evaluates one tick.
    ///
    /// # Arguments
    ///
    /// * `input` - Link words from the PHY
    /// * `output` - Packets towards the crossbar master port
    /// * `stats` - Counters of the system domain
    pub fn tick<I, O>(&mut self, input: &mut I, output: &mut O, stats: &mut SimStats)
    where
        I: StreamSource<u32>,
        O: StreamSink<PacketBeat>,
    {
        match self.state {
            DepacketizerState::Idle => {
                if let Some(word) = input.pop() {
                    if word == PREAMBLE {
                        self.header_count = 0;
                        self.idle_ticks = 0;
                        self.state = DepacketizerState::ReceiveHeader;
                    } else {
                        if self.trace {
                            trace!("[Depacketizer] resync drop {:#010x}", word);
                        }
                        stats.resync_words_dropped += 1;
                    }
                }
            }
            DepacketizerState::ReceiveHeader => match input.pop() {
                Some(word) => {
                    self.idle_ticks = 0;
                    self.header[self.header_count] = word;
                    self.header_count += 1;
                    if self.header_count == HEADER_FIELD_WORDS {
                        self.decode_header(stats);
                    }
                }
                None => self.count_idle(stats),
            },
            DepacketizerState::Copy => match input.pop() {
                Some(word) => {
                    self.idle_ticks = 0;
                    if self.trace {
                        trace!("[Depacketizer] word {:#010x}", word);
                    }
                    self.payload.push(word);
                    if self.payload.len() == self.words as usize {
                        self.delivered = 0;
                        self.state = DepacketizerState::Deliver;
                    }
                }
                None => self.count_idle(stats),
            },
            DepacketizerState::Discard => match input.pop() {
                Some(_) => {
                    self.idle_ticks = 0;
                    self.discard_left -= 1;
                    if self.discard_left == 0 {
                        self.state = DepacketizerState::Idle;
                    }
                }
                None => self.count_idle(stats),
            },
            DepacketizerState::Deliver => {
                let last = self.delivered + 1 == self.payload.len();
                let beat = PacketBeat {
                    dst: self.dst,
                    length: self.words,
                    data: self.payload[self.delivered],
                    last,
                    error: 0,
                };
                if output.push(beat) {
                    self.delivered += 1;
                    if last {
                        stats.packets_deframed += 1;
                        self.payload.clear();
                        self.state = DepacketizerState::Idle;
                    }
                }
            }
        }
    }

    fn decode_header(&mut self, stats: &mut SimStats) {
        self.dst = (self.header[0] & 0xFF) as u8;
        self.words = self.header[1].max(MIN_PAYLOAD_WORDS);
        if self.words > self.max_payload_words {
            warn!(
                "[Depacketizer] dropping oversize packet dst={:#x} length={}",
                self.dst, self.words
            );
            stats.oversize_packets += 1;
            self.discard_left = self.words;
            self.state = DepacketizerState::Discard;
        } else {
            debug!(
                "[Depacketizer] header dst={:#x} length={}",
                self.dst, self.words
            );
            self.payload.clear();
            self.state = DepacketizerState::Copy;
        }
    }

    fn count_idle(&mut self, stats: &mut SimStats) {
        if self.timeout == 0 {
            return;
        }
        self.idle_ticks += 1;
        if self.idle_ticks >= self.timeout {
            warn!(
                "[Depacketizer] timeout in {:?}, discarding {} words",
                self.state,
                self.payload.len()
            );
            stats.depacketizer_timeouts += 1;
            self.payload.clear();
            self.idle_ticks = 0;
            self.state = DepacketizerState::Idle;
        }
    }
}

impl Component for Depacketizer {
    fn reset(&mut self) {
        self.state = DepacketizerState::Idle;
        self.header_count = 0;
        self.payload.clear();
        self.delivered = 0;
        self.discard_left = 0;
        self.idle_ticks = 0;
    }

    fn is_idle(&self) -> bool {
        self.state == DepacketizerState::Idle
    }
}
