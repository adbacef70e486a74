//! TLP receiver (32 to 64 bit).
//!
//! Pairs consecutive 32-bit words of a link packet into 64-bit TLP beats.
//! A packet ending on an odd word produces a final beat with only the lower
//! byte enables set.

use log::trace;

use crate::common::constants::{BE_FULL, BE_LOWER};
use crate::common::{PacketBeat, TlpBeat};
use crate::stats::SimStats;
use crate::stream::{Component, StreamSink, StreamSource};

#[derive(Debug)]
pub struct TlpReceiver {
    /// Lower dword waiting for its partner.
    low: Option<u32>,
    trace: bool,
}

impl TlpReceiver {
    pub fn new(trace: bool) -> Self {
        Self { low: None, trace }
    }

    /// Evaluates one tick.
    ///
    /// # Arguments
    ///
    /// * `input` - Link packet beats from the crossbar port
    /// * `output` - TLP beats towards the PCIe side
    /// * `stats` - Counters of the system domain
    pub fn tick<I, O>(&mut self, input: &mut I, output: &mut O, stats: &mut SimStats)
    where
        I: StreamSource<PacketBeat>,
        O: StreamSink<TlpBeat>,
    {
        let Some(&word) = input.peek() else {
            return;
        };

        let beat = match self.low {
            None if !word.last => {
                input.pop();
                self.low = Some(word.data);
                return;
            }
            None => TlpBeat {
                dat: u64::from(word.data),
                be: BE_LOWER,
                last: true,
            },
            Some(lo) => TlpBeat {
                dat: u64::from(lo) | (u64::from(word.data) << 32),
                be: BE_FULL,
                last: word.last,
            },
        };

        if output.push(beat) {
            input.pop();
            self.low = None;
            if self.trace {
                trace!("[TlpReceiver] beat {:#018x} be={:#04x}", beat.dat, beat.be);
            }
            stats.tlp_beats_out += 1;
            if beat.last {
                stats.tlp_packets_received += 1;
            }
        }
    }
}

impl Component for TlpReceiver {
    fn reset(&mut self) {
        self.low = None;
    }

    fn is_idle(&self) -> bool {
        self.low.is_none()
    }
}
