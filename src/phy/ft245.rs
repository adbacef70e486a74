//! Link-Bus FSM for a synchronous FT245-style FIFO interface.
//!
//! The chip shares one half-duplex data bus between reading host words and
//! writing device words. The FSM time-slices it into receive and transmit
//! windows separated by one-tick turnaround states, and uses one
//! [`AntiStarvation`] timer per direction to bound how long a window can be
//! held while the other direction has pending work.

use log::{debug, trace};

use super::arbiter::AntiStarvation;
use super::host::HostLink;
use crate::config::LinkConfig;
use crate::stats::SimStats;
use crate::stream::{async_fifo, AsyncFifoReader, AsyncFifoWriter, StreamSink, StreamSource};

/// Bus ownership state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusState {
    /// Device reads host words.
    Receive,
    /// One-tick turnaround before transmitting.
    ReceiveToTransmit,
    /// Device writes words to the host.
    Transmit,
    /// One-tick turnaround before receiving.
    TransmitToReceive,
}

/// Link-domain PHY: bus arbitration plus the link-side halves of both
/// cross-domain FIFOs.
#[derive(Debug)]
pub struct LinkBus {
    state: BusState,
    read_timer: AntiStarvation,
    write_timer: AntiStarvation,
    /// Host to system (written here).
    read_fifo: AsyncFifoWriter<u32>,
    /// System to host (read here).
    write_fifo: AsyncFifoReader<u32>,
    /// Consecutive ticks the current window was held while the other
    /// direction had pending work.
    dwell: u64,
    trace: bool,
}

impl LinkBus {
    /// Creates a PHY around existing FIFO halves.
    ///
    /// # Arguments
    ///
    /// * `config` - Link configuration (window limits)
    /// * `read_fifo` - Writer half of the host-to-system FIFO
    /// * `write_fifo` - Reader half of the system-to-host FIFO
    /// * `trace` - Log every word crossing the bus
    pub fn new(
        config: &LinkConfig,
        read_fifo: AsyncFifoWriter<u32>,
        write_fifo: AsyncFifoReader<u32>,
        trace: bool,
    ) -> Self {
        Self {
            state: BusState::Receive,
            read_timer: AntiStarvation::new(config.read_time),
            write_timer: AntiStarvation::new(config.write_time),
            read_fifo,
            write_fifo,
            dwell: 0,
            trace,
        }
    }

    /// Creates a PHY together with both cross-domain FIFOs.
    ///
    /// # Returns
    ///
    /// The PHY plus the system-side halves: the source of received words and
    /// the sink for words to transmit.
    pub fn with_fifos(
        config: &LinkConfig,
        trace: bool,
    ) -> (Self, AsyncFifoReader<u32>, AsyncFifoWriter<u32>) {
        let (read_tx, read_rx) = async_fifo(config.fifo_depth);
        let (write_tx, write_rx) = async_fifo(config.fifo_depth);
        (Self::new(config, read_tx, write_rx, trace), read_rx, write_tx)
    }

    pub fn state(&self) -> BusState {
        self.state
    }

    /// Evaluates one link-domain tick.
    ///
    /// A transfer still happens in a window state on the tick that decides
    /// to turn around; the turnaround states never transfer.
    pub fn tick(&mut self, host: &mut HostLink, stats: &mut SimStats) {
        let wants_transmit = host.txe() && self.write_fifo.valid();
        let wants_receive = host.rxf() && self.read_fifo.ready();

        let next = match self.state {
            BusState::Receive => {
                if wants_receive {
                    if let Some(word) = host.device_read() {
                        if self.trace {
                            trace!("[Link] rx {:#010x}", word);
                        }
                        self.read_fifo.push(word);
                        stats.link_words_in += 1;
                    }
                }
                self.track_dwell(wants_transmit, &mut stats.receive_dwell_max);
                if wants_transmit && (!wants_receive || self.read_timer.max_time()) {
                    BusState::ReceiveToTransmit
                } else {
                    BusState::Receive
                }
            }
            BusState::ReceiveToTransmit => BusState::Transmit,
            BusState::Transmit => {
                if wants_transmit {
                    if let Some(word) = self.write_fifo.pop() {
                        if self.trace {
                            trace!("[Link] tx {:#010x}", word);
                        }
                        host.device_write(word);
                        stats.link_words_out += 1;
                    }
                }
                self.track_dwell(wants_receive, &mut stats.transmit_dwell_max);
                if wants_receive && (!wants_transmit || self.write_timer.max_time()) {
                    BusState::TransmitToReceive
                } else {
                    BusState::Transmit
                }
            }
            BusState::TransmitToReceive => BusState::Receive,
        };

        self.read_timer.tick(self.state == BusState::Receive);
        self.write_timer.tick(self.state == BusState::Transmit);

        if next != self.state {
            if matches!(
                next,
                BusState::ReceiveToTransmit | BusState::TransmitToReceive
            ) {
                stats.bus_turnarounds += 1;
                debug!("[Link] turnaround {:?} -> {:?}", self.state, next);
            }
            self.dwell = 0;
            self.state = next;
        }
        stats.link_ticks += 1;
    }

    fn track_dwell(&mut self, other_pending: bool, max: &mut u64) {
        if other_pending {
            self.dwell += 1;
            *max = (*max).max(self.dwell);
        } else {
            self.dwell = 0;
        }
    }

    /// Applies this tick's FIFO transfers.
    pub fn commit(&mut self) {
        self.read_fifo.commit();
        self.write_fifo.commit();
    }

    /// Forces the FSM and both timers back to their initial state.
    ///
    /// The cross-domain FIFOs keep their contents.
    pub fn reset(&mut self) {
        self.state = BusState::Receive;
        self.read_timer.reset();
        self.write_timer.reset();
        self.dwell = 0;
    }

    /// Words waiting on the link side to be sent to the host.
    pub fn pending_transmit(&self) -> usize {
        self.write_fifo.len()
    }
}
