//! USB loopback design.
//!
//! The PHY alone with one bounded FIFO in the system domain feeding every
//! received word straight back to the host. Exercises the bus FSM and the
//! cross-domain FIFOs without the packet core.

use super::ft245::LinkBus;
use super::host::HostLink;
use crate::config::Config;
use crate::stats::SimStats;
use crate::stream::{AsyncFifoReader, AsyncFifoWriter, Buffer, StreamSink, StreamSource, SyncFifo};

/// PHY plus a word loop in the system domain.
#[derive(Debug)]
pub struct LoopbackSystem {
    pub host: HostLink,
    pub phy: LinkBus,
    rx: AsyncFifoReader<u32>,
    tx: AsyncFifoWriter<u32>,
    loop_fifo: SyncFifo<u32>,
    pub stats: SimStats,
}

impl LoopbackSystem {
    pub fn new(config: &Config) -> Self {
        let (phy, rx, tx) = LinkBus::with_fifos(&config.link, config.general.trace_enabled());
        Self {
            host: HostLink::new(config.link.host_buffer_words),
            phy,
            rx,
            tx,
            loop_fifo: SyncFifo::new(config.link.fifo_depth),
            stats: SimStats::default(),
        }
    }

    /// Evaluates one tick of both domains.
    pub fn tick(&mut self) {
        self.phy.tick(&mut self.host, &mut self.stats);

        if let Some(&word) = self.loop_fifo.peek() {
            if self.tx.push(word) {
                self.loop_fifo.pop();
            }
        }
        if self.rx.valid() && self.loop_fifo.ready() {
            if let Some(word) = self.rx.pop() {
                self.loop_fifo.push(word);
            }
        }
        self.stats.system_ticks += 1;

        self.phy.commit();
        self.rx.commit();
        self.tx.commit();
    }

    /// Returns `true` once every word has made it back to the host queue.
    pub fn is_idle(&self) -> bool {
        self.host.pending_to_device() == 0
            && self.rx.is_empty()
            && self.loop_fifo.is_empty()
            && self.tx.is_empty()
            && self.phy.pending_transmit() == 0
    }

    /// Ticks until idle or `max_ticks` elapse.
    ///
    /// # Returns
    ///
    /// The number of ticks evaluated.
    pub fn run_until_idle(&mut self, max_ticks: u64) -> u64 {
        let mut ticks = 0;
        while ticks < max_ticks && !self.is_idle() {
            self.tick();
            ticks += 1;
        }
        ticks
    }
}
