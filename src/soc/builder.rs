//! System Builder.
//!
//! This module defines the `System` structure, the container for both
//! execution domains of the bridge. The link domain holds the host chip
//! model and the PHY; the system domain holds the packet core, the TLP path,
//! the Etherbone bridge and the Wishbone devices. The two domains share
//! nothing but the cross-domain FIFOs created here, so each can be ticked on
//! its own thread.
//!
//! All wiring happens once in [`System::new`]; nothing is connected or
//! disconnected afterwards.

use log::{debug, info};

use crate::common::{BridgeError, MsiVector, PacketBeat, TlpBeat};
use crate::config::Config;
use crate::core::{Crossbar, Depacketizer, Packetizer};
use crate::etherbone::EtherboneBridge;
use crate::phy::{HostLink, LinkBus};
use crate::soc::devices::{MsiController, Sram};
use crate::soc::interconnect::WishboneBus;
use crate::stats::SimStats;
use crate::stream::{AsyncFifoReader, AsyncFifoWriter, Buffer, Channel, Component};
use crate::tlp::{TlpEndpoint, TlpReceiver, TlpSender};

/// Link-side domain: the USB FIFO chip and the PHY.
#[derive(Debug)]
pub struct LinkDomain {
    pub host: HostLink,
    pub phy: LinkBus,
    pub stats: SimStats,
}

impl LinkDomain {
    /// Evaluates one link-domain tick.
    pub fn tick(&mut self) {
        self.phy.tick(&mut self.host, &mut self.stats);
        self.phy.commit();
    }

    /// Forces the PHY back to its initial state.
    ///
    /// The cross-domain FIFOs and the host chip keep their contents.
    pub fn reset(&mut self) {
        debug!("[System] link domain reset");
        self.phy.reset();
    }

    /// Returns `true` when no host word is waiting in either direction on
    /// the link side.
    pub fn is_idle(&self) -> bool {
        self.host.pending_to_device() == 0 && self.phy.pending_transmit() == 0
    }
}

/// System-side domain: packet core, TLP path, Etherbone bridge and devices.
pub struct SystemDomain {
    rx: AsyncFifoReader<u32>,
    tx: AsyncFifoWriter<u32>,

    depacketizer: Depacketizer,
    depack_out: Channel<PacketBeat>,
    crossbar: Crossbar,
    pack_in: Channel<PacketBeat>,
    packetizer: Packetizer,

    tlp_tag: u8,
    tlp_sender: TlpSender,
    tlp_receiver: TlpReceiver,
    /// Receiver to endpoint (host to PCIe).
    tlp_down: Channel<TlpBeat>,
    /// Endpoint to sender (PCIe to host).
    tlp_up: Channel<TlpBeat>,
    pub endpoint: TlpEndpoint,

    etherbone_tag: u8,
    etherbone: EtherboneBridge,
    pub bus: WishboneBus,
    msi: Channel<MsiVector>,

    pub stats: SimStats,
}

impl SystemDomain {
    /// Builds the system domain around the system-side FIFO halves.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `rx` - Reader half of the host-to-system FIFO
    /// * `tx` - Writer half of the system-to-host FIFO
    ///
    /// # Returns
    ///
    /// [`BridgeError::DuplicatePort`] if both consumers claim the same tag.
    pub fn new(
        config: &Config,
        rx: AsyncFifoReader<u32>,
        tx: AsyncFifoWriter<u32>,
    ) -> Result<Self, BridgeError> {
        let trace = config.general.trace_enabled();
        let depth = config.core.stream_depth;
        let ports = config.core.ports;

        let mut crossbar = Crossbar::new(depth);
        crossbar.register_port(ports.etherbone)?;
        crossbar.register_port(ports.tlp)?;
        crossbar.seal();

        let mut bus = WishboneBus::new();
        bus.add_device(Box::new(Sram::new(
            config.etherbone.sram_base_val()?,
            config.etherbone.sram_size_val()?,
        )));
        bus.add_device(Box::new(MsiController::new(config.etherbone.msi_base_val()?)));

        Ok(Self {
            rx,
            tx,
            depacketizer: Depacketizer::new(&config.core, trace),
            depack_out: Channel::new(depth),
            crossbar,
            pack_in: Channel::new(depth),
            packetizer: Packetizer::new(trace),
            tlp_tag: ports.tlp,
            tlp_sender: TlpSender::new(ports.tlp, config.tlp.fifo_depth, trace),
            tlp_receiver: TlpReceiver::new(trace),
            tlp_down: Channel::new(depth),
            tlp_up: Channel::new(depth),
            endpoint: TlpEndpoint::new(&config.tlp),
            etherbone_tag: ports.etherbone,
            etherbone: EtherboneBridge::new(ports.etherbone),
            bus,
            msi: Channel::new(1),
            stats: SimStats::default(),
        })
    }

    /// Evaluates one system-domain tick.
    ///
    /// Every component reads the state committed at the end of the previous
    /// tick, so the evaluation order below does not change the outcome.
    pub fn tick(&mut self) {
        let stats = &mut self.stats;

        self.depacketizer
            .tick(&mut self.rx, &mut self.depack_out, stats);
        self.crossbar
            .tick(&mut self.depack_out, &mut self.pack_in, stats);
        self.packetizer.tick(&mut self.pack_in, &mut self.tx, stats);

        if let Ok(port) = self.crossbar.port_mut(self.tlp_tag) {
            self.tlp_receiver
                .tick(&mut port.source, &mut self.tlp_down, stats);
            self.tlp_sender.tick(&mut self.tlp_up, &mut port.sink, stats);
        }
        if let Ok(port) = self.crossbar.port_mut(self.etherbone_tag) {
            self.etherbone.tick(port, &mut self.bus, stats);
        }

        self.bus.tick(&mut self.msi, stats);
        self.endpoint
            .tick(&mut self.tlp_down, &mut self.tlp_up, &mut self.msi, stats);

        stats.system_ticks += 1;
        self.commit();
    }

    fn commit(&mut self) {
        self.rx.commit();
        self.tx.commit();
        self.depack_out.commit();
        self.pack_in.commit();
        self.crossbar.commit();
        self.tlp_down.commit();
        self.tlp_up.commit();
        self.msi.commit();
    }

    /// Forces every FSM of the domain to its initial state and flushes the
    /// domain's own channels.
    ///
    /// The cross-domain FIFOs keep the words already committed into them.
    pub fn reset(&mut self) {
        debug!("[System] system domain reset");
        self.depacketizer.reset();
        self.packetizer.reset();
        self.crossbar.reset();
        self.tlp_sender.reset();
        self.tlp_receiver.reset();
        self.etherbone.reset();
        self.endpoint.reset();
        self.bus.reset();
        self.depack_out.flush();
        self.pack_in.flush();
        self.tlp_down.flush();
        self.tlp_up.flush();
        self.msi.flush();
    }

    /// Returns `true` when no word or packet is in flight in the domain.
    pub fn is_idle(&self) -> bool {
        self.rx.is_empty()
            && self.tx.is_empty()
            && self.depacketizer.is_idle()
            && self.packetizer.is_idle()
            && self.crossbar.is_idle()
            && self.tlp_sender.is_idle()
            && self.tlp_receiver.is_idle()
            && self.etherbone.is_idle()
            && self.endpoint.is_idle()
            && self.bus.is_idle()
            && self.depack_out.is_empty()
            && self.pack_in.is_empty()
            && self.tlp_down.is_empty()
            && self.tlp_up.is_empty()
            && self.msi.is_empty()
    }

    pub fn crossbar(&self) -> &Crossbar {
        &self.crossbar
    }

    pub fn depacketizer(&self) -> &Depacketizer {
        &self.depacketizer
    }

    pub fn packetizer(&self) -> &Packetizer {
        &self.packetizer
    }
}

/// The complete bridge: both domains and their clock ratio.
pub struct System {
    pub link: LinkDomain,
    pub soc: SystemDomain,
    ratio: u32,
    ticks: u64,
}

impl System {
    /// Creates a new system with the specified configuration.
    ///
    /// Builds both cross-domain FIFOs, the PHY, the packet core and every
    /// consumer, and registers the crossbar ports.
    ///
    /// # Arguments
    ///
    /// * `config` - Bridge configuration
    ///
    /// # Returns
    ///
    /// The assembled system, or the configuration error that prevents it.
    pub fn new(config: &Config) -> Result<Self, BridgeError> {
        config.validate()?;
        let (phy, rx, tx) = LinkBus::with_fifos(&config.link, config.general.trace_enabled());
        let soc = SystemDomain::new(config, rx, tx)?;
        let link = LinkDomain {
            host: HostLink::new(config.link.host_buffer_words),
            phy,
            stats: SimStats::default(),
        };
        info!(
            "[System] assembled: fifo_depth={} read_time={} write_time={} ratio={}",
            config.link.fifo_depth,
            config.link.read_time,
            config.link.write_time,
            config.general.system_ticks_per_link_tick
        );
        Ok(Self {
            link,
            soc,
            ratio: config.general.system_ticks_per_link_tick,
            ticks: 0,
        })
    }

    /// Advances the system by one link-domain tick.
    ///
    /// The system domain is ticked `system_ticks_per_link_tick` times.
    pub fn tick(&mut self) {
        self.link.tick();
        for _ in 0..self.ratio {
            self.soc.tick();
        }
        self.ticks += 1;
    }

    /// Link-domain ticks evaluated so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn ratio(&self) -> u32 {
        self.ratio
    }

    pub fn host_mut(&mut self) -> &mut HostLink {
        &mut self.link.host
    }

    pub fn reset_link_domain(&mut self) {
        self.link.reset();
    }

    pub fn reset_system_domain(&mut self) {
        self.soc.reset();
    }

    /// Returns `true` when nothing is left in flight in either domain.
    pub fn is_idle(&self) -> bool {
        self.link.is_idle() && self.soc.is_idle()
    }

    /// Counters of both domains combined.
    pub fn stats(&self) -> SimStats {
        let mut stats = self.link.stats.clone();
        stats.merge(&self.soc.stats);
        stats
    }
}
