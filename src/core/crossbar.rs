//! Destination crossbar.
//!
//! Connects the single master side (depacketizer in, packetizer out) to the
//! registered user ports. Inbound packets are dispatched by their `dst` tag;
//! outbound packets from all ports are arbitrated round-robin, one whole
//! packet per grant.

use linked_hash_map::LinkedHashMap;
use log::{debug, info, warn};

use crate::common::{BridgeError, PacketBeat};
use crate::stats::SimStats;
use crate::stream::{Buffer, Channel, StreamSink, StreamSource};

/// One bidirectional user port.
///
/// `sink` carries packets from the user into the crossbar, `source` carries
/// packets dispatched to the user.
#[derive(Debug)]
pub struct UserPort {
    tag: u8,
    pub sink: Channel<PacketBeat>,
    pub source: Channel<PacketBeat>,
}

impl UserPort {
    fn new(tag: u8, depth: usize) -> Self {
        Self {
            tag,
            sink: Channel::new(depth),
            source: Channel::new(depth),
        }
    }

    pub fn tag(&self) -> u8 {
        self.tag
    }

    pub fn commit(&mut self) {
        self.sink.commit();
        self.source.commit();
    }
}

/// Where the inbound packet in flight goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Dispatch {
    Port(u8),
    Drop,
}

#[derive(Debug)]
pub struct Crossbar {
    ports: LinkedHashMap<u8, UserPort>,
    depth: usize,
    sealed: bool,
    /// Port owning the master output until its packet ends.
    grant: Option<u8>,
    /// Position the next arbitration round starts from.
    next: usize,
    dispatch: Option<Dispatch>,
}

impl Crossbar {
    /// Creates a crossbar whose ports use channels of `depth` beats.
    pub fn new(depth: usize) -> Self {
        Self {
            ports: LinkedHashMap::new(),
            depth,
            sealed: false,
            grant: None,
            next: 0,
            dispatch: None,
        }
    }

    /// Registers a user port for a destination tag.
    ///
    /// # Returns
    ///
    /// The new port, or [`BridgeError::DuplicatePort`] if the tag is taken
    /// and [`BridgeError::PortsSealed`] once the crossbar carries traffic.
    pub fn register_port(&mut self, tag: u8) -> Result<&mut UserPort, BridgeError> {
        if self.sealed {
            return Err(BridgeError::PortsSealed(tag));
        }
        if self.ports.contains_key(&tag) {
            return Err(BridgeError::DuplicatePort(tag));
        }
        info!("[Crossbar] registered port dst={:#x}", tag);
        self.ports.insert(tag, UserPort::new(tag, self.depth));
        self.port_mut(tag)
    }

    /// Closes registration; later calls to `register_port` fail.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn port_mut(&mut self, tag: u8) -> Result<&mut UserPort, BridgeError> {
        self.ports
            .get_mut(&tag)
            .ok_or(BridgeError::UnknownPort(tag))
    }

    pub fn port(&self, tag: u8) -> Option<&UserPort> {
        self.ports.get(&tag)
    }

    /// Registered tags in registration order.
    pub fn tags(&self) -> Vec<u8> {
        self.ports.keys().copied().collect()
    }

    /// Evaluates one tick of both directions.
    ///
    /// # Arguments
    ///
    /// * `master_in` - Packets from the depacketizer
    /// * `master_out` - Packets towards the packetizer
    /// * `stats` - Counters of the system domain
    pub fn tick<I, O>(&mut self, master_in: &mut I, master_out: &mut O, stats: &mut SimStats)
    where
        I: StreamSource<PacketBeat>,
        O: StreamSink<PacketBeat>,
    {
        self.arbitrate(master_out, stats);
        self.dispatch(master_in, stats);
    }

    fn arbitrate<O: StreamSink<PacketBeat>>(&mut self, master_out: &mut O, stats: &mut SimStats) {
        if self.grant.is_none() && !self.ports.is_empty() {
            let start = self.next % self.ports.len();
            let chosen = self
                .ports
                .values()
                .enumerate()
                .skip(start)
                .chain(self.ports.values().enumerate().take(start))
                .find(|(_, port)| port.sink.valid())
                .map(|(i, port)| (i, port.tag));
            if let Some((i, tag)) = chosen {
                debug!("[Crossbar] grant dst={:#x}", tag);
                stats.packets_arbitrated += 1;
                self.grant = Some(tag);
                self.next = i + 1;
            }
        }

        let Some(tag) = self.grant else {
            return;
        };
        let Some(port) = self.ports.get_mut(&tag) else {
            self.grant = None;
            return;
        };
        if port.sink.valid() && master_out.ready() {
            if let Some(beat) = port.sink.pop() {
                master_out.push(beat);
                if beat.last {
                    self.grant = None;
                }
            }
        }
    }

    fn dispatch<I: StreamSource<PacketBeat>>(&mut self, master_in: &mut I, stats: &mut SimStats) {
        if self.dispatch.is_none() {
            let Some(beat) = master_in.peek() else {
                return;
            };
            let target = if self.ports.contains_key(&beat.dst) {
                stats.packets_routed += 1;
                Dispatch::Port(beat.dst)
            } else {
                warn!(
                    "[Crossbar] no port for dst={:#x}, dropping {} words",
                    beat.dst, beat.length
                );
                stats.packets_unrouted += 1;
                Dispatch::Drop
            };
            self.dispatch = Some(target);
        }

        match self.dispatch {
            Some(Dispatch::Port(tag)) => {
                let Some(port) = self.ports.get_mut(&tag) else {
                    return;
                };
                if master_in.valid() && port.source.ready() {
                    if let Some(beat) = master_in.pop() {
                        port.source.push(beat);
                        if beat.last {
                            self.dispatch = None;
                        }
                    }
                }
            }
            Some(Dispatch::Drop) => {
                if let Some(beat) = master_in.pop() {
                    if beat.last {
                        self.dispatch = None;
                    }
                }
            }
            None => {}
        }
    }

    /// Applies this tick's transfers on every port channel.
    pub fn commit(&mut self) {
        for (_, port) in self.ports.iter_mut() {
            port.commit();
        }
    }

    /// Drops in-flight grants and flushes every port channel.
    pub fn reset(&mut self) {
        self.grant = None;
        self.dispatch = None;
        self.next = 0;
        for (_, port) in self.ports.iter_mut() {
            port.sink.flush();
            port.source.flush();
        }
    }

    /// Returns `true` when no packet is in flight and every port is empty.
    pub fn is_idle(&self) -> bool {
        self.grant.is_none()
            && self.dispatch.is_none()
            && self
                .ports
                .values()
                .all(|port| port.sink.is_empty() && port.source.is_empty())
    }
}
