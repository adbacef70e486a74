//! Simulation statistics collection and reporting.
//!
//! Tracks link traffic, bus arbitration, framing, routing and the drop events
//! that the data path reports instead of raising errors.

use serde::Serialize;
use std::time::Instant;

/// Simulation statistics structure tracking all counters of one domain.
///
/// Each domain owns its own instance so the domains can run on separate
/// threads; [`SimStats::merge`] combines them for reporting.
#[derive(Clone, Debug, Serialize)]
pub struct SimStats {
    #[serde(skip)]
    start_time: Instant,
    pub link_ticks: u64,
    pub system_ticks: u64,

    pub link_words_in: u64,
    pub link_words_out: u64,
    pub bus_turnarounds: u64,
    pub receive_dwell_max: u64,
    pub transmit_dwell_max: u64,

    pub packets_framed: u64,
    pub packets_deframed: u64,
    pub resync_words_dropped: u64,
    pub depacketizer_timeouts: u64,
    pub oversize_packets: u64,

    pub packets_routed: u64,
    pub packets_unrouted: u64,
    pub packets_arbitrated: u64,

    pub tlp_beats_in: u64,
    pub tlp_beats_out: u64,
    pub tlp_packets_sent: u64,
    pub tlp_packets_received: u64,
    pub tlp_overflows: u64,
    pub tlp_malformed: u64,

    pub etherbone_writes: u64,
    pub etherbone_reads: u64,
    pub etherbone_malformed: u64,
    pub wishbone_unmapped: u64,

    pub msi_sent: u64,
}

impl Default for SimStats {
    /// Returns the default value.
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            link_ticks: 0,
            system_ticks: 0,
            link_words_in: 0,
            link_words_out: 0,
            bus_turnarounds: 0,
            receive_dwell_max: 0,
            transmit_dwell_max: 0,
            packets_framed: 0,
            packets_deframed: 0,
            resync_words_dropped: 0,
            depacketizer_timeouts: 0,
            oversize_packets: 0,
            packets_routed: 0,
            packets_unrouted: 0,
            packets_arbitrated: 0,
            tlp_beats_in: 0,
            tlp_beats_out: 0,
            tlp_packets_sent: 0,
            tlp_packets_received: 0,
            tlp_overflows: 0,
            tlp_malformed: 0,
            etherbone_writes: 0,
            etherbone_reads: 0,
            etherbone_malformed: 0,
            wishbone_unmapped: 0,
            msi_sent: 0,
        }
    }
}

impl SimStats {
    /// Folds the counters of another domain into this one.
    ///
    /// Counters are summed, dwell maxima keep the larger value.
    pub fn merge(&mut self, other: &SimStats) {
        self.link_ticks += other.link_ticks;
        self.system_ticks += other.system_ticks;
        self.link_words_in += other.link_words_in;
        self.link_words_out += other.link_words_out;
        self.bus_turnarounds += other.bus_turnarounds;
        self.receive_dwell_max = self.receive_dwell_max.max(other.receive_dwell_max);
        self.transmit_dwell_max = self.transmit_dwell_max.max(other.transmit_dwell_max);
        self.packets_framed += other.packets_framed;
        self.packets_deframed += other.packets_deframed;
        self.resync_words_dropped += other.resync_words_dropped;
        self.depacketizer_timeouts += other.depacketizer_timeouts;
        self.oversize_packets += other.oversize_packets;
        self.packets_routed += other.packets_routed;
        self.packets_unrouted += other.packets_unrouted;
        self.packets_arbitrated += other.packets_arbitrated;
        self.tlp_beats_in += other.tlp_beats_in;
        self.tlp_beats_out += other.tlp_beats_out;
        self.tlp_packets_sent += other.tlp_packets_sent;
        self.tlp_packets_received += other.tlp_packets_received;
        self.tlp_overflows += other.tlp_overflows;
        self.tlp_malformed += other.tlp_malformed;
        self.etherbone_writes += other.etherbone_writes;
        self.etherbone_reads += other.etherbone_reads;
        self.etherbone_malformed += other.etherbone_malformed;
        self.wishbone_unmapped += other.wishbone_unmapped;
        self.msi_sent += other.msi_sent;
    }

    /// Total number of packets the data path discarded.
    pub fn packets_dropped(&self) -> u64 {
        self.depacketizer_timeouts
            + self.oversize_packets
            + self.packets_unrouted
            + self.tlp_overflows
    }

    /// Serializes the counters as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Prints a formatted summary of all simulation statistics.
    pub fn print(&self) {
        let duration = self.start_time.elapsed();
        let seconds = duration.as_secs_f64();

        let link_cyc = if self.link_ticks == 0 { 1 } else { self.link_ticks };
        let khz = (self.link_ticks as f64 / seconds) / 1000.0;
        let link_util =
            (self.link_words_in + self.link_words_out) as f64 / link_cyc as f64 * 100.0;

        println!("\n==========================================================");
        println!("USB / PCIE BRIDGE SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("sim_link_ticks           {}", self.link_ticks);
        println!("sim_system_ticks         {}", self.system_ticks);
        println!("sim_freq                 {:.2} kHz", khz);
        println!("----------------------------------------------------------");
        println!("LINK");
        println!("  words.in               {}", self.link_words_in);
        println!("  words.out              {}", self.link_words_out);
        println!("  bus.utilization        {:.2}%", link_util);
        println!("  bus.turnarounds        {}", self.bus_turnarounds);
        println!("  dwell.receive_max      {}", self.receive_dwell_max);
        println!("  dwell.transmit_max     {}", self.transmit_dwell_max);
        println!("----------------------------------------------------------");
        println!("FRAMING");
        println!("  packets.framed         {}", self.packets_framed);
        println!("  packets.deframed       {}", self.packets_deframed);
        println!("  resync.words_dropped   {}", self.resync_words_dropped);
        println!("  timeouts               {}", self.depacketizer_timeouts);
        println!("  oversize               {}", self.oversize_packets);
        println!("----------------------------------------------------------");
        println!("CROSSBAR");
        println!("  packets.routed         {}", self.packets_routed);
        println!("  packets.unrouted       {}", self.packets_unrouted);
        println!("  packets.arbitrated     {}", self.packets_arbitrated);
        println!("----------------------------------------------------------");
        println!("TLP");
        println!("  beats.in               {}", self.tlp_beats_in);
        println!("  beats.out              {}", self.tlp_beats_out);
        println!("  packets.sent           {}", self.tlp_packets_sent);
        println!("  packets.received       {}", self.tlp_packets_received);
        println!("  overflows              {}", self.tlp_overflows);
        println!("  malformed              {}", self.tlp_malformed);
        println!("----------------------------------------------------------");
        println!("ETHERBONE / WISHBONE");
        println!("  writes                 {}", self.etherbone_writes);
        println!("  reads                  {}", self.etherbone_reads);
        println!("  malformed              {}", self.etherbone_malformed);
        println!("  unmapped               {}", self.wishbone_unmapped);
        println!("  msi.sent               {}", self.msi_sent);
        println!("==========================================================");
    }
}
