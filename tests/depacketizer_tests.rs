//! Tests for the depacketizer FSM: resynchronization, the idle timeout,
//! oversize frames and store-and-forward delivery.

use pcie_injector::common::{LinkPacket, PacketBeat, PREAMBLE};
use pcie_injector::config::CoreConfig;
use pcie_injector::core::{wire, Depacketizer, DepacketizerState};
use pcie_injector::stats::SimStats;
use pcie_injector::stream::{Buffer, Channel, Component, StreamSink, StreamSource, SyncFifo};

fn core_config(timeout: u32, max_payload_words: u32) -> CoreConfig {
    CoreConfig {
        depacketizer_timeout: timeout,
        max_payload_words,
        ..CoreConfig::default()
    }
}

fn feed(fifo: &mut SyncFifo<u32>, words: &[u32]) {
    for &w in words {
        assert!(fifo.push(w));
    }
}

fn collect(beats: &mut SyncFifo<PacketBeat>) -> Vec<LinkPacket> {
    let mut packets = Vec::new();
    let mut current = Vec::new();
    while let Some(beat) = beats.pop() {
        current.push(beat);
        if beat.last {
            packets.extend(LinkPacket::from_beats(&current));
            current.clear();
        }
    }
    assert!(current.is_empty(), "partial packet leaked downstream");
    packets
}

struct Bench {
    dp: Depacketizer,
    input: SyncFifo<u32>,
    output: SyncFifo<PacketBeat>,
    stats: SimStats,
}

impl Bench {
    fn new(timeout: u32, max_payload_words: u32) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            dp: Depacketizer::new(&core_config(timeout, max_payload_words), false),
            input: SyncFifo::new(4096),
            output: SyncFifo::new(4096),
            stats: SimStats::default(),
        }
    }

    fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.dp.tick(&mut self.input, &mut self.output, &mut self.stats);
        }
    }
}

/// Tests recovery of packets of every small length.
#[test]
fn test_depacketizer_lengths() {
    for length in 1..=8u32 {
        let mut bench = Bench::new(1024, 1024);
        let payload: Vec<u32> = (0..length).map(|i| 0x1000 * length + i).collect();
        feed(&mut bench.input, &wire::frame(3, &payload));
        bench.run(40);

        assert_eq!(
            collect(&mut bench.output),
            vec![LinkPacket::new(3, payload)]
        );
        assert_eq!(bench.stats.packets_deframed, 1);
        assert!(bench.dp.is_idle());
    }
}

/// Tests that every beat carries the packet parameters.
#[test]
fn test_depacketizer_beat_parameters() {
    let mut bench = Bench::new(1024, 1024);
    feed(&mut bench.input, &wire::frame(6, &[1, 2, 3]));
    bench.run(20);

    let mut beats = Vec::new();
    while let Some(beat) = bench.output.pop() {
        beats.push(beat);
    }
    assert_eq!(beats.len(), 3);
    assert!(beats.iter().all(|b| b.dst == 6 && b.length == 3));
    assert_eq!(
        beats.iter().map(|b| b.last).collect::<Vec<_>>(),
        vec![false, false, true]
    );
}

/// Tests that words before a preamble are dropped and counted.
#[test]
fn test_depacketizer_resync() {
    let mut bench = Bench::new(1024, 1024);
    feed(&mut bench.input, &[0x0000_0001, 0xFFFF_FFFF, 0x5AA5_0000]);
    feed(&mut bench.input, &wire::frame(2, &[0xCAFE]));
    bench.run(20);

    assert_eq!(
        collect(&mut bench.output),
        vec![LinkPacket::new(2, vec![0xCAFE])]
    );
    assert_eq!(bench.stats.resync_words_dropped, 3);
}

/// Tests that the timeout fires exactly `timeout` ticks after the last word.
#[test]
fn test_depacketizer_timeout_exact() {
    const TIMEOUT: u32 = 10;
    let mut bench = Bench::new(TIMEOUT, 1024);
    feed(&mut bench.input, &[PREAMBLE, 0x0000_0001]);

    bench.run(2);
    assert_eq!(bench.dp.state(), DepacketizerState::ReceiveHeader);

    for _ in 0..TIMEOUT - 1 {
        bench.run(1);
        assert_eq!(bench.dp.state(), DepacketizerState::ReceiveHeader);
    }
    bench.run(1);
    assert_eq!(bench.dp.state(), DepacketizerState::Idle);
    assert_eq!(bench.stats.depacketizer_timeouts, 1);
}

/// Tests that an abandoned payload never reaches the output and the next
/// frame is received intact.
#[test]
fn test_depacketizer_timeout_mid_payload() {
    let mut bench = Bench::new(16, 1024);
    feed(&mut bench.input, &[PREAMBLE, 4, 4, 0xAAAA, 0xBBBB]);
    bench.run(40);
    assert_eq!(bench.dp.state(), DepacketizerState::Idle);
    assert!(bench.output.is_empty());
    assert_eq!(bench.stats.depacketizer_timeouts, 1);

    feed(&mut bench.input, &wire::frame(4, &[1, 2, 3, 4]));
    bench.run(20);
    assert_eq!(
        collect(&mut bench.output),
        vec![LinkPacket::new(4, vec![1, 2, 3, 4])]
    );
}

/// Tests that a zero timeout waits forever.
#[test]
fn test_depacketizer_timeout_disabled() {
    let mut bench = Bench::new(0, 1024);
    feed(&mut bench.input, &[PREAMBLE, 1, 2, 0x77]);
    bench.run(10_000);
    assert_eq!(bench.dp.state(), DepacketizerState::Copy);

    feed(&mut bench.input, &[0x88]);
    bench.run(5);
    assert_eq!(
        collect(&mut bench.output),
        vec![LinkPacket::new(1, vec![0x77, 0x88])]
    );
    assert_eq!(bench.stats.depacketizer_timeouts, 0);
}

/// Tests delivery into a slow consumer.
#[test]
fn test_depacketizer_backpressure() {
    let cfg = core_config(4, 1024);
    let mut dp = Depacketizer::new(&cfg, false);
    let mut input: SyncFifo<u32> = SyncFifo::new(64);
    let mut output: Channel<PacketBeat> = Channel::new(1);
    let mut stats = SimStats::default();
    feed(&mut input, &wire::frame(5, &[10, 20, 30, 40, 50]));

    let mut beats = Vec::new();
    for tick in 0..200 {
        dp.tick(&mut input, &mut output, &mut stats);
        if tick % 4 == 0 {
            if let Some(beat) = output.pop() {
                beats.push(beat);
            }
        }
        output.commit();
    }
    assert_eq!(
        LinkPacket::from_beats(&beats),
        Some(LinkPacket::new(5, vec![10, 20, 30, 40, 50]))
    );
    assert_eq!(stats.depacketizer_timeouts, 0);
}

/// Tests that a zero length field carries one payload word.
#[test]
fn test_depacketizer_zero_length() {
    let mut bench = Bench::new(1024, 1024);
    feed(&mut bench.input, &[PREAMBLE, 7, 0, 0xABCD, PREAMBLE]);
    bench.run(10);

    assert_eq!(
        collect(&mut bench.output),
        vec![LinkPacket::new(7, vec![0xABCD])]
    );
    assert_eq!(bench.dp.state(), DepacketizerState::ReceiveHeader);
}

/// Tests that an oversize frame is consumed whole, including a preamble
/// inside its payload.
#[test]
fn test_depacketizer_oversize() {
    let mut bench = Bench::new(1024, 4);
    feed(
        &mut bench.input,
        &[PREAMBLE, 1, 6, PREAMBLE, 1, 1, 0x11, 0x22, 0x33],
    );
    feed(&mut bench.input, &wire::frame(2, &[0x44]));
    bench.run(30);

    assert_eq!(
        collect(&mut bench.output),
        vec![LinkPacket::new(2, vec![0x44])]
    );
    assert_eq!(bench.stats.oversize_packets, 1);
    assert_eq!(bench.stats.resync_words_dropped, 0);
}

/// Tests that the reserved bytes of the destination word are ignored.
#[test]
fn test_depacketizer_reserved_dst_bytes() {
    let mut bench = Bench::new(1024, 1024);
    feed(&mut bench.input, &[PREAMBLE, 0xFFFF_FF01, 1, 5]);
    bench.run(10);
    assert_eq!(collect(&mut bench.output), vec![LinkPacket::new(1, vec![5])]);
}

/// Tests that a reset abandons a frame in flight.
#[test]
fn test_depacketizer_reset() {
    let mut bench = Bench::new(1024, 1024);
    feed(&mut bench.input, &[PREAMBLE, 1, 3, 1]);
    bench.run(4);
    assert_eq!(bench.dp.state(), DepacketizerState::Copy);

    bench.dp.reset();
    assert!(bench.dp.is_idle());
    feed(&mut bench.input, &wire::frame(1, &[9]));
    bench.run(10);
    assert_eq!(collect(&mut bench.output), vec![LinkPacket::new(1, vec![9])]);
}
