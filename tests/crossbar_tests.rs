//! Tests for the destination crossbar: port registration, inbound dispatch
//! and outbound round-robin arbitration.

use pcie_injector::common::{BridgeError, LinkPacket, PacketBeat};
use pcie_injector::core::Crossbar;
use pcie_injector::stats::SimStats;
use pcie_injector::stream::{Buffer, StreamSink, StreamSource, SyncFifo};

/// Collects complete packets from a stream of beats.
fn packets_of(beats: &[PacketBeat]) -> Vec<LinkPacket> {
    beats
        .split_inclusive(|b| b.last)
        .filter_map(LinkPacket::from_beats)
        .collect()
}

/// Tests the registration errors.
#[test]
fn test_crossbar_registration_errors() {
    let mut xbar = Crossbar::new(4);
    assert!(xbar.register_port(0).is_ok());
    assert!(matches!(
        xbar.register_port(0),
        Err(BridgeError::DuplicatePort(0))
    ));
    assert!(matches!(xbar.port_mut(9), Err(BridgeError::UnknownPort(9))));

    xbar.seal();
    assert!(matches!(
        xbar.register_port(5),
        Err(BridgeError::PortsSealed(5))
    ));
    assert_eq!(xbar.tags(), vec![0]);
}

/// Tests that inbound packets reach the port matching their tag.
#[test]
fn test_crossbar_dispatch() {
    let mut xbar = Crossbar::new(4);
    xbar.register_port(0).unwrap();
    xbar.register_port(1).unwrap();
    let mut stats = SimStats::default();

    let to_one = LinkPacket::new(1, vec![0xA, 0xB]);
    let to_zero = LinkPacket::new(0, vec![0xC]);
    let mut master_in: SyncFifo<PacketBeat> = SyncFifo::new(16);
    for beat in to_one.beats().into_iter().chain(to_zero.beats()) {
        master_in.push(beat);
    }
    let mut master_out: SyncFifo<PacketBeat> = SyncFifo::new(16);

    let mut got = [Vec::new(), Vec::new()];
    for _ in 0..20 {
        xbar.tick(&mut master_in, &mut master_out, &mut stats);
        for tag in 0..2u8 {
            if let Some(beat) = xbar.port_mut(tag).unwrap().source.pop() {
                got[tag as usize].push(beat);
            }
        }
        xbar.commit();
    }

    assert_eq!(packets_of(&got[0]), vec![to_zero]);
    assert_eq!(packets_of(&got[1]), vec![to_one]);
    assert_eq!(stats.packets_routed, 2);
    assert!(master_out.is_empty());
    assert!(xbar.is_idle());
}

/// Tests that a packet with no registered port is consumed and counted.
#[test]
fn test_crossbar_unrouted() {
    let mut xbar = Crossbar::new(4);
    xbar.register_port(0).unwrap();
    let mut stats = SimStats::default();

    let mut master_in: SyncFifo<PacketBeat> = SyncFifo::new(16);
    for beat in LinkPacket::new(7, vec![1, 2, 3])
        .beats()
        .into_iter()
        .chain(LinkPacket::new(0, vec![4]).beats())
    {
        master_in.push(beat);
    }
    let mut master_out: SyncFifo<PacketBeat> = SyncFifo::new(16);

    let mut got = Vec::new();
    for _ in 0..20 {
        xbar.tick(&mut master_in, &mut master_out, &mut stats);
        if let Some(beat) = xbar.port_mut(0).unwrap().source.pop() {
            got.push(beat);
        }
        xbar.commit();
    }

    assert_eq!(packets_of(&got), vec![LinkPacket::new(0, vec![4])]);
    assert_eq!(stats.packets_unrouted, 1);
    assert_eq!(stats.packets_routed, 1);
    assert!(master_in.is_empty());
}

/// Drives every port with its queued beats, one per tick, and returns the
/// beats granted to the master output.
fn arbitrate(xbar: &mut Crossbar, queued: &mut [(u8, Vec<PacketBeat>)], ticks: usize) -> Vec<PacketBeat> {
    let mut stats = SimStats::default();
    let mut master_in: SyncFifo<PacketBeat> = SyncFifo::new(1);
    let mut master_out: SyncFifo<PacketBeat> = SyncFifo::new(64);
    for _ in 0..ticks {
        for (tag, beats) in queued.iter_mut() {
            let port = xbar.port_mut(*tag).unwrap();
            if !beats.is_empty() && port.sink.ready() {
                port.sink.push(beats.remove(0));
            }
        }
        xbar.tick(&mut master_in, &mut master_out, &mut stats);
        xbar.commit();
    }
    let mut out = Vec::new();
    while let Some(beat) = master_out.pop() {
        out.push(beat);
    }
    out
}

/// Tests that a granted packet is never interleaved with another port.
#[test]
fn test_crossbar_no_interleave() {
    let mut xbar = Crossbar::new(4);
    xbar.register_port(0).unwrap();
    xbar.register_port(1).unwrap();

    let a = LinkPacket::new(0, vec![0xA0, 0xA1, 0xA2]);
    let b = LinkPacket::new(1, vec![0xB0, 0xB1, 0xB2]);
    let mut queued = vec![(0, a.beats()), (1, b.beats())];
    let out = arbitrate(&mut xbar, &mut queued, 30);

    assert_eq!(packets_of(&out), vec![a, b]);
    for packet in out.split_inclusive(|beat| beat.last) {
        assert!(packet.iter().all(|beat| beat.dst == packet[0].dst));
    }
}

/// Tests that ports with pending packets are served in turn.
#[test]
fn test_crossbar_round_robin() {
    let mut xbar = Crossbar::new(4);
    xbar.register_port(0).unwrap();
    xbar.register_port(1).unwrap();

    let beats_for = |tag: u8| -> Vec<PacketBeat> {
        (0..2)
            .flat_map(|i| LinkPacket::new(tag, vec![u32::from(tag) * 16 + i]).beats())
            .collect()
    };
    let mut queued = vec![(0, beats_for(0)), (1, beats_for(1))];
    let out = arbitrate(&mut xbar, &mut queued, 20);

    let order: Vec<u8> = out.iter().map(|beat| beat.dst).collect();
    assert_eq!(order, vec![0, 1, 0, 1]);
}

/// Tests that a reset flushes the port channels.
#[test]
fn test_crossbar_reset() {
    let mut xbar = Crossbar::new(4);
    let port = xbar.register_port(3).unwrap();
    port.sink.push(LinkPacket::new(3, vec![1, 2]).beats()[0]);
    port.commit();
    assert!(!xbar.is_idle());

    xbar.reset();
    assert!(xbar.is_idle());
    assert_eq!(xbar.port(3).map(|p| p.sink.level()), Some(0));
}
