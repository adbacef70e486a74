//! Tests for the packetizer FSM and the host-side wire codec.

use pcie_injector::common::{LinkPacket, PacketBeat, PREAMBLE};
use pcie_injector::core::{wire, Packetizer, PacketizerState};
use pcie_injector::stats::SimStats;
use pcie_injector::stream::{Buffer, Channel, Component, StreamSink, StreamSource, SyncFifo};

fn source_of(packets: &[LinkPacket]) -> SyncFifo<PacketBeat> {
    let mut fifo: SyncFifo<PacketBeat> = SyncFifo::new(1024);
    for packet in packets {
        for beat in packet.beats() {
            assert!(fifo.push(beat));
        }
    }
    fifo
}

fn drain(fifo: &mut SyncFifo<u32>) -> Vec<u32> {
    let mut words = Vec::new();
    while let Some(w) = fifo.pop() {
        words.push(w);
    }
    words
}

/// Tests framing of a two-word packet, header latched then copied.
#[test]
fn test_packetizer_frames_packet() {
    let packet = LinkPacket::new(0, vec![0x1111_2222, 0x3333_4444]);
    let mut input = source_of(&[packet.clone()]);
    let mut output: SyncFifo<u32> = SyncFifo::new(64);
    let mut stats = SimStats::default();
    let mut pk = Packetizer::new(false);

    pk.tick(&mut input, &mut output, &mut stats);
    assert_eq!(pk.state(), PacketizerState::InsertHeader(0));
    assert!(output.is_empty());

    for _ in 0..5 {
        pk.tick(&mut input, &mut output, &mut stats);
    }
    assert_eq!(pk.state(), PacketizerState::Idle);
    assert_eq!(
        drain(&mut output),
        vec![PREAMBLE, 0, 2, 0x1111_2222, 0x3333_4444]
    );
    assert_eq!(stats.packets_framed, 1);
}

/// Tests that a stalled output never loses or duplicates a word.
#[test]
fn test_packetizer_backpressure() {
    let packet = LinkPacket::new(9, (0..10).collect());
    let mut input = source_of(&[packet.clone()]);
    let mut output: Channel<u32> = Channel::new(1);
    let mut stats = SimStats::default();
    let mut pk = Packetizer::new(false);

    let mut words = Vec::new();
    for tick in 0..200 {
        pk.tick(&mut input, &mut output, &mut stats);
        if tick % 3 == 0 {
            if let Some(w) = output.pop() {
                words.push(w);
            }
        }
        output.commit();
    }
    assert_eq!(words, wire::frame(9, &packet.payload));
    assert!(pk.is_idle());
}

/// Tests two packets framed back to back.
#[test]
fn test_packetizer_back_to_back() {
    let a = LinkPacket::new(1, vec![0xA]);
    let b = LinkPacket::new(2, vec![0xB0, 0xB1, 0xB2]);
    let mut input = source_of(&[a.clone(), b.clone()]);
    let mut output: SyncFifo<u32> = SyncFifo::new(64);
    let mut stats = SimStats::default();
    let mut pk = Packetizer::new(false);

    for _ in 0..20 {
        pk.tick(&mut input, &mut output, &mut stats);
    }
    let mut expected = wire::frame_packet(&a);
    expected.extend(wire::frame_packet(&b));
    assert_eq!(drain(&mut output), expected);
    assert_eq!(stats.packets_framed, 2);
}

/// Tests the byte form of the reference two-word frame.
#[test]
fn test_wire_bytes() {
    let words = wire::frame(1, &[0x1111_2222, 0x3333_4444]);
    let bytes = wire::to_bytes(&words);
    assert_eq!(
        bytes,
        vec![
            0x5A, 0xA5, 0x5A, 0xA5, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x11, 0x11,
            0x22, 0x22, 0x33, 0x33, 0x44, 0x44
        ]
    );
    assert_eq!(wire::from_bytes(&bytes), words);
}

/// Tests that an empty payload is framed as one zero word.
#[test]
fn test_wire_empty_payload() {
    assert_eq!(wire::frame(4, &[]), vec![PREAMBLE, 4, 1, 0]);
}

/// Tests software deframing across garbage and a truncated tail.
#[test]
fn test_wire_deframe_all() {
    let mut words = vec![0xDEAD, 0xBEEF];
    words.extend(wire::frame(1, &[5, 6]));
    words.push(7);
    words.extend(wire::frame(2, &[0]));
    words.extend(&[PREAMBLE, 3, 4, 1]);

    let packets = wire::deframe_all(&words);
    assert_eq!(
        packets,
        vec![LinkPacket::new(1, vec![5, 6]), LinkPacket::new(2, vec![0])]
    );
}
