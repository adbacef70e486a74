//! Built-in host exchange.
//!
//! Drives the bridge the way the host tools do: an Etherbone write and
//! read-back of SRAM, an MSI raised through the MSI controller CSRs, and a
//! TLP memory write followed by a memory read the endpoint completes. The
//! frames the device sends back are collected and decoded.

use log::info;

use crate::common::{BridgeError, LinkPacket};
use crate::config::Config;
use crate::core::wire;
use crate::etherbone::{EtherbonePacket, EtherboneRecord};
use crate::sim::runner::run_stream;
use crate::soc::devices::msi::{MSI_DATA, MSI_SEND};
use crate::soc::System;
use crate::tlp::TlpRecord;

pub const DEMO_SRAM_WORDS: [u32; 2] = [0x1234_5678, 0xCAFE_BABE];
pub const DEMO_MSI_VECTOR: u32 = 5;
pub const DEMO_TLP_ADDRESS: u32 = 0x0000_1000;
pub const DEMO_TLP_DATA: u32 = 0xDEAD_BEEF;
const DEMO_REQUESTER_ID: u16 = 0x0000;

/// A frame sent back by the device, decoded by destination.
#[derive(Debug)]
pub enum DemoReply {
    Etherbone(EtherbonePacket),
    Tlp(TlpRecord),
    Raw(LinkPacket),
}

/// Builds the host byte-stream words of the demo exchange.
pub fn demo_words(config: &Config) -> Result<Vec<u32>, BridgeError> {
    let ports = config.core.ports;
    let sram = config.etherbone.sram_base_val()? as u32;
    let msi = config.etherbone.msi_base_val()? as u32;

    let write = EtherbonePacket::new(vec![EtherboneRecord::write(
        sram,
        DEMO_SRAM_WORDS.to_vec(),
    )]);
    let read = EtherbonePacket::new(vec![EtherboneRecord::read(vec![
        sram,
        sram.wrapping_add(4),
    ])]);
    let irq = EtherbonePacket::new(vec![
        EtherboneRecord::write(msi.wrapping_add(MSI_DATA as u32), vec![DEMO_MSI_VECTOR]),
        EtherboneRecord::write(msi.wrapping_add(MSI_SEND as u32), vec![1]),
    ]);
    let tlp_write =
        TlpRecord::mem_write32(DEMO_REQUESTER_ID, 0, DEMO_TLP_ADDRESS, vec![DEMO_TLP_DATA]);
    let tlp_read = TlpRecord::mem_read32(DEMO_REQUESTER_ID, 1, DEMO_TLP_ADDRESS);

    let mut words = Vec::new();
    words.extend(wire::frame(ports.etherbone, &write.encode()));
    words.extend(wire::frame(ports.etherbone, &read.encode()));
    words.extend(wire::frame(ports.etherbone, &irq.encode()));
    words.extend(wire::frame(ports.tlp, &tlp_write.to_dwords()));
    words.extend(wire::frame(ports.tlp, &tlp_read.to_dwords()));
    Ok(words)
}

/// Decodes a frame received by the host according to its destination.
pub fn decode_reply(config: &Config, packet: LinkPacket) -> DemoReply {
    let ports = config.core.ports;
    if packet.dst == ports.etherbone {
        if let Ok(eb) = EtherbonePacket::decode(&packet.payload) {
            return DemoReply::Etherbone(eb);
        }
    } else if packet.dst == ports.tlp {
        if let Ok(tlp) = TlpRecord::from_dwords(&packet.payload) {
            return DemoReply::Tlp(tlp);
        }
    }
    DemoReply::Raw(packet)
}

/// Runs the demo exchange on `system`.
///
/// # Returns
///
/// The decoded replies, in the order the host received them.
pub fn run_demo(
    system: &mut System,
    config: &Config,
    max_ticks: u64,
) -> Result<Vec<DemoReply>, BridgeError> {
    let words = demo_words(config)?;
    info!("[Demo] sending {} words", words.len());
    let ticks = run_stream(system, &words, max_ticks);
    if !system.is_idle() {
        return Err(BridgeError::NotIdle(ticks));
    }
    let received = system.host_mut().read_words();
    let replies = wire::deframe_all(&received)
        .into_iter()
        .map(|packet| decode_reply(config, packet))
        .collect();
    Ok(replies)
}
