//! Link packet wire codec for host software.
//!
//! The canonical wire form is a sequence of 32-bit words, each sent
//! most-significant byte first:
//!
//! ```text
//! word 0   preamble 0x5AA55AA5
//! word 1   3 reserved bytes | dst
//! word 2   length (payload words)
//! word 3.. payload
//! ```
//!
//! The [`Packetizer`](super::Packetizer) and
//! [`Depacketizer`](super::Depacketizer) produce and consume exactly this
//! form; the functions here let host tooling do the same in software.

use crate::common::constants::{HEADER_WORDS, MIN_PAYLOAD_WORDS, PREAMBLE};
use crate::common::LinkPacket;

/// Builds the three header words for a packet.
#[inline]
pub fn header_words(dst: u8, length: u32) -> [u32; HEADER_WORDS] {
    [PREAMBLE, u32::from(dst), length]
}

/// Frames one packet into wire words.
///
/// An empty payload is framed as a single zero word with length 1.
pub fn frame(dst: u8, payload: &[u32]) -> Vec<u32> {
    let packet = LinkPacket::new(dst, payload.to_vec());
    frame_packet(&packet)
}

/// Frames a [`LinkPacket`] into wire words.
pub fn frame_packet(packet: &LinkPacket) -> Vec<u32> {
    let mut words = Vec::with_capacity(HEADER_WORDS + packet.payload.len().max(1));
    words.extend_from_slice(&header_words(packet.dst, packet.length()));
    words.extend(packet.beats().iter().map(|beat| beat.data));
    words
}

/// Serializes wire words into the byte stream written to the USB FIFO.
pub fn to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// Parses a USB byte stream into wire words.
///
/// A trailing partial word is zero-padded.
pub fn from_bytes(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_be_bytes(word)
        })
        .collect()
}

/// Recovers every complete packet from a word stream.
///
/// Words outside a frame are skipped until the next preamble. A length of
/// zero is read as one payload word. A frame cut short at the end of `words`
/// is not returned.
pub fn deframe_all(words: &[u32]) -> Vec<LinkPacket> {
    let mut packets = Vec::new();
    let mut i = 0;
    while i < words.len() {
        if words[i] != PREAMBLE {
            i += 1;
            continue;
        }
        if i + HEADER_WORDS > words.len() {
            break;
        }
        let dst = (words[i + 1] & 0xFF) as u8;
        let length = words[i + 2].max(MIN_PAYLOAD_WORDS) as usize;
        let start = i + HEADER_WORDS;
        let Some(end) = start.checked_add(length).filter(|&end| end <= words.len()) else {
            break;
        };
        packets.push(LinkPacket::new(dst, words[start..end].to_vec()));
        i = end;
    }
    packets
}
