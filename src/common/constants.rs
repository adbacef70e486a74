//! Wire-level constants.

/// Start-of-frame marker on the link.
pub const PREAMBLE: u32 = 0x5AA5_5AA5;

/// Number of 32-bit header words in a link frame (preamble, dst, length).
pub const HEADER_WORDS: usize = 3;

/// Number of header words the depacketizer collects after the preamble.
pub const HEADER_FIELD_WORDS: usize = HEADER_WORDS - 1;

/// Byte-enable of a 64-bit lane carrying only its lower dword.
pub const BE_LOWER: u8 = 0x0F;

/// Byte-enable of a fully valid 64-bit lane.
pub const BE_FULL: u8 = 0xFF;

/// Smallest payload, in 32-bit words, a link packet can carry.
pub const MIN_PAYLOAD_WORDS: u32 = 1;
