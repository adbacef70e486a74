//! Host Stream Loader.
//!
//! This module reads raw host byte streams (captured USB traffic, or frames
//! produced by host tooling) from disk so they can be injected into the
//! host side of the link.

use log::info;
use std::fs;

use crate::common::BridgeError;
use crate::core::wire;

/// Loads a binary file from disk.
pub fn load_binary(path: &str) -> Result<Vec<u8>, BridgeError> {
    let data = fs::read(path)?;
    info!("[Loader] Read {} bytes from '{}'", data.len(), path);
    Ok(data)
}

/// Loads a host byte stream as link words.
///
/// Bytes are packed big-endian; a trailing partial word is zero-padded.
pub fn load_words(path: &str) -> Result<Vec<u32>, BridgeError> {
    Ok(wire::from_bytes(&load_binary(path)?))
}
