use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::common::BridgeError;
use crate::soc::devices::msi::MSI_SIZE;

const FIFO_DEPTH: usize = 32;
const READ_TIME: u32 = 128;
const WRITE_TIME: u32 = 128;
const HOST_BUFFER_WORDS: usize = 4096;

const DEPACKETIZER_TIMEOUT: u32 = 1024;
const MAX_PAYLOAD_WORDS: u32 = 1024;
const STREAM_DEPTH: usize = 4;

const ETHERBONE_TAG: u8 = 0;
const TLP_TAG: u8 = 1;

const TLP_FIFO_DEPTH: usize = 512;

const SRAM_BASE: u64 = 0x1000_0000;
const SRAM_SIZE: u64 = 0x8000;
const MSI_BASE: u64 = 0xe000_8000;

/// Size of the Wishbone address space, in bytes.
const WISHBONE_SPACE: u64 = 1 << 32;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub core: CoreConfig,
    #[serde(default)]
    pub tlp: TlpConfig,
    #[serde(default)]
    pub etherbone: EtherboneConfig,
}

impl Config {
    /// Parses and validates a TOML configuration.
    pub fn from_toml_str(content: &str) -> Result<Self, BridgeError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BridgeError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Rejects values that cannot describe a working system.
    ///
    /// A duplicate port tag is reported as [`BridgeError::DuplicatePort`], the
    /// same error the crossbar raises at registration.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.general.system_ticks_per_link_tick == 0 {
            return Err(BridgeError::InvalidConfig(
                "general.system_ticks_per_link_tick must be at least 1".to_string(),
            ));
        }
        if self.link.fifo_depth < 2 {
            return Err(BridgeError::InvalidConfig(
                "link.fifo_depth must be at least 2".to_string(),
            ));
        }
        if self.link.host_buffer_words == 0 {
            return Err(BridgeError::InvalidConfig(
                "link.host_buffer_words must not be zero".to_string(),
            ));
        }
        if self.core.stream_depth == 0 {
            return Err(BridgeError::InvalidConfig(
                "core.stream_depth must not be zero".to_string(),
            ));
        }
        if self.core.max_payload_words == 0 {
            return Err(BridgeError::InvalidConfig(
                "core.max_payload_words must not be zero".to_string(),
            ));
        }
        if self.tlp.fifo_depth == 0 {
            return Err(BridgeError::InvalidConfig(
                "tlp.fifo_depth must not be zero".to_string(),
            ));
        }
        if self.core.ports.etherbone == self.core.ports.tlp {
            return Err(BridgeError::DuplicatePort(self.core.ports.tlp));
        }
        self.etherbone.validate()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    /// Log every word crossing a component boundary.
    #[serde(default)]
    pub trace: bool,

    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// System-domain ticks evaluated per link-domain tick.
    #[serde(default = "default_ratio")]
    pub system_ticks_per_link_tick: u32,
}

impl GeneralConfig {
    /// Per-word tracing, forced on by the `always-trace` feature.
    pub fn trace_enabled(&self) -> bool {
        self.trace || cfg!(feature = "always-trace")
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace: false,
            max_ticks: default_max_ticks(),
            system_ticks_per_link_tick: default_ratio(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    /// Capacity of each cross-domain FIFO, in words.
    #[serde(default = "default_fifo_depth")]
    pub fifo_depth: usize,

    /// Receive-window limit in link ticks; 0 disables the limit.
    #[serde(default = "default_read_time")]
    pub read_time: u32,

    /// Transmit-window limit in link ticks; 0 disables the limit.
    #[serde(default = "default_write_time")]
    pub write_time: u32,

    #[serde(default = "default_host_buffer")]
    pub host_buffer_words: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            fifo_depth: FIFO_DEPTH,
            read_time: READ_TIME,
            write_time: WRITE_TIME,
            host_buffer_words: HOST_BUFFER_WORDS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CoreConfig {
    /// Ticks without an incoming word before a partial frame is dropped; 0 disables.
    #[serde(default = "default_depacketizer_timeout")]
    pub depacketizer_timeout: u32,

    #[serde(default = "default_max_payload")]
    pub max_payload_words: u32,

    /// Depth of the channels between core components.
    #[serde(default = "default_stream_depth")]
    pub stream_depth: usize,

    #[serde(default)]
    pub ports: PortMap,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            depacketizer_timeout: DEPACKETIZER_TIMEOUT,
            max_payload_words: MAX_PAYLOAD_WORDS,
            stream_depth: STREAM_DEPTH,
            ports: PortMap::default(),
        }
    }
}

/// Crossbar destination tags of the built-in consumers.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PortMap {
    #[serde(default = "default_etherbone_tag")]
    pub etherbone: u8,

    #[serde(default = "default_tlp_tag")]
    pub tlp: u8,
}

impl Default for PortMap {
    fn default() -> Self {
        Self {
            etherbone: ETHERBONE_TAG,
            tlp: TLP_TAG,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TlpConfig {
    /// Depth of the TLP sender's buffer, in 64-bit beats.
    #[serde(default = "default_tlp_fifo_depth")]
    pub fifo_depth: usize,

    /// Answer memory reads from the endpoint's memory model.
    #[serde(default = "default_true")]
    pub auto_complete: bool,

    #[serde(default = "default_completer_id")]
    pub completer_id: u16,
}

impl Default for TlpConfig {
    fn default() -> Self {
        Self {
            fifo_depth: TLP_FIFO_DEPTH,
            auto_complete: true,
            completer_id: default_completer_id(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EtherboneConfig {
    #[serde(default = "default_sram_base")]
    pub sram_base: String,

    #[serde(default = "default_sram_size")]
    pub sram_size: String,

    #[serde(default = "default_msi_base")]
    pub msi_base: String,
}

impl Default for EtherboneConfig {
    fn default() -> Self {
        Self {
            sram_base: default_sram_base(),
            sram_size: default_sram_size(),
            msi_base: default_msi_base(),
        }
    }
}

impl EtherboneConfig {
    pub fn sram_base_val(&self) -> Result<u64, BridgeError> {
        parse_hex("etherbone.sram_base", &self.sram_base)
    }

    pub fn sram_size_val(&self) -> Result<u64, BridgeError> {
        parse_hex("etherbone.sram_size", &self.sram_size)
    }

    pub fn msi_base_val(&self) -> Result<u64, BridgeError> {
        parse_hex("etherbone.msi_base", &self.msi_base)
    }

    /// Checks that both devices fit the 32-bit Wishbone space without
    /// overlapping.
    fn validate(&self) -> Result<(), BridgeError> {
        let sram_base = self.sram_base_val()?;
        let sram_size = self.sram_size_val()?;
        let msi_base = self.msi_base_val()?;

        if sram_size == 0 || sram_size % 4 != 0 {
            return Err(BridgeError::InvalidConfig(
                "etherbone.sram_size must be a non-zero multiple of 4".to_string(),
            ));
        }
        if sram_base % 4 != 0 || msi_base % 4 != 0 {
            return Err(BridgeError::InvalidConfig(
                "etherbone base addresses must be word aligned".to_string(),
            ));
        }
        let sram_end = region_end("etherbone.sram", sram_base, sram_size)?;
        let msi_end = region_end("etherbone.msi", msi_base, MSI_SIZE)?;
        if sram_base < msi_end && msi_base < sram_end {
            return Err(BridgeError::InvalidConfig(format!(
                "etherbone.sram ({:#x}..{:#x}) overlaps etherbone.msi ({:#x}..{:#x})",
                sram_base, sram_end, msi_base, msi_end
            )));
        }
        Ok(())
    }
}

fn region_end(name: &str, base: u64, size: u64) -> Result<u64, BridgeError> {
    match base.checked_add(size) {
        Some(end) if end <= WISHBONE_SPACE => Ok(end),
        _ => Err(BridgeError::InvalidConfig(format!(
            "{} ({:#x} + {:#x}) exceeds the 32-bit Wishbone space",
            name, base, size
        ))),
    }
}

fn parse_hex(name: &str, s: &str) -> Result<u64, BridgeError> {
    let digits = s.trim_start_matches("0x");
    u64::from_str_radix(digits, 16).map_err(|e| {
        BridgeError::InvalidConfig(format!("{} is not a hex address ({:?}): {}", name, s, e))
    })
}

fn default_max_ticks() -> u64 {
    1_000_000
}

fn default_ratio() -> u32 {
    1
}

fn default_fifo_depth() -> usize {
    FIFO_DEPTH
}

fn default_read_time() -> u32 {
    READ_TIME
}

fn default_write_time() -> u32 {
    WRITE_TIME
}

fn default_host_buffer() -> usize {
    HOST_BUFFER_WORDS
}

fn default_depacketizer_timeout() -> u32 {
    DEPACKETIZER_TIMEOUT
}

fn default_max_payload() -> u32 {
    MAX_PAYLOAD_WORDS
}

fn default_stream_depth() -> usize {
    STREAM_DEPTH
}

fn default_etherbone_tag() -> u8 {
    ETHERBONE_TAG
}

fn default_tlp_tag() -> u8 {
    TLP_TAG
}

fn default_tlp_fifo_depth() -> usize {
    TLP_FIFO_DEPTH
}

fn default_true() -> bool {
    true
}

fn default_completer_id() -> u16 {
    0x0100
}

fn default_sram_base() -> String {
    format!("{:#x}", SRAM_BASE)
}

fn default_sram_size() -> String {
    format!("{:#x}", SRAM_SIZE)
}

fn default_msi_base() -> String {
    format!("{:#x}", MSI_BASE)
}
