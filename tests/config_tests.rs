//! Tests for configuration loading and validation.

use pcie_injector::common::BridgeError;
use pcie_injector::config::Config;

/// Tests that the built-in defaults describe a working system.
#[test]
fn test_default_config_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.link.fifo_depth, 32);
    assert_eq!(config.core.ports.etherbone, 0);
    assert_eq!(config.core.ports.tlp, 1);
    assert_eq!(config.general.system_ticks_per_link_tick, 1);
}

/// Tests that the shipped configuration file parses and matches the defaults.
#[test]
fn test_shipped_config() {
    let config = Config::from_toml_str(include_str!("../configs/default.toml")).unwrap();
    let defaults = Config::default();
    assert_eq!(config.link.read_time, defaults.link.read_time);
    assert_eq!(config.link.write_time, defaults.link.write_time);
    assert_eq!(config.core.depacketizer_timeout, defaults.core.depacketizer_timeout);
    assert_eq!(config.tlp.completer_id, defaults.tlp.completer_id);
    assert_eq!(
        config.etherbone.sram_base_val().unwrap(),
        defaults.etherbone.sram_base_val().unwrap()
    );
}

/// Tests that omitted sections and keys fall back to their defaults.
#[test]
fn test_partial_config() {
    let config = Config::from_toml_str(
        r#"
        [link]
        read_time = 0
        write_time = 16

        [core.ports]
        tlp = 7
        "#,
    )
    .unwrap();
    assert_eq!(config.link.read_time, 0);
    assert_eq!(config.link.write_time, 16);
    assert_eq!(config.link.fifo_depth, 32);
    assert_eq!(config.core.ports.etherbone, 0);
    assert_eq!(config.core.ports.tlp, 7);
    assert!(config.tlp.auto_complete);
}

/// Tests rejection of values that cannot describe a working system.
#[test]
fn test_invalid_values() {
    let cases = [
        "[general]\nsystem_ticks_per_link_tick = 0",
        "[link]\nfifo_depth = 1",
        "[link]\nhost_buffer_words = 0",
        "[core]\nstream_depth = 0",
        "[core]\nmax_payload_words = 0",
        "[tlp]\nfifo_depth = 0",
        "[etherbone]\nsram_size = \"0x6\"",
    ];
    for case in cases {
        assert!(
            matches!(
                Config::from_toml_str(case),
                Err(BridgeError::InvalidConfig(_))
            ),
            "accepted: {}",
            case
        );
    }
}

/// Tests that two consumers on one tag are reported as a duplicate port.
#[test]
fn test_duplicate_tags() {
    let result = Config::from_toml_str("[core.ports]\netherbone = 3\ntlp = 3");
    assert!(matches!(result, Err(BridgeError::DuplicatePort(3))));
}

/// Tests that a syntax error surfaces as a parse error.
#[test]
fn test_parse_error() {
    let result = Config::from_toml_str("[link\nfifo_depth = 4");
    assert!(matches!(result, Err(BridgeError::ConfigParse(_))));
}

/// Tests that a missing file surfaces as an i/o error.
#[test]
fn test_missing_file() {
    let result = Config::load("does/not/exist.toml");
    assert!(matches!(result, Err(BridgeError::Io(_))));
}

/// Tests hex address parsing with and without the prefix.
#[test]
fn test_hex_addresses() {
    let config = Config::from_toml_str(
        r#"
        [etherbone]
        sram_base = "20000000"
        msi_base = "0xE0009000"
        "#,
    )
    .unwrap();
    assert_eq!(config.etherbone.sram_base_val().unwrap(), 0x2000_0000);
    assert_eq!(config.etherbone.msi_base_val().unwrap(), 0xE000_9000);
    assert_eq!(config.etherbone.sram_size_val().unwrap(), 0x8000);
}

/// Tests that an address that is not hex is rejected instead of defaulted.
#[test]
fn test_bad_hex_address() {
    let result = Config::from_toml_str(
        r#"
        [etherbone]
        sram_base = "banana"
        "#,
    );
    assert!(matches!(result, Err(BridgeError::InvalidConfig(msg)) if msg.contains("sram_base")));
}

/// Tests that device windows must fit the 32-bit Wishbone space.
#[test]
fn test_address_space_bounds() {
    for (base, size) in [
        ("0x100000000", "0x100"),
        ("0xfffffffc", "0x8"),
        ("0xffffffffffffff00", "0x200"),
    ] {
        let toml = format!(
            "[etherbone]\nsram_base = \"{}\"\nsram_size = \"{}\"\n",
            base, size
        );
        assert!(matches!(
            Config::from_toml_str(&toml),
            Err(BridgeError::InvalidConfig(_))
        ));
    }

    let config = Config::from_toml_str(
        r#"
        [etherbone]
        sram_base = "0xffff0000"
        sram_size = "0x10000"
        "#,
    )
    .unwrap();
    assert_eq!(config.etherbone.sram_base_val().unwrap(), 0xFFFF_0000);
}

/// Tests that the SRAM and the MSI controller may not share addresses.
#[test]
fn test_overlapping_devices() {
    let result = Config::from_toml_str(
        r#"
        [etherbone]
        sram_base = "0xe0000000"
        sram_size = "0x10000"
        msi_base = "0xe0008000"
        "#,
    );
    assert!(matches!(result, Err(BridgeError::InvalidConfig(msg)) if msg.contains("overlaps")));

    let result = Config::from_toml_str(
        r#"
        [etherbone]
        sram_base = "0xe0000000"
        sram_size = "0x8000"
        msi_base = "0xe0008000"
        "#,
    );
    assert!(result.is_ok());
}
