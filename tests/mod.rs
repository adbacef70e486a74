//! Test module organization.
//!
//! This module organizes all integration tests for the USB / PCIe bridge.

/// Link word channel and FIFO tests.
mod channel_tests;

/// Configuration loading and validation tests.
mod config_tests;

/// Destination crossbar routing and arbitration tests.
mod crossbar_tests;

/// Depacketizer resynchronization, timeout and delivery tests.
mod depacketizer_tests;



/// Packetizer and wire codec tests.
mod packetizer_tests;
