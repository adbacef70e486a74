//! Simulation harness: host stream loading, runners and the built-in demo.

/// Built-in Etherbone and TLP exchange.
pub mod demo;

/// Host byte-stream loader.
pub mod loader;

/// Lockstep and threaded runners.
pub mod runner;
