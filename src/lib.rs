//! VAPI bridge library
//!
//! Exposes the CLI, configuration, and metrics wiring for integration testing.

pub mod cli;
pub mod config;
pub mod metrics;

pub use config::BridgeConfig;
