//! tabpilot: permission-gated browser tool dispatch.
//!
//! The library half of the CLI crate: configuration loading, engine wiring
//! and the command-line front end. The engine itself lives in the
//! workspace crates.

pub mod cli;
pub mod config;
pub mod engine;

pub use config::{Config, ConfigError, LoadedConfig};
pub use engine::{BrowserPorts, Engine};
