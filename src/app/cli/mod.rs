//! Command-line interface: argument parsing and configuration merging.

pub mod args;
pub mod config;

pub use args::Args;
pub use config::{ConfigError, ConfigFile, ProbeOptions};
