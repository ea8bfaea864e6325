//! Application layer: CLI parsing, configuration and process startup.

pub mod cli;
pub mod startup;
