//! Command-line arguments
//!
//! Scalar options are Option-typed so a TOML configuration file can fill
//! anything left unset; hard defaults are applied last when resolving into
//! `ProbeOptions` (see `config.rs`).

use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "mqprobe")]
#[command(about = "Message-queue delivery latency probe")]
#[command(version)]
pub struct Args {
    /// Queue to poll for messages
    #[arg(short = 'q', long = "queue", value_name = "NAME")]
    pub queue: Option<String>,

    /// Number of worker threads polling the queue
    #[arg(short = 't', long = "threads", value_name = "COUNT")]
    pub threads: Option<usize>,

    /// Per-attempt poll timeout in milliseconds
    #[arg(short = 'w', long = "poll-timeout", value_name = "MS")]
    pub poll_timeout_ms: Option<u64>,

    /// Interval between generated loopback messages in milliseconds
    #[arg(long = "produce-interval", value_name = "MS")]
    pub produce_interval_ms: Option<u64>,

    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "json"])]
    pub log_format: Option<String>,

    /// Force colored output
    #[arg(long = "color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Decrease log verbosity (repeatable)
    #[arg(long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,
}

impl Args {
    /// Net verbosity from the -v/--quiet counters.
    pub fn verbosity(&self) -> i8 {
        self.verbose as i8 - self.quiet as i8
    }
}
