//! TOML configuration file loading and option resolution
//!
//! Resolution order for every option: command line, then the config file,
//! then the built-in default. An explicitly named config file must exist;
//! the default location is used only when present.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::args::Args;

pub const DEFAULT_QUEUE: &str = "DEV.LATENCY.PROBE";
pub const DEFAULT_THREADS: usize = 1;
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 100;
pub const DEFAULT_PRODUCE_INTERVAL_MS: u64 = 25;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("the specified configuration file does not exist: {0}")]
    Missing(PathBuf),
    #[error("cannot read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Options as they appear in mqprobe.toml. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub queue: Option<String>,
    pub threads: Option<usize>,
    pub poll_timeout_ms: Option<u64>,
    pub produce_interval_ms: Option<u64>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFile {
    /// Load the explicit config file, or the default
    /// `<config_dir>/mqprobe/mqprobe.toml` when one exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::Missing(path.to_path_buf()));
                }
                path.to_path_buf()
            }
            None => {
                let default_path =
                    dirs::config_dir().map(|d| d.join("mqprobe").join("mqprobe.toml"));
                match default_path {
                    Some(path) if path.exists() => path,
                    _ => return Ok(Self::default()),
                }
            }
        };

        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }
}

/// Fully-resolved run options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub queue: String,
    pub threads: usize,
    pub poll_timeout: Duration,
    pub produce_interval: Duration,
}

impl ProbeOptions {
    pub fn resolve(args: &Args, config: &ConfigFile) -> Result<Self, ConfigError> {
        let queue = args
            .queue
            .clone()
            .or_else(|| config.queue.clone())
            .unwrap_or_else(|| DEFAULT_QUEUE.to_string());
        let threads = args.threads.or(config.threads).unwrap_or(DEFAULT_THREADS);
        let poll_timeout_ms = args
            .poll_timeout_ms
            .or(config.poll_timeout_ms)
            .unwrap_or(DEFAULT_POLL_TIMEOUT_MS);
        let produce_interval_ms = args
            .produce_interval_ms
            .or(config.produce_interval_ms)
            .unwrap_or(DEFAULT_PRODUCE_INTERVAL_MS);

        if queue.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "queue name must not be empty".to_string(),
            ));
        }
        if threads == 0 {
            return Err(ConfigError::Invalid(
                "thread count must be at least 1".to_string(),
            ));
        }
        if poll_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll timeout must be at least 1ms".to_string(),
            ));
        }
        if produce_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "produce interval must be at least 1ms".to_string(),
            ));
        }

        Ok(Self {
            queue,
            threads,
            poll_timeout: Duration::from_millis(poll_timeout_ms),
            produce_interval: Duration::from_millis(produce_interval_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_resolve_falls_back_to_defaults() {
        let options = ProbeOptions::resolve(&args(&["mqprobe"]), &ConfigFile::default()).unwrap();
        assert_eq!(options.queue, DEFAULT_QUEUE);
        assert_eq!(options.threads, DEFAULT_THREADS);
        assert_eq!(options.poll_timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_command_line_wins_over_config_file() {
        let config = ConfigFile {
            queue: Some("CONFIG.Q".to_string()),
            threads: Some(8),
            ..ConfigFile::default()
        };
        let options =
            ProbeOptions::resolve(&args(&["mqprobe", "-q", "CLI.Q"]), &config).unwrap();
        assert_eq!(options.queue, "CLI.Q");
        // Not given on the command line, so the config value applies.
        assert_eq!(options.threads, 8);
    }

    #[test]
    fn test_zero_threads_is_rejected() {
        let result = ProbeOptions::resolve(&args(&["mqprobe", "-t", "0"]), &ConfigFile::default());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_poll_timeout_is_rejected() {
        let result = ProbeOptions::resolve(
            &args(&["mqprobe", "--poll-timeout", "0"]),
            &ConfigFile::default(),
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_blank_queue_name_is_rejected() {
        let config = ConfigFile {
            queue: Some("   ".to_string()),
            ..ConfigFile::default()
        };
        let result = ProbeOptions::resolve(&args(&["mqprobe"]), &config);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_parses_a_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mqprobe.toml");
        std::fs::write(
            &path,
            "queue = \"FILE.Q\"\nthreads = 3\npoll_timeout_ms = 50\n",
        )
        .unwrap();

        let config = ConfigFile::load(Some(&path)).unwrap();
        assert_eq!(config.queue.as_deref(), Some("FILE.Q"));
        assert_eq!(config.threads, Some(3));
        assert_eq!(config.poll_timeout_ms, Some(50));
    }

    #[test]
    fn test_load_reports_missing_explicit_file() {
        let result = ConfigFile::load(Some(Path::new("/no/such/mqprobe.toml")));
        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_load_reports_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mqprobe.toml");
        std::fs::write(&path, "queue = [unterminated").unwrap();

        let result = ConfigFile::load(Some(&path));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
