use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Args;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Persisted defaults, overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub target: String,
    pub interval_secs: f64,
    pub rtt_threshold_ms: u64,
    pub log_file: PathBuf,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            target: "8.8.8.8".to_string(),
            interval_secs: 1.0,
            rtt_threshold_ms: 100,
            log_file: PathBuf::from("ping_log.txt"),
        }
    }
}

impl Defaults {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("PingWatch").join("config.json"))
    }

    /// Load from the user config directory, falling back to built-in values.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Defaults>(&content) {
                Ok(defaults) => defaults,
                Err(e) => {
                    log::warn!("Failed to parse {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {e}", path.display());
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeBackend {
    /// Spawn the platform `ping` command.
    #[default]
    System,
    /// Send echo requests from this process.
    Icmp,
}

/// Immutable settings for one monitoring session.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub target: String,
    pub interval: Duration,
    pub rtt_threshold_ms: u64,
    pub max_pings: Option<u64>,
    pub log_file: PathBuf,
    pub probe_timeout: Duration,
    pub backend: ProbeBackend,
}

impl MonitorConfig {
    pub fn new(target: impl Into<String>) -> Self {
        let defaults = Defaults::default();
        Self {
            target: target.into(),
            interval: Duration::from_secs_f64(defaults.interval_secs),
            rtt_threshold_ms: defaults.rtt_threshold_ms,
            max_pings: None,
            log_file: defaults.log_file,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            backend: ProbeBackend::default(),
        }
    }

    /// Layer command-line flags over persisted defaults.
    pub fn from_args(args: &Args, defaults: &Defaults) -> Result<Self, String> {
        let interval_secs = args.interval.unwrap_or(defaults.interval_secs);
        let interval = positive_duration(interval_secs)
            .ok_or_else(|| format!("Interval must be positive, got {interval_secs}"))?;
        let probe_timeout = positive_duration(args.timeout)
            .ok_or_else(|| format!("Timeout must be positive, got {}", args.timeout))?;

        let target = args
            .server
            .clone()
            .unwrap_or_else(|| defaults.target.clone());
        if target.trim().is_empty() {
            return Err("Target host cannot be empty".into());
        }

        Ok(Self {
            target,
            interval,
            rtt_threshold_ms: args.limit.unwrap_or(defaults.rtt_threshold_ms),
            max_pings: args.count,
            log_file: args
                .log
                .clone()
                .unwrap_or_else(|| defaults.log_file.clone()),
            probe_timeout,
            backend: if args.icmp {
                ProbeBackend::Icmp
            } else {
                ProbeBackend::System
            },
        })
    }

    /// Number of 100 ms polling slices that make up one probe interval.
    pub fn idle_slices(&self) -> u64 {
        (self.interval.as_secs_f64() * 10.0) as u64
    }
}

fn positive_duration(secs: f64) -> Option<Duration> {
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}
