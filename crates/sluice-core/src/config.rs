//! Configuration system for Sluice.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $SLUICE_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/sluice/config.toml
//!   3. ~/.config/sluice/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default read-buffer size for a single datagram, in bytes.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 10_000;
/// Default relay queue capacity.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 1;
/// Largest UDP payload; a bigger read buffer can never be filled.
pub const MAX_BUFFER_SIZE: usize = 65_535;
/// Upper bound on relay queue capacity.
pub const MAX_IN_FLIGHT: usize = 1 << 20;
/// Default bind address when none is configured.
pub const DEFAULT_ADDRESS: &str = "0.0.0.0:4000";

/// Top-level configuration for the daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SluiceConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
}

/// Receiver configuration. Immutable once the input is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// host:port to bind.
    pub address: String,
    /// Datagram read-buffer size. Larger datagrams are truncated by the OS.
    pub max_buffer_size: usize,
    /// Relay queue capacity.
    pub max_in_flight: usize,
    /// SO_RCVBUF for the bound socket. None = OS default.
    pub socket_recv_buffer: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// How the daemon writes delivered messages to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Raw payload followed by a newline.
    #[default]
    Lines,
    /// One JSON object per message, payload and metadata included.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lines" => Ok(Self::Lines),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Invalid {
                field: "format",
                reason: format!("unknown output format {other:?}"),
            }),
        }
    }
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            socket_recv_buffer: None,
        }
    }
}

impl InputConfig {
    /// Config for `address` with every other field at its default.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn with_max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = size;
        self
    }

    pub fn with_max_in_flight(mut self, n: usize) -> Self {
        self.max_in_flight = n;
        self
    }

    /// Reject values the receiver cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "address",
                reason: "must not be empty".into(),
            });
        }
        if !(1..=MAX_BUFFER_SIZE).contains(&self.max_buffer_size) {
            return Err(ConfigError::Invalid {
                field: "max_buffer_size",
                reason: format!("must be between 1 and {MAX_BUFFER_SIZE}"),
            });
        }
        if !(1..=MAX_IN_FLIGHT).contains(&self.max_in_flight) {
            return Err(ConfigError::Invalid {
                field: "max_in_flight",
                reason: format!("must be between 1 and {MAX_IN_FLIGHT}"),
            });
        }
        if self.socket_recv_buffer == Some(0) {
            return Err(ConfigError::Invalid {
                field: "socket_recv_buffer",
                reason: "must be positive when set".into(),
            });
        }
        Ok(())
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
        .join("sluice")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl SluiceConfig {
    /// Load config: env vars → file → defaults.
    ///
    /// Only a missing file falls back to defaults. An unreadable or
    /// malformed file, or a malformed override, is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            SluiceConfig::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a config from TOML text. Missing sections fall back to defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::ParseFailed(PathBuf::from("<inline>"), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("SLUICE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Apply SLUICE_* overrides. `lookup` stands in for the process env.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup("SLUICE_INPUT__ADDRESS") {
            self.input.address = v;
        }
        if let Some(v) = lookup("SLUICE_INPUT__MAX_BUFFER_SIZE") {
            self.input.max_buffer_size = parse_override("max_buffer_size", &v)?;
        }
        if let Some(v) = lookup("SLUICE_INPUT__MAX_IN_FLIGHT") {
            self.input.max_in_flight = parse_override("max_in_flight", &v)?;
        }
        if let Some(v) = lookup("SLUICE_OUTPUT__FORMAT") {
            self.output.format = v.parse()?;
        }
        Ok(())
    }
}

fn parse_override(field: &'static str, value: &str) -> Result<usize, ConfigError> {
    value.parse().map_err(|e| ConfigError::Invalid {
        field,
        reason: format!("{value:?} is not a number: {e}"),
    })
}
