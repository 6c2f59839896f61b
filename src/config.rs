use crate::parser::ParserKind;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration loaded from llmwatch.toml.
///
/// Loaded exactly once by the entry point and handed to core operations as
/// plain parameters; nothing below main reads configuration itself.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub observer: ObserverConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// The gateway log file to read.
    pub source: PathBuf,
    /// Follow-mode wait between polls, in seconds.
    pub poll_interval_secs: f64,
    /// Which line contract to run: `permissive` or `anchored`.
    pub parser: ParserKind,
    /// Default tracing filter; `RUST_LOG` and `--verbose` override it.
    pub log_level: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Destination for the JSONL export.
    pub path: PathBuf,
}

// --- Default implementations ---

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("logs/gateway.log"),
            poll_interval_secs: 1.0,
            parser: ParserKind::Permissive,
            log_level: "info".to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("export/records.jsonl"),
        }
    }
}

impl ObserverConfig {
    /// Poll wait as a `Duration`. Zero, negative, and non-finite intervals
    /// are configuration errors, not spin loops.
    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        if self.poll_interval_secs.is_finite() && self.poll_interval_secs > 0.0 {
            Ok(Duration::from_secs_f64(self.poll_interval_secs))
        } else {
            Err(ConfigError::InvalidPollInterval {
                value: self.poll_interval_secs,
            })
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidPollInterval {
        value: f64,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {}", path.display(), source)
            }
            ConfigError::InvalidPollInterval { value } => {
                write!(
                    f,
                    "poll interval must be a positive number of seconds, got {value}"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::InvalidPollInterval { .. } => None,
        }
    }
}

/// Load configuration from `path`.
///
/// `explicit` marks a path the user passed on the command line: that file
/// must exist. The default path is allowed to be absent, in which case the
/// built-in defaults apply.
pub fn load(path: &Path, explicit: bool) -> Result<WatchConfig, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(WatchConfig::default());
        }
        Err(e) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}
