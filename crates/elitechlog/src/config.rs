//! Configuration file support for elitechlog.
//!
//! Loads `elitechlog.toml` from the user configuration directory, or from
//! the path given with `--config`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use elitechlog_logging::LogFormat;

/// User-level configuration loaded from `elitechlog.toml`
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Reading database; defaults to the platform data directory
    pub db_file: Option<PathBuf>,
    /// Diagnostic log level (`RUST_LOG` still wins)
    pub log_level: Option<String>,
    /// Progress output format
    pub log_format: Option<LogFormat>,
    /// Additional JSON diagnostic log file
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub transports: TransportConfig,
    #[serde(default)]
    pub chart: ChartConfig,
}

/// Where each adapter finds its device
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// Snapshot file served as the COM device
    pub com: Option<PathBuf>,
    /// Snapshot file served as the USB device
    pub usb: Option<PathBuf>,
    /// Readings per download progress step
    pub download_chunk: Option<usize>,
}

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChartConfig {
    pub height: Option<usize>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "elitechlog.toml";

impl Config {
    /// Default location, `<config dir>/elitechlog/elitechlog.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("elitechlog").join(CONFIG_FILE_NAME))
    }

    /// Load configuration from `path`.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Some(config))
    }

    /// Load from an explicit path, or from the default location.
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path)?
                .with_context(|| format!("Config file {} not found", path.display())),
            None => match Self::default_path() {
                Some(path) => Ok(Self::load(&path)?.unwrap_or_default()),
                None => Ok(Self::default()),
            },
        }
    }

    /// Database path: CLI flag, then config file, then the platform default.
    pub fn db_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.db_file.clone())
            .unwrap_or_else(elitechlog_db::Database::default_path)
    }
}
