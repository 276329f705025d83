//! `AppConfig` struct and TOML read/write.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use url::Url;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default number of signals on the dashboard.
const DEFAULT_RECENT_SIGNALS: usize = 5;

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Remote service endpoints.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Dashboard settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Export settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// Remote channel/signal service settings.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Channel list/create endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels_url: Option<String>,
    /// Signal list/delete/ingest endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signals_url: Option<String>,
    /// Scrape trigger endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_url: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Dashboard settings.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Number of signals in the "recent" list.
    #[serde(default = "default_recent_signals")]
    pub recent_signals: usize,
}

/// Export settings.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ExportConfig {
    /// Directory for dashboard exports (default: current directory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_recent_signals() -> usize {
    DEFAULT_RECENT_SIGNALS
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            channels_url: None,
            signals_url: None,
            scrape_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_signals: DEFAULT_RECENT_SIGNALS,
        }
    }
}

impl ServiceConfig {
    /// Parses the channel endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not set or invalid.
    pub fn channels_endpoint(&self) -> Result<Url> {
        parse_endpoint("channels_url", self.channels_url.as_deref())
    }

    /// Parses the signal endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not set or invalid.
    pub fn signals_endpoint(&self) -> Result<Url> {
        parse_endpoint("signals_url", self.signals_url.as_deref())
    }

    /// Parses the scrape endpoint, if configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is set but invalid.
    pub fn scrape_endpoint(&self) -> Result<Option<Url>> {
        self.scrape_url
            .as_deref()
            .map(|raw| parse_endpoint("scrape_url", Some(raw)))
            .transpose()
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Checks that the timeout is at least one second.
    ///
    /// # Errors
    ///
    /// Returns an error if `timeout_secs` is 0.
    pub fn check_timeout(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("service.timeout_secs must be at least 1");
        }
        Ok(())
    }
}

/// Parses a configured endpoint URL.
fn parse_endpoint(key: &str, value: Option<&str>) -> Result<Url> {
    let raw = value.with_context(|| {
        format!(
            "service.{key} is not set; run `tgsignal config set --{}`",
            key.replace('_', "-")
        )
    })?;
    Url::parse(raw).with_context(|| format!("service.{key} is not a valid URL: {raw}"))
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if `service.timeout_secs` is 0.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config
            .service
            .check_timeout()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Directory for dashboard exports.
    #[must_use]
    pub fn export_dir(&self) -> PathBuf {
        self.export
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
