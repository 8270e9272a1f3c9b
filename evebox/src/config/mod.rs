//! Configuration management for EveBox reports
//!
//! Default config location: ~/.evebox/reports.toml

use crate::error::{Error, Result};
use crate::report::presets::Preset;
use crate::report::types::SortOrder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the EveBox API lives and how to talk to it
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_url")]
    pub url: String,
    /// Path of the aggregation endpoint, relative to `url`
    #[serde(default = "default_agg_path")]
    pub agg_path: String,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Skip TLS certificate verification (self-signed installs)
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_url() -> String {
    "http://127.0.0.1:5636".to_string()
}

fn default_agg_path() -> String {
    "api/1/report/agg".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            agg_path: default_agg_path(),
            timeout_ms: default_timeout_ms(),
            accept_invalid_certs: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    #[serde(default = "default_size")]
    pub default_size: usize,
    #[serde(default)]
    pub default_order: SortOrder,
    /// Additional presets; entries named like a built-in replace it
    #[serde(default)]
    pub presets: Vec<Preset>,
}

fn default_size() -> usize {
    crate::report::form::DEFAULT_SIZE
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_size: default_size(),
            default_order: SortOrder::Desc,
            presets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter string
    /// Override with RUST_LOG env var
    #[serde(default = "default_level")]
    pub level: String,
    /// Log output format: "pretty" or "json"
    /// Override with LOG_FORMAT env var
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_level() -> String {
    "warn,evebox=info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

/// Expand ~ to home directory in path
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Cannot determine home directory".into()))?;
        Ok(home.join(rest))
    } else if s == "~" {
        dirs::home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".into()))
    } else {
        Ok(path.to_path_buf())
    }
}

/// Default config file path (~/.evebox/reports.toml)
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".evebox")
        .join("reports.toml")
}

impl Config {
    /// Load config from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        Self::load_or_default(&default_config_path())
    }

    /// Load config from a file; the file must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let path = expand_tilde(path)?;
        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file if present, otherwise use defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        let path = expand_tilde(path)?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let path = expand_tilde(path)?;
        let content = self.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<()> {
        if self.server.url.trim().is_empty() {
            return Err(Error::Config("server.url must not be empty".into()));
        }
        if self.server.timeout_ms == 0 {
            return Err(Error::Config("server.timeout_ms must be positive".into()));
        }
        crate::report::form::parse_size(&self.report.default_size.to_string())
            .map_err(|e| Error::Config(format!("report.default_size: {}", e)))?;
        for preset in &self.report.presets {
            crate::report::form::validate_field(&preset.field)
                .map_err(|e| Error::Config(format!("preset '{}': {}", preset.name, e)))?;
            if let Some(size) = preset.size {
                crate::report::form::parse_size(&size.to_string())
                    .map_err(|e| Error::Config(format!("preset '{}': {}", preset.name, e)))?;
            }
        }
        Ok(())
    }
}
