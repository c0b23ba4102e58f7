//! Settings for the bug reporter.
//!
//! Settings live in a TOML file, by default `settings.toml` under the
//! platform config directory:
//! - Linux: `~/.config/bug-reporter/`
//! - macOS: `~/Library/Application Support/bug-reporter/`
//! - Windows: `%APPDATA%\bug-reporter\`
//!
//! A missing file means the defaults; `settings --init` writes them out.
use crate::logging::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const APP_NAME: &str = "bug-reporter";
const SETTINGS_FILE: &str = "settings.toml";

/// Environment variable that overrides `backlog.api_key`.
pub const API_KEY_ENV: &str = "BACKLOG_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Missing setting `{0}`")]
    Missing(&'static str),

    #[error("Invalid setting `{name}`: {reason}")]
    Invalid {
        name: &'static str,
        reason: &'static str,
    },
}

/// All settings, as stored in the settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub backlog: BacklogSettings,
    #[serde(default)]
    pub screenshot: ScreenshotSettings,
}

/// Default values for new bug reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSettings {
    /// The version (milestone) the bug occurs in.
    #[serde(default)]
    pub current_version: String,

    /// Issue type used for every report.
    #[serde(default = "default_ticket_type")]
    pub ticket_type: String,

    #[serde(default = "default_priority")]
    pub priority: String,

    #[serde(default)]
    pub category: String,

    /// The person who triages incoming bug tickets.
    #[serde(default)]
    pub assignee: String,

    /// How many distinct log entries are kept for the report.
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

fn default_ticket_type() -> String {
    "Bug".to_string()
}

fn default_priority() -> String {
    "Normal".to_string()
}

fn default_log_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            current_version: String::new(),
            ticket_type: default_ticket_type(),
            priority: default_priority(),
            category: String::new(),
            assignee: String::new(),
            log_capacity: default_log_capacity(),
        }
    }
}

/// Where and how to reach Backlog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacklogSettings {
    /// The space key, the first label of `<space>.backlog.com`.
    #[serde(default)]
    pub space_key: String,

    /// `backlog.com` or `backlog.jp`.
    #[serde(default = "default_domain")]
    pub domain: String,

    #[serde(default)]
    pub project_key: String,

    #[serde(default)]
    pub api_key: String,
}

fn default_domain() -> String {
    "backlog.com".to_string()
}

impl Default for BacklogSettings {
    fn default() -> Self {
        Self {
            space_key: String::new(),
            domain: default_domain(),
            project_key: String::new(),
            api_key: String::new(),
        }
    }
}

impl BacklogSettings {
    /// The root URL of the space, e.g. `https://example.backlog.com`.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        if self.space_key.trim().is_empty() {
            return Err(ConfigError::Missing("backlog.space_key"));
        }
        Ok(format!("https://{}.{}", self.space_key.trim(), self.domain.trim()))
    }

    /// The API key, preferring the `BACKLOG_API_KEY` environment variable.
    pub fn resolved_api_key(&self) -> Result<String, ConfigError> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| Some(self.api_key.clone()).filter(|key| !key.trim().is_empty()))
            .ok_or(ConfigError::Missing("backlog.api_key"))
    }

    pub fn require_project_key(&self) -> Result<&str, ConfigError> {
        let key = self.project_key.trim();
        if key.is_empty() {
            return Err(ConfigError::Missing("backlog.project_key"));
        }
        Ok(key)
    }
}

/// The external command used to take screenshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenshotSettings {
    /// Program and arguments; `{path}` is replaced with the output file.
    /// An empty command disables screenshots.
    #[serde(default)]
    pub command: Vec<String>,

    /// Directory screenshots are written to, the working directory if unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for ScreenshotSettings {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            directory: None,
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Settings {
    /// The default settings path inside the platform config directory.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join(APP_NAME).join(SETTINGS_FILE))
    }

    /// Loads the settings at `path`, using the defaults if the file does not
    /// exist. Nothing is written.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Loads the settings at `path`, writing the defaults there first if the
    /// file does not exist. Returns the settings and whether the file was
    /// created.
    pub fn load_or_create(path: &Path) -> Result<(Self, bool), ConfigError> {
        if path.exists() {
            return Ok((Self::load(path)?, false));
        }

        info!("Creating default settings at {}", path.display());
        let settings = Self::default();
        settings.save(path)?;
        Ok((settings, true))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.report.log_capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "report.log_capacity",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Writes the settings to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(io_error)
    }
}
