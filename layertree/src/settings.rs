//! Application settings loaded from an INI file.
//!
//! ```ini
//! [tree]
//! css_class_prefix = pluginLayerSelector
//!
//! [http]
//! timeout_secs = 30
//!
//! [logging]
//! level = info
//! file = /var/log/layertree.log
//! ```
//!
//! Every key is optional; a missing file yields the defaults.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::loader::DEFAULT_TIMEOUT_SECS;
use crate::tree::DEFAULT_CSS_CLASS_PREFIX;

/// Default log filter when neither settings nor `RUST_LOG` provide one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file exists but could not be read or parsed.
    #[error("Failed to read settings from {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// A key holds a value of the wrong shape.
    #[error("Invalid value '{value}' for {section}.{key}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSettings {
    /// Prefix for node display classes (`<prefix>-folder`, `<prefix>-layer`).
    pub css_class_prefix: String,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            css_class_prefix: DEFAULT_CSS_CLASS_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `layertree=debug`.
    pub level: String,
    /// Optional log file; logs go to stderr only when unset.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

/// All application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub tree: TreeSettings,
    pub http: HttpSettings,
    pub logging: LoggingSettings,
}

/// Default settings file location (`<config dir>/layertree/config.ini`).
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("layertree")
        .join("config.ini")
}

impl Settings {
    /// Loads settings from `path`, returning defaults if the file is missing.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parses settings from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, SettingsError> {
        let ini = Ini::load_from_str(text).map_err(|e| SettingsError::Read {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        if let Some(prefix) = get(ini, "tree", "css_class_prefix") {
            settings.tree.css_class_prefix = prefix.to_string();
        }

        if let Some(value) = get(ini, "http", "timeout_secs") {
            settings.http.timeout_secs = value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| invalid("http", "timeout_secs", value))?;
        }

        if let Some(level) = get(ini, "logging", "level") {
            settings.logging.level = level.to_string();
        }
        if let Some(file) = get(ini, "logging", "file") {
            settings.logging.file = Some(PathBuf::from(file));
        }

        Ok(settings)
    }
}

fn get<'a>(ini: &'a Ini, section: &str, key: &str) -> Option<&'a str> {
    ini.section(Some(section))
        .and_then(|s| s.get(key))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str) -> SettingsError {
    SettingsError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    }
}
