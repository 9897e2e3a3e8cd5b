//! Shared setup for commands: settings, logging and file access.

use std::fs;
use std::path::{Path, PathBuf};

use layertree::config::{parse_config, SourceEntry};
use layertree::logging::{init_logging, LoggingGuard};
use layertree::settings::{default_settings_path, Settings};

use crate::error::CliError;

/// Holds settings and keeps logging alive for the duration of a command.
pub struct CliRunner {
    settings: Settings,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Loads settings (default location unless `settings_path` is given)
    /// and installs logging.
    pub fn new(settings_path: Option<&Path>) -> Result<Self, CliError> {
        let path = settings_path
            .map(Path::to_path_buf)
            .unwrap_or_else(default_settings_path);
        let settings = Settings::load(&path)?;
        let logging = init_logging(&settings.logging)?;

        tracing::debug!(settings = %path.display(), "Settings loaded");
        Ok(Self {
            settings,
            _logging: logging,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Logs the command being started.
    pub fn log_startup(&self, command: &str) {
        tracing::info!(
            command,
            version = env!("CARGO_PKG_VERSION"),
            "layertree starting"
        );
    }
}

/// Reads a layer configuration file as text.
pub fn read_config_text(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: PathBuf::from(path),
        source,
    })
}

/// Reads and validates a layer configuration file.
pub fn read_config(path: &Path) -> Result<Vec<SourceEntry>, CliError> {
    let text = read_config_text(path)?;
    Ok(parse_config(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_config_parses_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"wmsSource": {{"url": "https://x/wms", "folderTitle": "X", "layerIds": ["a"]}}}}]"#
        )
        .unwrap();

        let entries = read_config(file.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].wms_source.as_ref().unwrap().url, "https://x/wms");
    }

    #[test]
    fn test_read_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_config(&dir.path().join("layers.json")).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }

    #[test]
    fn test_read_config_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"wmsSource": {{}}}}]"#).unwrap();

        let err = read_config(file.path()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
