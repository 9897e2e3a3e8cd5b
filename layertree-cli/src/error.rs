//! CLI error type.

use std::fmt;
use std::path::PathBuf;

use layertree::error::ConfigError;
use layertree::loader::HttpError;
use layertree::logging::LoggingError;
use layertree::settings::SettingsError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Settings file could not be loaded.
    Settings(SettingsError),
    /// Logging could not be initialized.
    Logging(LoggingError),
    /// A file could not be read.
    Io { path: PathBuf, source: std::io::Error },
    /// The layer configuration is invalid.
    Config(ConfigError),
    /// The HTTP client could not be created.
    Http(HttpError),
    /// The async runtime could not be started.
    Runtime(std::io::Error),
    /// The load session did not complete in time.
    Timeout { secs: u64, pending: Vec<String> },
    /// The load session ended without producing a tree.
    Incomplete,
    /// The tree could not be written as JSON.
    Output(serde_json::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Settings(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "{}", e),
            CliError::Io { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            CliError::Config(e) => write!(f, "Invalid layer configuration: {}", e),
            CliError::Http(e) => write!(f, "{}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Timeout { secs, pending } => {
                write!(
                    f,
                    "Layer sources did not finish loading within {}s ({} pending",
                    secs,
                    pending.len()
                )?;
                if !pending.is_empty() {
                    write!(f, ": {}", pending.join(", "))?;
                }
                write!(f, ")")
            }
            CliError::Incomplete => write!(f, "Load session ended without a layer tree"),
            CliError::Output(e) => write!(f, "Failed to serialize layer tree: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Settings(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Io { source, .. } => Some(source),
            CliError::Config(e) => Some(e),
            CliError::Http(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Output(e) => Some(e),
            CliError::Timeout { .. } | CliError::Incomplete => None,
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(e: SettingsError) -> Self {
        CliError::Settings(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<HttpError> for CliError {
    fn from(e: HttpError) -> Self {
        CliError::Http(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e)
    }
}
