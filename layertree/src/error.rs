//! Error types shared across the crate.

use std::fmt;

use thiserror::Error;

/// Errors produced while turning configuration text into source descriptors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The text is not valid JSON once comments are stripped.
    #[error("{0}")]
    Parse(String),

    /// The JSON does not match the layer configuration schema.
    #[error("{message} (data path: {data_path})")]
    Schema { message: String, data_path: String },

    /// Schema-valid JSON could not be mapped onto the descriptor types.
    #[error("{0}")]
    Deserialize(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

/// A source entry that declares neither or both of the known source variants.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Schema error. Must have a single agsSource or wmsSource in each object.")]
pub struct SourceShapeError;

/// Details of a failed request for one source URL.
///
/// Reported through [`LoadReporter::failed`](crate::loader::LoadReporter::failed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadFailure {
    /// Pending-set URL the failure belongs to.
    pub url: String,
    /// Transport or HTTP status text (e.g. "error", "HTTP 404").
    pub status: String,
    /// Error detail from the client or parser.
    pub detail: String,
    /// Raw response body, if any was received.
    pub response: String,
}

impl LoadFailure {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = response.into();
        self
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = if self.response.is_empty() {
            &self.url
        } else {
            &self.response
        };
        write!(
            f,
            "Request to load layer source failed: '{}' Status: '{}' Error: '{}'",
            response, self.status, self.detail
        )
    }
}

impl std::error::Error for LoadFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display_includes_path() {
        let err = ConfigError::Schema {
            message: "Missing required property: url".to_string(),
            data_path: "/0/wmsSource".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required property: url (data path: /0/wmsSource)"
        );
    }

    #[test]
    fn test_load_failure_display_prefers_response() {
        let failure = LoadFailure::new("https://x/wms")
            .with_status("HTTP 500")
            .with_detail("Internal Server Error")
            .with_response("<html>oops</html>");
        let text = failure.to_string();
        assert!(text.contains("'<html>oops</html>'"));
        assert!(text.contains("Status: 'HTTP 500'"));
        assert!(text.contains("Error: 'Internal Server Error'"));
    }

    #[test]
    fn test_load_failure_display_falls_back_to_url() {
        let failure = LoadFailure::new("https://x/wms").with_status("error");
        assert!(failure.to_string().contains("'https://x/wms'"));
    }

    #[test]
    fn test_source_shape_error_message() {
        assert!(SourceShapeError
            .to_string()
            .contains("Must have a single agsSource or wmsSource"));
    }
}
