//! Layer configuration parsing and validation.
//!
//! The layer configuration is a JSON list of source entries, each holding
//! either a catalog source (`agsSource`) or a map-service source
//! (`wmsSource`). The text may carry `//` and `/* */` comments.
//!
//! # Example
//!
//! ```ignore
//! use layertree::config::parse_layer_config;
//! use layertree::host::TracingHost;
//!
//! let entries = parse_layer_config(&text, &TracingHost);
//! ```

mod comments;
mod schema;
mod types;

pub use comments::strip_json_comments;
pub use schema::{validate, SchemaViolation};
pub use types::{
    catalog_service_url, catalog_service_urls, CatalogFolder, CatalogService, CatalogSource,
    MapServiceSource, SourceDescriptor, SourceEntry,
};

use crate::error::ConfigError;
use crate::host::Host;

/// Name of the configuration file used in error messages.
pub const LAYER_CONFIG_FILE_NAME: &str = "layers.json";

/// Parses and validates configuration text.
///
/// Comments are stripped, the JSON is parsed, checked against the schema and
/// then mapped onto [`SourceEntry`] values.
pub fn parse_config(text: &str) -> Result<Vec<SourceEntry>, ConfigError> {
    let json = strip_json_comments(text);
    let document: serde_json::Value = serde_json::from_str(&json)?;

    validate(&document).map_err(|v| ConfigError::Schema {
        message: v.message,
        data_path: v.data_path,
    })?;

    serde_json::from_value(document).map_err(|e| ConfigError::Deserialize(e.to_string()))
}

/// Parses configuration text, reporting any failure to the host.
///
/// Returns `None` after reporting; never propagates the error.
pub fn parse_layer_config(text: &str, host: &dyn Host) -> Option<Vec<SourceEntry>> {
    match parse_config(text) {
        Ok(entries) => {
            tracing::debug!(sources = entries.len(), "Layer configuration parsed");
            Some(entries)
        }
        Err(e) => {
            host.error(
                "",
                &format!("Error in config file {}: {}", LAYER_CONFIG_FILE_NAME, e),
            );
            None
        }
    }
}
