//! Layertree - layer catalog aggregation for map viewers
//!
//! Reads a list of configured layer sources (ArcGIS catalogs and WMS
//! endpoints), loads each source's metadata concurrently and assembles
//! everything into one hierarchical tree of folders and toggleable layers.
//!
//! # Modules
//!
//! - [`config`] - layer configuration parsing and schema validation
//! - [`region`] - availability filtering by region key
//! - [`naming`] - unique top-level folder titles
//! - [`tree`] - the layer tree, its builder and visibility state
//! - [`loader`] - source loaders and their HTTP client
//! - [`manager`] - load session coordination
//! - [`settings`] / [`logging`] - application settings and log setup

pub mod config;
pub mod error;
pub mod host;
pub mod latch;
pub mod loader;
pub mod logging;
pub mod manager;
pub mod naming;
pub mod region;
pub mod settings;
pub mod tree;

pub use config::{parse_config, parse_layer_config, SourceEntry};
pub use error::{ConfigError, LoadFailure};
pub use host::{Host, TracingHost};
pub use manager::LayerManager;
pub use settings::Settings;
pub use tree::{LayerTree, MapHandle, ServiceState};
