//! ArcGIS REST catalog loader.
//!
//! Loads the services listed in an `agsSource` entry. Every service URL is
//! requested as
//!
//! `{service url}/MapServer?f=json`
//!
//! and its `layers` array is turned into nodes:
//!
//! ```text
//! container
//! └── Hydro                folder (non-empty folder name only)
//!     └── Rivers           service, display name or service name
//!         ├── Streams      group layer (has subLayerIds)
//!         │   └── Creeks   leaf, layer id "2"
//!         └── Lakes        leaf, layer id "3"
//! ```
//!
//! ArcGIS answers some failures with status 200 and an `error` object in
//! the body; those are reported as failures like transport errors.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use tokio::runtime::Handle;

use super::{AsyncHttpClient, Inclusions, LoadContext, LoadReporter, ServiceToggle, SourceLoader};
use crate::config::{catalog_service_url, CatalogSource};
use crate::error::LoadFailure;
use crate::tree::{LayerTree, LeafConfig, NodeCapabilities, NodeId, TreeBuilder};

/// `parentLayerId` of top-level layers.
const NO_PARENT: i64 = -1;

#[derive(Debug, Deserialize)]
struct MapServerInfo {
    #[serde(default)]
    layers: Vec<MapServerLayer>,
    #[serde(default)]
    error: Option<ArcGisError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapServerLayer {
    id: i64,
    name: String,
    #[serde(default = "no_parent")]
    parent_layer_id: i64,
    #[serde(default)]
    sub_layer_ids: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
struct ArcGisError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

fn no_parent() -> i64 {
    NO_PARENT
}

impl MapServerLayer {
    fn is_group(&self) -> bool {
        self.sub_layer_ids.as_ref().is_some_and(|ids| !ids.is_empty())
    }
}

/// Loader for `agsSource` catalogs.
pub struct ArcGisCatalogLoader<C: AsyncHttpClient> {
    client: Arc<C>,
    runtime: Handle,
    source: CatalogSource,
}

impl<C: AsyncHttpClient> ArcGisCatalogLoader<C> {
    pub fn new(client: Arc<C>, runtime: Handle, source: CatalogSource) -> Self {
        Self {
            client,
            runtime,
            source,
        }
    }
}

impl<C: AsyncHttpClient> SourceLoader for ArcGisCatalogLoader<C> {
    fn load(&self, ctx: LoadContext) {
        let Inclusions::Folders(folders) = &ctx.inclusions else {
            tracing::warn!(url = %self.source.url, "Catalog loader received layer ids; nothing to load");
            return;
        };

        for folder in folders {
            let parent = if folder.name.is_empty() {
                ctx.container
            } else {
                ctx.tree
                    .create_container(&folder.name, "folder", ctx.container, None)
            };

            for service in &folder.services {
                let url = catalog_service_url(&self.source, folder, service);
                let title = service
                    .display_name
                    .clone()
                    .unwrap_or_else(|| service.name.clone());

                tracing::debug!(url = %url, title = %title, "Requesting map service metadata");
                self.runtime.spawn(load_service(
                    Arc::clone(&self.client),
                    ctx.tree.clone(),
                    ctx.reporter.clone(),
                    parent,
                    url,
                    title,
                ));
            }
        }
    }
}

async fn load_service<C: AsyncHttpClient>(
    client: Arc<C>,
    tree: TreeBuilder,
    reporter: LoadReporter,
    parent: NodeId,
    url: String,
    title: String,
) {
    let request_url = format!("{}/MapServer?f=json", url);
    let body = match client.get(&request_url).await {
        Ok(body) => body,
        Err(e) => {
            reporter.failed(e.into_failure(&url));
            return;
        }
    };

    match parse_map_server(&body) {
        Ok(layers) => {
            tree.write(|t| build_service(t, parent, &title, &url, &layers));
            reporter.succeeded(&url);
        }
        Err(detail) => {
            reporter.failed(
                LoadFailure::new(&url)
                    .with_status("parsererror")
                    .with_detail(detail)
                    .with_response(String::from_utf8_lossy(&body)),
            );
        }
    }
}

fn parse_map_server(body: &[u8]) -> Result<Vec<MapServerLayer>, String> {
    let info: MapServerInfo = serde_json::from_slice(body).map_err(|e| e.to_string())?;
    match info.error {
        Some(error) => Err(format!("ArcGIS error {}: {}", error.code, error.message)),
        None => Ok(info.layers),
    }
}

/// Adds a service container and its layer hierarchy under `parent`.
fn build_service(
    tree: &mut LayerTree,
    parent: NodeId,
    title: &str,
    url: &str,
    layers: &[MapServerLayer],
) {
    let service = tree.create_container(title, "service", parent, None);
    let toggle = Arc::new(ServiceToggle::new(url));
    let mut visited = HashSet::new();
    add_layers(tree, service, NO_PARENT, layers, &toggle, &mut visited);
}

/// Adds the layers whose parent is `parent_layer_id`, recursing into groups.
///
/// Each layer id is added at most once, so a response whose parent links
/// form a cycle still yields a finite tree.
fn add_layers(
    tree: &mut LayerTree,
    node: NodeId,
    parent_layer_id: i64,
    layers: &[MapServerLayer],
    toggle: &Arc<ServiceToggle>,
    visited: &mut HashSet<i64>,
) {
    for layer in layers.iter().filter(|l| l.parent_layer_id == parent_layer_id) {
        if !visited.insert(layer.id) {
            tracing::warn!(layer_id = layer.id, name = %layer.name, "Skipping layer already in the tree");
            continue;
        }
        if layer.is_group() {
            let group = tree.create_container(&layer.name, "group", node, None);
            add_layers(tree, group, layer.id, layers, toggle, visited);
        } else {
            let config = LeafConfig {
                capabilities: Some(NodeCapabilities::toggle_leaf()),
                ..LeafConfig::default()
            };
            tree.create_leaf(
                &layer.name,
                &layer.id.to_string(),
                toggle.clone(),
                node,
                Some(&config),
            );
        }
    }
}
