//! WMS endpoint loader.
//!
//! Requests the endpoint's capabilities document and creates one leaf per
//! configured layer id, in configuration order. Leaf titles come from the
//! `<Title>` of the matching `<Layer>` in the capabilities; layers the
//! endpoint does not advertise keep their id as title.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tokio::runtime::Handle;

use super::{AsyncHttpClient, Inclusions, LoadContext, LoadReporter, ServiceToggle, SourceLoader};
use crate::config::MapServiceSource;
use crate::tree::{LayerTree, LeafConfig, NodeCapabilities, NodeId, TreeBuilder};

fn layer_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<(?:\w+:)?Layer\b[^>]*>").expect("valid regex"))
}

fn layer_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<(?:\w+:)?Name>\s*([^<]*?)\s*</(?:\w+:)?Name>").expect("valid regex")
    })
}

fn layer_title() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<(?:\w+:)?Title>\s*([^<]*?)\s*</(?:\w+:)?Title>").expect("valid regex")
    })
}

/// Builds the GetCapabilities request URL for an endpoint.
pub fn capabilities_url(url: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}SERVICE=WMS&REQUEST=GetCapabilities", url, separator)
}

/// Extracts layer name → title pairs from a capabilities document.
///
/// Only the element directly inside each `<Layer>` (before any nested layer)
/// is considered, so parent layers do not inherit their children's names.
pub fn parse_capabilities_titles(xml: &str) -> HashMap<String, String> {
    let mut titles = HashMap::new();

    for start in layer_start().find_iter(xml) {
        let rest = &xml[start.end()..];
        let end = [rest.find("<Layer"), rest.find("</Layer"), rest.find(":Layer")]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(rest.len());
        let own = &rest[..end];

        let Some(name) = layer_name().captures(own).map(|c| decode_entities(&c[1])) else {
            continue;
        };
        let title = layer_title()
            .captures(own)
            .map(|c| decode_entities(&c[1]))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| name.clone());
        titles.entry(name).or_insert(title);
    }

    titles
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Loader for `wmsSource` endpoints.
pub struct WmsLoader<C: AsyncHttpClient> {
    client: Arc<C>,
    runtime: Handle,
    source: MapServiceSource,
}

impl<C: AsyncHttpClient> WmsLoader<C> {
    pub fn new(client: Arc<C>, runtime: Handle, source: MapServiceSource) -> Self {
        Self {
            client,
            runtime,
            source,
        }
    }
}

impl<C: AsyncHttpClient> SourceLoader for WmsLoader<C> {
    fn load(&self, ctx: LoadContext) {
        let Inclusions::Layers(layer_ids) = ctx.inclusions else {
            tracing::warn!(url = %self.source.url, "WMS loader received catalog folders; nothing to load");
            return;
        };

        tracing::debug!(url = %self.source.url, layers = layer_ids.len(), "Requesting WMS capabilities");
        self.runtime.spawn(load_endpoint(
            Arc::clone(&self.client),
            ctx.tree,
            ctx.reporter,
            ctx.container,
            self.source.url.clone(),
            layer_ids,
        ));
    }
}

async fn load_endpoint<C: AsyncHttpClient>(
    client: Arc<C>,
    tree: TreeBuilder,
    reporter: LoadReporter,
    container: NodeId,
    url: String,
    layer_ids: Vec<String>,
) {
    let body = match client.get(&capabilities_url(&url)).await {
        Ok(body) => body,
        Err(e) => {
            reporter.failed(e.into_failure(&url));
            return;
        }
    };

    let titles = parse_capabilities_titles(&String::from_utf8_lossy(&body));
    tree.write(|t| add_layers(t, container, &url, &layer_ids, &titles));
    reporter.succeeded(&url);
}

fn add_layers(
    tree: &mut LayerTree,
    container: NodeId,
    url: &str,
    layer_ids: &[String],
    titles: &HashMap<String, String>,
) {
    let toggle = Arc::new(ServiceToggle::new(url));
    let config = LeafConfig {
        capabilities: Some(NodeCapabilities::toggle_leaf()),
        ..LeafConfig::default()
    };

    for layer_id in layer_ids {
        let title = match titles.get(layer_id) {
            Some(title) => title.as_str(),
            None => {
                tracing::warn!(url = %url, layer = %layer_id, "Layer not advertised by WMS endpoint");
                layer_id.as_str()
            }
        };
        tree.create_leaf(title, layer_id, toggle.clone(), container, Some(&config));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CollectingHost;
    use crate::latch::CompletionLatch;
    use crate::loader::{HttpError, MockAsyncHttpClient};
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::time::Duration;

    const CAPABILITIES: &str = r#"<?xml version="1.0"?>
<WMS_Capabilities version="1.3.0">
  <Capability>
    <Layer>
      <Title>Root layer</Title>
      <Layer queryable="1">
        <Name>ortho</Name>
        <Title>Orthophoto 2020</Title>
      </Layer>
      <Layer>
        <Title>Relief &amp; terrain</Title>
        <Name>hillshade</Name>
      </Layer>
      <Layer>
        <Name>landcover</Name>
        <Title>Land cover</Title>
      </Layer>
    </Layer>
  </Capability>
</WMS_Capabilities>"#;

    fn source() -> MapServiceSource {
        MapServiceSource {
            url: "https://x/wms".to_string(),
            folder_title: "Imagery".to_string(),
            layer_ids: vec![
                "ortho".to_string(),
                "hillshade".to_string(),
                "landcover".to_string(),
            ],
            available_in_regions: None,
            is_new: None,
        }
    }

    #[test]
    fn test_capabilities_url() {
        assert_eq!(
            capabilities_url("https://x/wms"),
            "https://x/wms?SERVICE=WMS&REQUEST=GetCapabilities"
        );
        assert_eq!(
            capabilities_url("https://x/wms?map=a"),
            "https://x/wms?map=a&SERVICE=WMS&REQUEST=GetCapabilities"
        );
    }

    #[test]
    fn test_parse_capabilities_titles() {
        let titles = parse_capabilities_titles(CAPABILITIES);
        assert_eq!(titles.len(), 3);
        assert_eq!(titles["ortho"], "Orthophoto 2020");
        assert_eq!(titles["hillshade"], "Relief & terrain");
        assert_eq!(titles["landcover"], "Land cover");
    }

    #[test]
    fn test_parse_capabilities_without_title_uses_name() {
        let titles = parse_capabilities_titles("<Layer><Name>roads</Name></Layer>");
        assert_eq!(titles["roads"], "roads");
    }

    #[tokio::test]
    async fn test_loads_whitelisted_layers_in_order() {
        let client = MockAsyncHttpClient::default().with_response(
            "https://x/wms?SERVICE=WMS&REQUEST=GetCapabilities",
            CAPABILITIES,
        );
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let latch = Arc::new(CompletionLatch::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        latch.register("https://x/wms");
        let host = Arc::new(CollectingHost::new());
        let reporter = LoadReporter::new(latch, host.clone(), 7, Arc::new(AtomicU64::new(7)));
        let tree = TreeBuilder::new(LayerTree::default());
        let container = tree.create_container("Imagery", "folder", NodeId::ROOT, None);

        let mut layer_ids = source().layer_ids;
        layer_ids.push("unknown_layer".to_string());
        WmsLoader::new(Arc::new(client), Handle::current(), source()).load(LoadContext {
            container,
            inclusions: Inclusions::Layers(layer_ids),
            tree: tree.clone(),
            reporter,
        });

        for _ in 0..200 {
            if fired.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        let snapshot = tree.snapshot();
        assert_eq!(
            snapshot.path_ids(),
            vec![
                "Imagery",
                "Imagery/Orthophoto 2020",
                "Imagery/Relief & terrain",
                "Imagery/Land cover",
                "Imagery/unknown layer",
            ]
        );
        assert!(host.is_empty());
    }

    #[tokio::test]
    async fn test_failed_capabilities_request_reports_failure() {
        let client = MockAsyncHttpClient::default().with_error(
            "https://x/wms?SERVICE=WMS&REQUEST=GetCapabilities",
            HttpError::Status {
                status: 503,
                url: "https://x/wms?SERVICE=WMS&REQUEST=GetCapabilities".to_string(),
                body: "unavailable".to_string(),
            },
        );
        let latch = Arc::new(CompletionLatch::new(|| {}));
        latch.register("https://x/wms");
        let host = Arc::new(CollectingHost::new());
        let reporter = LoadReporter::new(
            Arc::clone(&latch),
            host.clone(),
            1,
            Arc::new(AtomicU64::new(1)),
        );

        WmsLoader::new(Arc::new(client), Handle::current(), source()).load(LoadContext {
            container: NodeId::ROOT,
            inclusions: Inclusions::Layers(source().layer_ids),
            tree: TreeBuilder::new(LayerTree::default()),
            reporter,
        });

        for _ in 0..200 {
            if !host.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let message = &host.messages()[0];
        assert!(message.contains("'unavailable'"));
        assert!(message.contains("Status: 'HTTP 503'"));
        assert_eq!(latch.pending(), vec!["https://x/wms"]);
    }
}
