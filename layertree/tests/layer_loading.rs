//! Integration tests for load sessions.
//!
//! These tests drive the full flow through the public API:
//! - configuration text → parse/validate → region filter
//! - HTTP loaders (served by a canned client) → tree
//! - completion notification and visibility state operations
//!
//! Run with: `cargo test --test layer_loading`

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;

use layertree::host::CollectingHost;
use layertree::loader::{AsyncHttpClient, HttpError, HttpLoaderProvider};
use layertree::tree::{LayerTree, MapHandle, NodeState, ServiceState};
use layertree::LayerManager;

// ============================================================================
// Helpers
// ============================================================================

/// Serves canned bodies by URL; everything else is a 404.
#[derive(Default)]
struct CannedClient {
    bodies: HashMap<String, String>,
}

impl CannedClient {
    fn with(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.to_string());
        self
    }
}

impl AsyncHttpClient for CannedClient {
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send {
        let response = match self.bodies.get(url) {
            Some(body) => Ok(body.as_bytes().to_vec()),
            None => Err(HttpError::Status {
                status: 404,
                url: url.to_string(),
                body: "Not Found".to_string(),
            }),
        };
        async move { response }
    }
}

#[derive(Default)]
struct RecordingMap {
    calls: Mutex<Vec<(String, String, bool)>>,
}

impl MapHandle for RecordingMap {
    fn set_layer_visibility(&self, source_url: &str, layer_id: &str, visible: bool) {
        self.calls
            .lock()
            .push((source_url.to_string(), layer_id.to_string(), visible));
    }
}

const IMAGERY_URL: &str = "https://imagery.example/wms";
const IMAGERY_CAPABILITIES_URL: &str =
    "https://imagery.example/wms?SERVICE=WMS&REQUEST=GetCapabilities";

const IMAGERY_CAPABILITIES: &str = r#"<WMS_Capabilities>
  <Capability>
    <Layer>
      <Title>Imagery root</Title>
      <Layer><Name>ortho</Name><Title>Orthophoto</Title></Layer>
      <Layer><Name>landsat</Name><Title>Landsat</Title></Layer>
      <Layer><Name>relief</Name><Title>Shaded_Relief</Title></Layer>
    </Layer>
  </Capability>
</WMS_Capabilities>"#;

const ROADS_JSON: &str = r#"{
    "layers": [
        {"id": 0, "name": "Highways", "parentLayerId": -1, "subLayerIds": null},
        {"id": 1, "name": "Local", "parentLayerId": -1, "subLayerIds": null}
    ]
}"#;

const IMAGERY_CONFIG: &str = r#"[
    // Aerial imagery
    {
        "wmsSource": {
            "url": "https://imagery.example/wms",
            "folderTitle": "Imagery",
            "layerIds": ["ortho", "landsat", "relief"]
        }
    }
]"#;

fn manager(client: CannedClient) -> (LayerManager, Arc<CollectingHost>) {
    let host = Arc::new(CollectingHost::new());
    let provider = HttpLoaderProvider::new(client, Handle::current());
    (LayerManager::new(host.clone(), Arc::new(provider)), host)
}

fn imagery_client() -> CannedClient {
    CannedClient::default().with(IMAGERY_CAPABILITIES_URL, IMAGERY_CAPABILITIES)
}

async fn wait(rx: tokio::sync::oneshot::Receiver<LayerTree>) -> LayerTree {
    tokio::time::timeout(Duration::from_secs(5), rx)
        .await
        .expect("session did not complete in time")
        .expect("session was dropped")
}

/// Yields to spawned loaders until the manager has no pending URLs left
/// or the given number of rounds passes.
async fn settle(manager: &LayerManager, expected_pending: usize) {
    for _ in 0..100 {
        if manager.pending_urls().len() <= expected_pending {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_wms_source_builds_folder_with_leaves() {
    let (manager, host) = manager(imagery_client());

    let tree = wait(manager.load_channel(IMAGERY_CONFIG, Some("main"))).await;

    assert!(host.is_empty(), "unexpected errors: {:?}", host.messages());
    assert_eq!(
        tree.path_ids(),
        vec![
            "Imagery",
            "Imagery/Orthophoto",
            "Imagery/Landsat",
            "Imagery/Shaded Relief",
        ]
    );

    let folder = tree.find_by_path("Imagery").unwrap();
    assert_eq!(tree.node(folder).node_type(), "folder");
    assert_eq!(tree.children_of(folder).len(), 3);
    for leaf in tree.children_of(folder) {
        assert!(tree.node(leaf).is_leaf());
        assert_eq!(tree.node(leaf).parent(), Some(folder));
    }
}

#[tokio::test]
async fn test_catalog_with_empty_title_loads_into_root() {
    let client = CannedClient::default()
        .with("https://gis.example/rest/services/Roads/MapServer?f=json", ROADS_JSON);
    let (manager, host) = manager(client);
    let config = r#"[{
        "agsSource": {
            "url": "https://gis.example/rest/services",
            "folderTitle": "",
            "folders": [{"name": "", "services": [{"name": "Roads"}]}]
        }
    }]"#;

    let tree = wait(manager.load_channel(config, None)).await;

    assert!(host.is_empty());
    assert_eq!(
        tree.path_ids(),
        vec!["Roads", "Roads/Highways", "Roads/Local"]
    );
    assert_eq!(tree.node(tree.find_by_path("Roads").unwrap()).node_type(), "service");
}

#[tokio::test]
async fn test_one_failed_source_blocks_completion() {
    let client = imagery_client().with(
        "https://b.example/wms?SERVICE=WMS&REQUEST=GetCapabilities",
        IMAGERY_CAPABILITIES,
    );
    let (manager, host) = manager(client);
    let config = r#"[
        {"wmsSource": {"url": "https://imagery.example/wms", "folderTitle": "A", "layerIds": ["ortho"]}},
        {"wmsSource": {"url": "https://missing.example/wms", "folderTitle": "M", "layerIds": ["x"]}},
        {"wmsSource": {"url": "https://b.example/wms", "folderTitle": "B", "layerIds": ["landsat"]}}
    ]"#;

    let mut rx = manager.load_channel(config, None);
    settle(&manager, 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(rx.try_recv().is_err());
    assert!(!manager.is_complete());
    assert_eq!(manager.pending_urls(), vec!["https://missing.example/wms"]);
    assert_eq!(host.len(), 1);
    assert!(host.messages()[0].contains("Status: 'HTTP 404'"));
}

#[tokio::test]
async fn test_completion_fires_once_across_sources() {
    let client = imagery_client()
        .with("https://gis.example/rest/services/Roads/MapServer?f=json", ROADS_JSON)
        .with("https://gis.example/rest/services/Rail/MapServer?f=json", ROADS_JSON);
    let (manager, _) = manager(client);
    let config = r#"[
        {"wmsSource": {"url": "https://imagery.example/wms", "folderTitle": "Imagery", "layerIds": ["ortho"]}},
        {"agsSource": {
            "url": "https://gis.example/rest/services",
            "folderTitle": "Transport",
            "folders": [{"name": "", "services": [{"name": "Roads"}, {"name": "Rail"}]}]
        }}
    ]"#;

    let completions = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&completions);
    manager.load(config, None, move |tree| sink.lock().push(tree.len()));

    settle(&manager, 0).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // root, Imagery with 1 leaf, Transport with 2 services of 2 leaves each
    assert_eq!(*completions.lock(), vec![10]);
}

#[tokio::test]
async fn test_region_filter_excludes_sources() {
    let (manager, _) = manager(imagery_client());
    let config = r#"[
        {"wmsSource": {
            "url": "https://imagery.example/wms",
            "folderTitle": "Imagery",
            "layerIds": ["ortho"],
            "availableInRegions": ["north"]
        }},
        {"wmsSource": {
            "url": "https://nowhere.example/wms",
            "folderTitle": "South only",
            "layerIds": ["x"],
            "availableInRegions": ["south"]
        }}
    ]"#;

    let tree = wait(manager.load_channel(config, Some("north"))).await;

    assert_eq!(tree.path_ids(), vec!["Imagery", "Imagery/Orthophoto"]);
}

#[tokio::test]
async fn test_invalid_config_reports_and_never_completes() {
    let (manager, host) = manager(imagery_client());

    let rx = manager.load_channel(r#"[{"wmsSource": {"url": 7}}]"#, None);

    assert!(rx.await.is_err());
    assert_eq!(host.len(), 1);
    assert!(host.messages()[0].starts_with("Error in config file layers.json"));
}

#[tokio::test]
async fn test_state_round_trip_and_clear() {
    let (manager, _) = manager(imagery_client());
    wait(manager.load_channel(IMAGERY_CONFIG, None)).await;
    let map = RecordingMap::default();

    let mut state = ServiceState::new();
    state.insert(
        "Imagery/Landsat",
        NodeState {
            checked: true,
            expanded: false,
        },
    );
    manager.set_service_state(&state, &map);

    let saved = manager.get_service_state();
    assert_eq!(saved.len(), 3);
    assert!(saved.get("Imagery/Landsat").unwrap().checked);
    assert!(!saved.get("Imagery/Orthophoto").unwrap().checked);
    assert_eq!(
        *map.calls.lock(),
        vec![(IMAGERY_URL.to_string(), "landsat".to_string(), true)]
    );

    // Applying what was just captured changes nothing.
    manager.set_service_state(&saved, &map);
    assert_eq!(manager.get_service_state(), saved);

    map.calls.lock().clear();
    manager.hide_all_layers(&map);
    assert!(manager.get_service_state().iter().all(|(_, s)| !s.checked));
    assert_eq!(map.calls.lock().len(), 3);
    assert!(map.calls.lock().iter().all(|(_, _, visible)| !visible));

    manager.clear_service_state();
    let tree = manager.tree();
    assert!(tree.node(tree.root()).expanded);
    assert!(tree
        .ids()
        .filter(|id| *id != tree.root())
        .all(|id| !tree.node(id).checked && !tree.node(id).expanded));
}

#[tokio::test]
async fn test_path_ids_are_unique_with_duplicate_titles() {
    let (manager, host) = manager(imagery_client());
    let config = r#"[
        {"wmsSource": {"url": "https://imagery.example/wms", "folderTitle": "Imagery", "layerIds": ["ortho"]}},
        {"wmsSource": {"url": "https://imagery.example/wms", "folderTitle": "Imagery", "layerIds": ["landsat"]}}
    ]"#;

    let tree = wait(manager.load_channel(config, None)).await;

    let mut ids = tree.path_ids();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
    assert!(ids.contains(&"Imagery/Orthophoto".to_string()));
    assert!(ids.contains(&"Imagery (duplicate #2)/Landsat".to_string()));
    assert_eq!(host.len(), 1);
}

#[tokio::test]
async fn test_is_new_flag_is_exported_on_folder() {
    let (manager, _) = manager(imagery_client());
    let config = r#"[{"wmsSource": {
        "url": "https://imagery.example/wms",
        "folderTitle": "Imagery",
        "layerIds": ["ortho"],
        "isNew": true
    }}]"#;

    let tree = wait(manager.load_channel(config, None)).await;

    let value = serde_json::to_value(&tree).unwrap();
    assert_eq!(value["children"][0]["text"], "Imagery");
    assert_eq!(value["children"][0]["isNew"], serde_json::json!(true));
}

#[tokio::test]
async fn test_second_load_replaces_first() {
    let (manager, _) = manager(imagery_client());
    let first = manager.load_channel(IMAGERY_CONFIG, None);
    let second_config = r#"[{"wmsSource": {
        "url": "https://imagery.example/wms",
        "folderTitle": "Second",
        "layerIds": ["relief"]
    }}]"#;

    let second = manager.load_channel(second_config, None);

    let tree = wait(second).await;
    assert_eq!(tree.path_ids(), vec!["Second", "Second/Shaded Relief"]);
    assert!(first.await.is_err());
    assert_eq!(manager.tree().path_ids(), tree.path_ids());
}
