//! Load session coordination.
//!
//! [`LayerManager`] runs one load session at a time:
//!
//! ```text
//! config text ──► parse/validate ──► region filter ──► plan URLs ──► dispatch loaders
//!                                                          │               │
//!                                                   CompletionLatch ◄── LoadReporter
//!                                                          │
//!                                                   on_complete(tree)
//! ```
//!
//! Every constituent URL of every source is registered before the first
//! loader is dispatched, so a loader that finishes immediately cannot empty
//! the pending set while other sources are still unregistered.
//!
//! A source whose URL fails is reported to the host and stays pending; the
//! completion callback then never runs for that session. Partial trees are
//! not delivered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::config::{parse_layer_config, SourceDescriptor, SourceEntry};
use crate::host::Host;
use crate::latch::CompletionLatch;
use crate::loader::{Inclusions, LoadContext, LoadReporter, LoaderProvider};
use crate::naming::FolderNamer;
use crate::region::filter_by_region;
use crate::settings::Settings;
use crate::tree::{
    ContainerConfig, LayerTree, MapHandle, NodeId, ServiceState, TreeBuilder,
    DEFAULT_CSS_CLASS_PREFIX,
};

/// Type tag of the per-source container nodes.
pub const SOURCE_FOLDER_TYPE: &str = "folder";

struct Session {
    tree: TreeBuilder,
    latch: Arc<CompletionLatch>,
}

impl Session {
    fn empty(css_class_prefix: &str) -> Self {
        Self {
            tree: TreeBuilder::new(LayerTree::new(css_class_prefix)),
            latch: Arc::new(CompletionLatch::new(|| {})),
        }
    }
}

/// Aggregates configured layer sources into one tree.
///
/// # Example
///
/// ```ignore
/// use layertree::host::TracingHost;
/// use layertree::loader::HttpLoaderProvider;
/// use layertree::manager::LayerManager;
///
/// let provider = HttpLoaderProvider::from_settings(&settings, Handle::current())?;
/// let manager = LayerManager::new(Arc::new(TracingHost), Arc::new(provider));
/// manager.load(&config_text, Some("main"), |tree| {
///     println!("{} nodes loaded", tree.len());
/// });
/// ```
pub struct LayerManager {
    host: Arc<dyn Host>,
    loaders: Arc<dyn LoaderProvider>,
    css_class_prefix: String,
    generation: Arc<AtomicU64>,
    session: Mutex<Session>,
}

impl LayerManager {
    pub fn new(host: Arc<dyn Host>, loaders: Arc<dyn LoaderProvider>) -> Self {
        Self {
            host,
            loaders,
            css_class_prefix: DEFAULT_CSS_CLASS_PREFIX.to_string(),
            generation: Arc::new(AtomicU64::new(0)),
            session: Mutex::new(Session::empty(DEFAULT_CSS_CLASS_PREFIX)),
        }
    }

    /// Applies tree settings (display class prefix) to future sessions.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.css_class_prefix = settings.tree.css_class_prefix.clone();
        self
    }

    /// Parses `config_text` and starts a load session.
    ///
    /// Configuration errors are reported to the host; the previous session
    /// is still discarded and `on_complete` is never called.
    pub fn load(
        &self,
        config_text: &str,
        region_key: Option<&str>,
        on_complete: impl FnOnce(LayerTree) + Send + 'static,
    ) {
        match parse_layer_config(config_text, self.host.as_ref()) {
            Some(entries) => self.start_session(entries, region_key, on_complete),
            None => self.reset(),
        }
    }

    /// Like [`load`](Self::load), delivering the tree through a channel.
    ///
    /// The receiver yields an error if the session can never complete
    /// because the configuration was rejected or a newer session replaced
    /// this one before it finished.
    pub fn load_channel(&self, config_text: &str, region_key: Option<&str>) -> oneshot::Receiver<LayerTree> {
        let (tx, rx) = oneshot::channel();
        self.load(config_text, region_key, move |tree| {
            let _ = tx.send(tree);
        });
        rx
    }

    /// Starts a load session for already parsed entries.
    ///
    /// Entries are filtered by `region_key`, every constituent URL is
    /// registered, then one loader per entry is dispatched. `on_complete`
    /// runs once, after the last URL reports success.
    pub fn start_session(
        &self,
        entries: Vec<SourceEntry>,
        region_key: Option<&str>,
        on_complete: impl FnOnce(LayerTree) + Send + 'static,
    ) {
        let entries = filter_by_region(entries, region_key);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let tree = TreeBuilder::new(LayerTree::new(&self.css_class_prefix));
        let completion_tree = tree.clone();
        let latch = Arc::new(CompletionLatch::new(move || {
            let snapshot = completion_tree.snapshot();
            tracing::info!(generation, nodes = snapshot.len(), "All layer sources loaded");
            on_complete(snapshot);
        }));

        *self.session.lock() = Session {
            tree: tree.clone(),
            latch: Arc::clone(&latch),
        };

        let planned: Vec<SourceDescriptor<'_>> = entries
            .iter()
            .filter_map(|entry| match entry.descriptor() {
                Ok(descriptor) => Some(descriptor),
                Err(e) => {
                    self.host.error("", &e.to_string());
                    None
                }
            })
            .collect();

        for descriptor in &planned {
            for url in descriptor.constituent_urls() {
                latch.register(url);
            }
        }

        tracing::info!(
            generation,
            region = region_key.unwrap_or("<none>"),
            sources = planned.len(),
            urls = latch.pending_count(),
            "Starting layer load session"
        );

        let reporter = LoadReporter::new(
            Arc::clone(&latch),
            Arc::clone(&self.host),
            generation,
            Arc::clone(&self.generation),
        );
        let mut namer = FolderNamer::new();

        for descriptor in planned {
            self.dispatch(descriptor, &tree, &reporter, &mut namer);
        }

        if latch.arm() {
            tracing::debug!(generation, "No layer source URLs registered; session complete");
        }
    }

    fn dispatch(
        &self,
        descriptor: SourceDescriptor<'_>,
        tree: &TreeBuilder,
        reporter: &LoadReporter,
        namer: &mut FolderNamer,
    ) {
        let container = match descriptor.folder_title() {
            Some("") => NodeId::ROOT,
            title => {
                let name = namer.unique_title(title, self.host.as_ref());
                let config = ContainerConfig {
                    is_new: descriptor.is_new(),
                    ..ContainerConfig::default()
                };
                tree.create_container(&name, SOURCE_FOLDER_TYPE, NodeId::ROOT, Some(&config))
            }
        };

        let (loader, inclusions) = match descriptor {
            SourceDescriptor::Catalog(source) => (
                self.loaders.catalog_loader(source),
                Inclusions::Folders(source.folders.clone()),
            ),
            SourceDescriptor::MapService(source) => (
                self.loaders.map_service_loader(source),
                Inclusions::Layers(source.layer_ids.clone()),
            ),
        };

        tracing::debug!(url = %descriptor.url(), container = container.index(), "Dispatching layer source loader");
        loader.load(LoadContext {
            container,
            inclusions,
            tree: tree.clone(),
            reporter: reporter.clone(),
        });
    }

    /// Discards the current session without starting a new one.
    fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.session.lock() = Session::empty(&self.css_class_prefix);
    }

    fn current_tree(&self) -> TreeBuilder {
        self.session.lock().tree.clone()
    }

    /// Copy of the current session's tree, complete or not.
    pub fn tree(&self) -> LayerTree {
        self.current_tree().snapshot()
    }

    /// URLs of the current session that have not reported success.
    pub fn pending_urls(&self) -> Vec<String> {
        self.session.lock().latch.pending()
    }

    /// True once the current session's completion callback has run.
    pub fn is_complete(&self) -> bool {
        self.session.lock().latch.has_fired()
    }

    pub fn hide_all_layers(&self, map: &dyn MapHandle) {
        self.current_tree().write(|tree| tree.hide_all_layers(map));
    }

    pub fn set_service_state(&self, state: &ServiceState, map: &dyn MapHandle) {
        self.current_tree()
            .write(|tree| tree.set_service_state(state, map));
    }

    pub fn get_service_state(&self) -> ServiceState {
        self.current_tree().read(|tree| tree.get_service_state())
    }

    pub fn clear_service_state(&self) {
        self.current_tree().write(|tree| tree.clear_service_state());
    }
}

/// URLs a session would register for `entries` in `region_key`.
///
/// Entries that do not declare exactly one source variant are skipped.
pub fn planned_urls(entries: &[SourceEntry], region_key: Option<&str>) -> Vec<String> {
    filter_by_region(entries.to_vec(), region_key)
        .iter()
        .filter_map(|entry| entry.descriptor().ok().map(|d| d.constituent_urls()))
        .flatten()
        .collect()
}
