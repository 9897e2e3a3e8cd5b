//! Source loaders.
//!
//! A loader fetches the metadata of one configured source and populates the
//! source's container node through a [`TreeBuilder`]. It reports every URL it
//! owns exactly once, either through [`LoadReporter::succeeded`] or
//! [`LoadReporter::failed`]. Loaders return immediately and finish their work
//! asynchronously; reports may arrive from any thread and in any order.
//!
//! Built-in loaders:
//!
//! - [`ArcGisCatalogLoader`] for `agsSource` catalogs (ArcGIS REST JSON)
//! - [`WmsLoader`] for `wmsSource` endpoints (WMS GetCapabilities)
//!
//! [`HttpLoaderProvider`] hands out both over a shared HTTP client.

mod arcgis;
mod http;
mod provider;
mod toggle;
mod wms;

pub use arcgis::ArcGisCatalogLoader;
pub use http::{AsyncHttpClient, AsyncReqwestClient, HttpError, DEFAULT_TIMEOUT_SECS};
pub use provider::HttpLoaderProvider;
pub use toggle::ServiceToggle;
pub use wms::{parse_capabilities_titles, WmsLoader};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::{CatalogFolder, CatalogSource, MapServiceSource};
use crate::error::LoadFailure;
use crate::host::Host;
use crate::latch::{Completion, CompletionLatch};
use crate::tree::{NodeId, TreeBuilder};

/// Entries of a source the loader should include.
#[derive(Debug, Clone, PartialEq)]
pub enum Inclusions {
    /// Catalog folders and their services.
    Folders(Vec<CatalogFolder>),
    /// Layer ids of a map-service source.
    Layers(Vec<String>),
}

/// Everything a loader needs for one dispatch.
#[derive(Debug, Clone)]
pub struct LoadContext {
    /// Node the loader attaches its content to.
    pub container: NodeId,
    pub inclusions: Inclusions,
    pub tree: TreeBuilder,
    pub reporter: LoadReporter,
}

/// Loads one source into the tree.
pub trait SourceLoader: Send + Sync {
    fn load(&self, ctx: LoadContext);
}

/// Chooses a loader for each source variant.
pub trait LoaderProvider: Send + Sync {
    fn catalog_loader(&self, source: &CatalogSource) -> Arc<dyn SourceLoader>;

    fn map_service_loader(&self, source: &MapServiceSource) -> Arc<dyn SourceLoader>;
}

/// Per-URL completion reporting for one load session.
///
/// Reports from a reporter whose session has since been replaced are
/// dropped.
#[derive(Clone)]
pub struct LoadReporter {
    latch: Arc<CompletionLatch>,
    host: Arc<dyn Host>,
    generation: u64,
    current_generation: Arc<AtomicU64>,
}

impl std::fmt::Debug for LoadReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadReporter")
            .field("latch", &self.latch)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl LoadReporter {
    pub(crate) fn new(
        latch: Arc<CompletionLatch>,
        host: Arc<dyn Host>,
        generation: u64,
        current_generation: Arc<AtomicU64>,
    ) -> Self {
        Self {
            latch,
            host,
            generation,
            current_generation,
        }
    }

    fn is_stale(&self) -> bool {
        self.current_generation.load(Ordering::SeqCst) != self.generation
    }

    /// Marks `url` as loaded.
    ///
    /// Unknown URLs, and successes beyond the number registered, are
    /// ignored. The session's completion callback runs on the thread that
    /// reports the last pending URL.
    pub fn succeeded(&self, url: &str) {
        if self.is_stale() {
            tracing::debug!(url = %url, generation = self.generation, "Ignoring success from replaced session");
            return;
        }
        match self.latch.complete(url) {
            Completion::Pending(remaining) => {
                tracing::debug!(url = %url, remaining, "Layer source loaded");
            }
            Completion::Fired => {
                tracing::debug!(url = %url, "Last layer source loaded");
            }
            Completion::Ignored => {
                tracing::debug!(url = %url, "Ignoring completion for URL that is not pending");
            }
        }
    }

    /// Reports a failed URL to the host.
    ///
    /// The URL stays pending, so the session never completes.
    pub fn failed(&self, failure: LoadFailure) {
        if self.is_stale() {
            tracing::debug!(url = %failure.url, "Ignoring failure from replaced session");
            return;
        }
        tracing::warn!(
            url = %failure.url,
            status = %failure.status,
            "Layer source failed; session will not complete"
        );
        self.host.error("", &failure.to_string());
    }

    /// URLs still pending in this reporter's session.
    pub fn pending(&self) -> Vec<String> {
        self.latch.pending()
    }
}
