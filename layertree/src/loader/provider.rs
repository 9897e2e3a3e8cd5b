//! Loader provider backed by a shared HTTP client.

use std::sync::Arc;

use tokio::runtime::Handle;

use super::{
    ArcGisCatalogLoader, AsyncHttpClient, AsyncReqwestClient, HttpError, LoaderProvider,
    SourceLoader, WmsLoader,
};
use crate::config::{CatalogSource, MapServiceSource};
use crate::settings::Settings;

/// Hands out HTTP loaders that run on the given runtime.
///
/// # Example
///
/// ```ignore
/// use layertree::loader::HttpLoaderProvider;
///
/// let provider = HttpLoaderProvider::from_settings(&settings, Handle::current())?;
/// let manager = LayerManager::new(host, Arc::new(provider));
/// ```
pub struct HttpLoaderProvider<C: AsyncHttpClient = AsyncReqwestClient> {
    client: Arc<C>,
    runtime: Handle,
}

impl HttpLoaderProvider<AsyncReqwestClient> {
    /// Creates a provider using a reqwest client configured from settings.
    pub fn from_settings(settings: &Settings, runtime: Handle) -> Result<Self, HttpError> {
        let client = AsyncReqwestClient::with_timeout(settings.http.timeout_secs)?;
        Ok(Self::new(client, runtime))
    }
}

impl<C: AsyncHttpClient> HttpLoaderProvider<C> {
    pub fn new(client: C, runtime: Handle) -> Self {
        Self {
            client: Arc::new(client),
            runtime,
        }
    }
}

impl<C: AsyncHttpClient> LoaderProvider for HttpLoaderProvider<C> {
    fn catalog_loader(&self, source: &CatalogSource) -> Arc<dyn SourceLoader> {
        Arc::new(ArcGisCatalogLoader::new(
            Arc::clone(&self.client),
            self.runtime.clone(),
            source.clone(),
        ))
    }

    fn map_service_loader(&self, source: &MapServiceSource) -> Arc<dyn SourceLoader> {
        Arc::new(WmsLoader::new(
            Arc::clone(&self.client),
            self.runtime.clone(),
            source.clone(),
        ))
    }
}
