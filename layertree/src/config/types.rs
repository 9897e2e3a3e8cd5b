//! Source descriptor types.

use serde::{Deserialize, Serialize};

use crate::error::SourceShapeError;

/// One element of the layer configuration list.
///
/// Exactly one of the two fields is expected to be set. The schema enforces
/// that for parsed configuration; entries built in code are checked again by
/// [`SourceEntry::descriptor`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ags_source: Option<CatalogSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wms_source: Option<MapServiceSource>,
}

/// A map-service catalog: nested folders of named services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSource {
    pub url: String,
    pub folders: Vec<CatalogFolder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_in_regions: Option<Vec<String>>,
    /// Marks the source's folder as new in the tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
}

/// A folder inside a catalog, optionally served from its own base URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFolder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub name: String,
    pub services: Vec<CatalogService>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogService {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A single WMS-style endpoint exposing a flat set of layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapServiceSource {
    pub url: String,
    pub folder_title: String,
    pub layer_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_in_regions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
}

/// Resolved view of a [`SourceEntry`] with exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceDescriptor<'a> {
    Catalog(&'a CatalogSource),
    MapService(&'a MapServiceSource),
}

impl SourceEntry {
    pub fn catalog(source: CatalogSource) -> Self {
        Self {
            ags_source: Some(source),
            wms_source: None,
        }
    }

    pub fn map_service(source: MapServiceSource) -> Self {
        Self {
            ags_source: None,
            wms_source: Some(source),
        }
    }

    /// Resolves the entry to its single variant.
    pub fn descriptor(&self) -> Result<SourceDescriptor<'_>, SourceShapeError> {
        match (&self.ags_source, &self.wms_source) {
            (Some(catalog), None) => Ok(SourceDescriptor::Catalog(catalog)),
            (None, Some(map_service)) => Ok(SourceDescriptor::MapService(map_service)),
            _ => Err(SourceShapeError),
        }
    }

    /// Region keys of whichever variant is present, catalog first.
    pub fn available_in_regions(&self) -> Option<&[String]> {
        if let Some(catalog) = &self.ags_source {
            catalog.available_in_regions.as_deref()
        } else if let Some(map_service) = &self.wms_source {
            map_service.available_in_regions.as_deref()
        } else {
            None
        }
    }
}

impl<'a> SourceDescriptor<'a> {
    /// Base URL declared by the source.
    pub fn url(&self) -> &'a str {
        match self {
            SourceDescriptor::Catalog(c) => &c.url,
            SourceDescriptor::MapService(m) => &m.url,
        }
    }

    /// Declared folder title. `None` means the title must be synthesized.
    pub fn folder_title(&self) -> Option<&'a str> {
        match self {
            SourceDescriptor::Catalog(c) => c.folder_title.as_deref(),
            SourceDescriptor::MapService(m) => Some(m.folder_title.as_str()),
        }
    }

    /// Declared `isNew` flag for the source's folder.
    pub fn is_new(&self) -> Option<bool> {
        match self {
            SourceDescriptor::Catalog(c) => c.is_new,
            SourceDescriptor::MapService(m) => m.is_new,
        }
    }

    /// Every URL the source's loader is responsible for reporting.
    pub fn constituent_urls(&self) -> Vec<String> {
        match self {
            SourceDescriptor::Catalog(c) => catalog_service_urls(c),
            SourceDescriptor::MapService(m) => vec![m.url.clone()],
        }
    }
}

/// URL of a single catalog service.
///
/// The folder's own URL overrides the catalog base; a non-empty folder name
/// is appended as a path segment before the service name.
pub fn catalog_service_url(source: &CatalogSource, folder: &CatalogFolder, service: &CatalogService) -> String {
    let mut url = folder.url.clone().unwrap_or_else(|| source.url.clone());
    if !folder.name.is_empty() {
        url.push('/');
        url.push_str(&folder.name);
    }
    url.push('/');
    url.push_str(&service.name);
    url
}

/// Cross product of a catalog's folders and their services, as URLs.
pub fn catalog_service_urls(source: &CatalogSource) -> Vec<String> {
    source
        .folders
        .iter()
        .flat_map(|folder| {
            folder
                .services
                .iter()
                .map(move |service| catalog_service_url(source, folder, service))
        })
        .collect()
}
