use crate::tree::{LayerToggle, MapHandle};

/// Shows or hides layers of one service URL on the host's map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceToggle {
    url: String,
}

impl ServiceToggle {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl LayerToggle for ServiceToggle {
    fn show_or_hide(&self, map: &dyn MapHandle, layer_id: &str, visible: bool) {
        map.set_layer_visibility(&self.url, layer_id, visible);
    }
}
