//! Thread-safe handle used by loaders to populate a session's tree.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{ContainerConfig, LayerToggle, LayerTree, LeafConfig, NodeCapabilities, NodeId};

/// Shared handle to the tree of one load session.
///
/// Loaders may run on any thread of the runtime; every call takes the tree
/// lock for the duration of a single node insertion.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    tree: Arc<Mutex<LayerTree>>,
}

impl TreeBuilder {
    pub fn new(tree: LayerTree) -> Self {
        Self {
            tree: Arc::new(Mutex::new(tree)),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn create_container(
        &self,
        name: &str,
        node_type: &str,
        parent: NodeId,
        config: Option<&ContainerConfig>,
    ) -> NodeId {
        self.tree
            .lock()
            .create_container(name, node_type, parent, config)
    }

    pub fn create_leaf(
        &self,
        title: &str,
        layer_id: &str,
        toggle: Arc<dyn LayerToggle>,
        parent: NodeId,
        config: Option<&LeafConfig>,
    ) -> NodeId {
        self.tree
            .lock()
            .create_leaf(title, layer_id, toggle, parent, config)
    }

    pub fn set_capabilities(&self, node: NodeId, capabilities: NodeCapabilities) {
        self.tree.lock().set_capabilities(node, capabilities);
    }

    /// Runs `f` with shared access to the tree.
    pub fn read<R>(&self, f: impl FnOnce(&LayerTree) -> R) -> R {
        f(&self.tree.lock())
    }

    /// Runs `f` with exclusive access to the tree.
    pub fn write<R>(&self, f: impl FnOnce(&mut LayerTree) -> R) -> R {
        f(&mut self.tree.lock())
    }

    /// Copy of the tree as it stands now.
    pub fn snapshot(&self) -> LayerTree {
        self.tree.lock().clone()
    }
}
