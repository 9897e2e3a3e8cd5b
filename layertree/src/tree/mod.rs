//! In-memory layer tree.
//!
//! Nodes live in an arena owned by [`LayerTree`] and refer to each other by
//! [`NodeId`]. Parent links are plain ids used for path computation; the
//! arena owns every node, so there are no reference cycles.
//!
//! ```text
//! root (expanded)
//! ├── Imagery            container, path id "Imagery"
//! │   ├── Ortho          leaf, path id "Imagery/Ortho"
//! │   └── Hillshade      leaf, path id "Imagery/Hillshade"
//! └── Base               container, path id "Base"
//!     └── Rivers         container, path id "Base/Rivers"
//! ```
//!
//! Children keep insertion order. With several loaders running at once the
//! order between sources depends on which finishes first and is not stable
//! across runs.

mod builder;
mod export;
mod node;
pub mod state;

pub use builder::TreeBuilder;
pub use node::{
    ApplyStateFn, ContainerConfig, ContainerNode, HideAllFn, LayerToggle, LeafConfig, LeafNode,
    MapHandle, Node, NodeCapabilities, NodeId, NodeKind, SaveStateFn,
};
pub use state::{NodeState, ServiceState};

use std::sync::Arc;

/// Default prefix for node display classes.
pub const DEFAULT_CSS_CLASS_PREFIX: &str = "pluginLayerSelector";

/// Path id of the root node.
pub const ROOT_NAME: &str = "root";

/// A layer tree for one load session.
#[derive(Debug, Clone)]
pub struct LayerTree {
    nodes: Vec<Node>,
    css_class_prefix: String,
}

impl Default for LayerTree {
    fn default() -> Self {
        Self::new(DEFAULT_CSS_CLASS_PREFIX)
    }
}

impl LayerTree {
    /// Creates a tree holding only the expanded root node.
    pub fn new(css_class_prefix: impl Into<String>) -> Self {
        let root = Node {
            kind: NodeKind::Root,
            text: String::new(),
            name: ROOT_NAME.to_string(),
            parent: None,
            children: Some(Vec::new()),
            capabilities: NodeCapabilities::default(),
            expanded: true,
            checked: false,
        };
        Self {
            nodes: vec![root],
            css_class_prefix: css_class_prefix.into(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn css_class_prefix(&self) -> &str {
        &self.css_class_prefix
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds only the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Returns a node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Mutable access to a node, e.g. to set `checked` or `expanded`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Children of a node, copied so the tree can be mutated while iterating.
    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).children().to_vec()
    }

    /// Replaces the capability slots of a node.
    pub fn set_capabilities(&mut self, id: NodeId, capabilities: NodeCapabilities) {
        self.node_mut(id).capabilities = capabilities;
    }

    /// Creates a container node and appends it to `parent`.
    ///
    /// Underscores in `name` are shown as spaces. A parent without a children
    /// list (a leaf) keeps the new node unattached; this indicates a loader
    /// built the wrong shape and is logged as a warning.
    pub fn create_container(
        &mut self,
        name: &str,
        node_type: &str,
        parent: NodeId,
        config: Option<&ContainerConfig>,
    ) -> NodeId {
        let container = ContainerNode {
            node_type: node_type.to_string(),
            cls: format!("{}-{}", self.css_class_prefix, node_type),
            is_new: config.and_then(|c| c.is_new),
        };
        let capabilities = config
            .and_then(|c| c.capabilities.clone())
            .unwrap_or_default();

        let id = self.push_node(
            NodeKind::Container(container),
            display_text(name),
            parent,
            Some(Vec::new()),
            capabilities,
        );

        let attached = match self.nodes[parent.0].children.as_mut() {
            Some(children) => {
                children.push(id);
                true
            }
            None => false,
        };
        if !attached {
            tracing::warn!(
                container = %self.nodes[id.0].name,
                parent = %self.nodes[parent.0].name,
                "Parent node has no children list; container not attached"
            );
        }
        id
    }

    /// Creates a leaf node and appends it to `parent`.
    ///
    /// Underscores in `title` are shown as spaces. Optional fields are copied
    /// only when present in `config`; the parent's children list is created
    /// if missing.
    pub fn create_leaf(
        &mut self,
        title: &str,
        layer_id: &str,
        toggle: Arc<dyn LayerToggle>,
        parent: NodeId,
        config: Option<&LeafConfig>,
    ) -> NodeId {
        let leaf = LeafNode {
            layer_id: layer_id.to_string(),
            cls: format!("{}-layer", self.css_class_prefix),
            toggle,
            is_new: config.and_then(|c| c.is_new),
            download_url: config.and_then(|c| c.download_url.clone()),
            visible_sub_layer_ids: config.and_then(|c| c.visible_sub_layer_ids.clone()),
        };
        let capabilities = config
            .and_then(|c| c.capabilities.clone())
            .unwrap_or_default();

        let id = self.push_node(
            NodeKind::Leaf(leaf),
            display_text(title),
            parent,
            None,
            capabilities,
        );

        self.nodes[parent.0]
            .children
            .get_or_insert_with(Vec::new)
            .push(id);
        id
    }

    fn push_node(
        &mut self,
        kind: NodeKind,
        text: String,
        parent: NodeId,
        children: Option<Vec<NodeId>>,
        capabilities: NodeCapabilities,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let name = self.child_path_id(parent, &text);
        self.nodes.push(Node {
            kind,
            text,
            name,
            parent: Some(parent),
            children,
            capabilities,
            expanded: false,
            checked: false,
        });
        id
    }

    /// Computes the unique path id of a node by walking its parent links.
    ///
    /// The root is "root"; its children are named by their own text; deeper
    /// nodes append "/" and their text to their parent's path id. A node
    /// without a parent is named by its own text.
    pub fn path_id(&self, id: NodeId) -> String {
        let node = self.node(id);
        if node.is_root() {
            return ROOT_NAME.to_string();
        }
        match node.parent {
            Some(parent) => self.child_path_id(parent, &node.text),
            None => node.text.clone(),
        }
    }

    fn child_path_id(&self, parent: NodeId, text: &str) -> String {
        if self.node(parent).is_root() {
            text.to_string()
        } else {
            format!("{}/{}", self.path_id(parent), text)
        }
    }

    /// Finds a node by its path id.
    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.name == path)
            .map(NodeId)
    }

    /// Ids of every node in creation order, root first.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Ids of every leaf node in creation order.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids().filter(|id| self.node(*id).is_leaf())
    }

    /// Path ids of every node attached below the root, depth-first.
    pub fn path_ids(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_path_ids(NodeId::ROOT, &mut out);
        out
    }

    fn collect_path_ids(&self, id: NodeId, out: &mut Vec<String>) {
        for &child in self.node(id).children() {
            out.push(self.node(child).name.clone());
            self.collect_path_ids(child, out);
        }
    }
}

fn display_text(name: &str) -> String {
    name.replace('_', " ")
}
