//! Node types for the layer tree.

use std::fmt;
use std::sync::Arc;

use super::state::ServiceState;
use super::LayerTree;

/// Index of a node inside its [`LayerTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node of every tree.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Map object passed through tree operations to leaf toggles.
///
/// The tree never calls it; it exists so that show/hide capabilities can
/// reach whatever map the host displays.
pub trait MapHandle: Send + Sync {
    /// Shows or hides one layer of the service at `source_url`.
    fn set_layer_visibility(&self, source_url: &str, layer_id: &str, visible: bool);
}

/// Show/hide capability injected into every leaf by its loader.
pub trait LayerToggle: Send + Sync {
    fn show_or_hide(&self, map: &dyn MapHandle, layer_id: &str, visible: bool);
}

impl<F> LayerToggle for F
where
    F: Fn(&dyn MapHandle, &str, bool) + Send + Sync,
{
    fn show_or_hide(&self, map: &dyn MapHandle, layer_id: &str, visible: bool) {
        self(map, layer_id, visible)
    }
}

/// Hides every layer at or below a node.
pub type HideAllFn = Arc<dyn Fn(&mut LayerTree, NodeId, &dyn MapHandle) + Send + Sync>;

/// Restores previously saved state at or below a node.
pub type ApplyStateFn =
    Arc<dyn Fn(&mut LayerTree, NodeId, &ServiceState, &dyn MapHandle) + Send + Sync>;

/// Records the state of a node and its descendants.
pub type SaveStateFn = Arc<dyn Fn(&LayerTree, NodeId, &mut ServiceState) + Send + Sync>;

/// Per-node overrides for the tree-wide state operations.
///
/// When a slot is set, the traversal calls it instead of recursing into the
/// node's children.
#[derive(Clone, Default)]
pub struct NodeCapabilities {
    pub hide_all: Option<HideAllFn>,
    pub apply_state: Option<ApplyStateFn>,
    pub save_state: Option<SaveStateFn>,
}

impl NodeCapabilities {
    pub fn is_empty(&self) -> bool {
        self.hide_all.is_none() && self.apply_state.is_none() && self.save_state.is_none()
    }
}

impl fmt::Debug for NodeCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeCapabilities")
            .field("hide_all", &self.hide_all.is_some())
            .field("apply_state", &self.apply_state.is_some())
            .field("save_state", &self.save_state.is_some())
            .finish()
    }
}

/// A foldable group of nodes.
#[derive(Debug, Clone)]
pub struct ContainerNode {
    /// Type tag, e.g. "folder" or "service".
    pub node_type: String,
    /// Display class derived from the tree's class prefix and the type tag.
    pub cls: String,
    pub is_new: Option<bool>,
}

/// A single toggleable layer.
#[derive(Clone)]
pub struct LeafNode {
    pub layer_id: String,
    pub cls: String,
    pub toggle: Arc<dyn LayerToggle>,
    pub is_new: Option<bool>,
    pub download_url: Option<String>,
    pub visible_sub_layer_ids: Option<Vec<String>>,
}

impl fmt::Debug for LeafNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafNode")
            .field("layer_id", &self.layer_id)
            .field("cls", &self.cls)
            .field("is_new", &self.is_new)
            .field("download_url", &self.download_url)
            .field("visible_sub_layer_ids", &self.visible_sub_layer_ids)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Root,
    Container(ContainerNode),
    Leaf(LeafNode),
}

/// A node of the layer tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) text: String,
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Option<Vec<NodeId>>,
    pub(crate) capabilities: NodeCapabilities,
    pub expanded: bool,
    pub checked: bool,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Display text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Unique path id ("root" for the root node).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order; empty for nodes without a children list.
    pub fn children(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn has_children_list(&self) -> bool {
        self.children.is_some()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root)
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&ContainerNode> {
        match &self.kind {
            NodeKind::Container(container) => Some(container),
            _ => None,
        }
    }

    /// Type tag: "root", the container's tag, or "layer".
    pub fn node_type(&self) -> &str {
        match &self.kind {
            NodeKind::Root => "root",
            NodeKind::Container(c) => &c.node_type,
            NodeKind::Leaf(_) => "layer",
        }
    }

    pub fn capabilities(&self) -> &NodeCapabilities {
        &self.capabilities
    }
}

/// Optional settings for [`LayerTree::create_container`].
#[derive(Debug, Clone, Default)]
pub struct ContainerConfig {
    pub is_new: Option<bool>,
    pub capabilities: Option<NodeCapabilities>,
}

/// Optional settings for [`LayerTree::create_leaf`].
#[derive(Debug, Clone, Default)]
pub struct LeafConfig {
    pub is_new: Option<bool>,
    pub download_url: Option<String>,
    pub visible_sub_layer_ids: Option<Vec<String>>,
    pub capabilities: Option<NodeCapabilities>,
}
