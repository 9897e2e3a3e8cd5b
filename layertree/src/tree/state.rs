//! Tree-wide state operations.
//!
//! Each traversal is depth-first and pre-order. At every node the matching
//! [`NodeCapabilities`] slot, when set, handles that node and its whole
//! subtree; otherwise the traversal recurses into the children. Nodes without
//! a children list end the recursion.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{LayerTree, MapHandle, NodeCapabilities, NodeId};

/// Saved per-node flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    pub checked: bool,
    pub expanded: bool,
}

/// Flat snapshot of saved node state keyed by path id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceState {
    nodes: BTreeMap<String, NodeState>,
}

impl ServiceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path_id: impl Into<String>, state: NodeState) {
        self.nodes.insert(path_id.into(), state);
    }

    pub fn get(&self, path_id: &str) -> Option<&NodeState> {
        self.nodes.get(path_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &NodeState)> {
        self.nodes.iter()
    }
}

/// Hides every layer in the tree.
pub fn hide_all_layers(tree: &mut LayerTree, map: &dyn MapHandle) {
    hide_all_layers_for_node(tree, NodeId::ROOT, map);
}

fn hide_all_layers_for_node(tree: &mut LayerTree, id: NodeId, map: &dyn MapHandle) {
    if let Some(hide) = tree.node(id).capabilities.hide_all.clone() {
        hide(tree, id, map);
        return;
    }
    for child in tree.children_of(id) {
        hide_all_layers_for_node(tree, child, map);
    }
}

/// Applies a previously captured snapshot to the tree.
pub fn set_service_state(tree: &mut LayerTree, state: &ServiceState, map: &dyn MapHandle) {
    set_service_state_for_node(tree, NodeId::ROOT, state, map);
}

fn set_service_state_for_node(
    tree: &mut LayerTree,
    id: NodeId,
    state: &ServiceState,
    map: &dyn MapHandle,
) {
    if let Some(apply) = tree.node(id).capabilities.apply_state.clone() {
        apply(tree, id, state, map);
        return;
    }
    for child in tree.children_of(id) {
        set_service_state_for_node(tree, child, state, map);
    }
}

/// Captures the state of every node that knows how to save itself.
pub fn get_service_state(tree: &LayerTree) -> ServiceState {
    let mut state = ServiceState::new();
    save_service_state_for_node(tree, NodeId::ROOT, &mut state);
    state
}

fn save_service_state_for_node(tree: &LayerTree, id: NodeId, state: &mut ServiceState) {
    let node = tree.node(id);
    if let Some(save) = &node.capabilities.save_state {
        save(tree, id, state);
        return;
    }
    for &child in node.children() {
        save_service_state_for_node(tree, child, state);
    }
}

/// Unchecks and collapses every node except the root.
///
/// The root stays expanded so the top level remains visible.
pub fn clear_service_state(tree: &mut LayerTree) {
    clear_service_state_for_node(tree, NodeId::ROOT);
}

fn clear_service_state_for_node(tree: &mut LayerTree, id: NodeId) {
    let node = tree.node_mut(id);
    if !node.is_root() {
        node.checked = false;
        node.expanded = false;
    }
    for child in tree.children_of(id) {
        clear_service_state_for_node(tree, child);
    }
}

impl NodeCapabilities {
    /// Standard behavior for a leaf driven by its [`LayerToggle`](super::LayerToggle).
    ///
    /// - hide: uncheck and hide the layer on the map
    /// - save: record `checked`/`expanded` under the leaf's path id
    /// - apply: restore the recorded flags and show or hide the layer to
    ///   match; leaves missing from the snapshot are left alone
    pub fn toggle_leaf() -> Self {
        Self {
            hide_all: Some(Arc::new(|tree: &mut LayerTree, id: NodeId, map: &dyn MapHandle| {
                let node = tree.node_mut(id);
                node.checked = false;
                if let Some(leaf) = node.as_leaf() {
                    leaf.toggle.show_or_hide(map, &leaf.layer_id, false);
                }
            })),
            apply_state: Some(Arc::new(
                |tree: &mut LayerTree, id: NodeId, state: &ServiceState, map: &dyn MapHandle| {
                    let node = tree.node_mut(id);
                    let Some(saved) = state.get(&node.name) else {
                        return;
                    };
                    node.checked = saved.checked;
                    node.expanded = saved.expanded;
                    if let Some(leaf) = node.as_leaf() {
                        leaf.toggle.show_or_hide(map, &leaf.layer_id, saved.checked);
                    }
                },
            )),
            save_state: Some(Arc::new(
                |tree: &LayerTree, id: NodeId, state: &mut ServiceState| {
                    let node = tree.node(id);
                    state.insert(
                        node.name.clone(),
                        NodeState {
                            checked: node.checked,
                            expanded: node.expanded,
                        },
                    );
                },
            )),
        }
    }
}

impl LayerTree {
    pub fn hide_all_layers(&mut self, map: &dyn MapHandle) {
        hide_all_layers(self, map);
    }

    pub fn set_service_state(&mut self, state: &ServiceState, map: &dyn MapHandle) {
        set_service_state(self, state, map);
    }

    pub fn get_service_state(&self) -> ServiceState {
        get_service_state(self)
    }

    pub fn clear_service_state(&mut self) {
        clear_service_state(self);
    }
}
