//! JSON export in tree-store shape.
//!
//! Serializes the tree as nested objects with `children` arrays, the shape
//! tree widgets consume directly. Capabilities and toggles are not exported.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use super::{LayerTree, NodeId, NodeKind};

struct NodeView<'a> {
    tree: &'a LayerTree,
    id: NodeId,
}

struct ChildrenView<'a> {
    tree: &'a LayerTree,
    children: &'a [NodeId],
}

impl Serialize for LayerTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        NodeView {
            tree: self,
            id: self.root(),
        }
        .serialize(serializer)
    }
}

impl Serialize for NodeView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.tree.node(self.id);
        let mut map = serializer.serialize_map(None)?;

        match &node.kind {
            NodeKind::Root => {
                map.serialize_entry("name", node.name())?;
                map.serialize_entry("expanded", &node.expanded)?;
            }
            NodeKind::Container(container) => {
                map.serialize_entry("type", &container.node_type)?;
                map.serialize_entry("cls", &container.cls)?;
                map.serialize_entry("text", node.text())?;
                map.serialize_entry("name", node.name())?;
                map.serialize_entry("leaf", &false)?;
                map.serialize_entry("expanded", &node.expanded)?;
                map.serialize_entry("checked", &node.checked)?;
                if let Some(is_new) = container.is_new {
                    map.serialize_entry("isNew", &is_new)?;
                }
            }
            NodeKind::Leaf(leaf) => {
                map.serialize_entry("type", "layer")?;
                map.serialize_entry("cls", &leaf.cls)?;
                map.serialize_entry("text", node.text())?;
                map.serialize_entry("name", node.name())?;
                map.serialize_entry("leaf", &true)?;
                map.serialize_entry("checked", &node.checked)?;
                map.serialize_entry("layerId", &leaf.layer_id)?;
                if let Some(is_new) = leaf.is_new {
                    map.serialize_entry("isNew", &is_new)?;
                }
                if let Some(url) = &leaf.download_url {
                    map.serialize_entry("downloadUrl", url)?;
                }
                if let Some(ids) = &leaf.visible_sub_layer_ids {
                    map.serialize_entry("visibleSubLayerIds", ids)?;
                }
            }
        }

        if let Some(children) = &node.children {
            map.serialize_entry(
                "children",
                &ChildrenView {
                    tree: self.tree,
                    children,
                },
            )?;
        }
        map.end()
    }
}

impl Serialize for ChildrenView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.children.len()))?;
        for &id in self.children {
            seq.serialize_element(&NodeView {
                tree: self.tree,
                id,
            })?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{LeafConfig, MapHandle};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_export_shape() {
        let mut tree = LayerTree::default();
        let folder = tree.create_container("Imagery", "folder", tree.root(), None);
        let config = LeafConfig {
            visible_sub_layer_ids: Some(vec!["1".to_string(), "2".to_string()]),
            ..LeafConfig::default()
        };
        tree.create_leaf(
            "Ortho_2020",
            "ortho",
            Arc::new(|_: &dyn MapHandle, _: &str, _: bool| {}),
            folder,
            Some(&config),
        );

        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "root",
                "expanded": true,
                "children": [{
                    "type": "folder",
                    "cls": "pluginLayerSelector-folder",
                    "text": "Imagery",
                    "name": "Imagery",
                    "leaf": false,
                    "expanded": false,
                    "checked": false,
                    "children": [{
                        "type": "layer",
                        "cls": "pluginLayerSelector-layer",
                        "text": "Ortho 2020",
                        "name": "Imagery/Ortho 2020",
                        "leaf": true,
                        "checked": false,
                        "layerId": "ortho",
                        "visibleSubLayerIds": ["1", "2"]
                    }]
                }]
            })
        );
    }
}
