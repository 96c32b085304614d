//! Scene hierarchy types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::transform::{Transform, Trs};

/// Scene: an ordered list of root nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<usize>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Node of the scene hierarchy
///
/// On the wire a node carries `translation`/`rotation`/`scale` or `matrix`;
/// in memory that choice is the [`Transform`] enum. Fields the core does not
/// interpret (camera, extensions, extras) travel in `other`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "NodeRepr", into = "NodeRepr")]
pub struct Node {
    pub name: Option<String>,
    pub children: Vec<usize>,
    pub mesh: Option<usize>,
    pub transform: Transform,
    pub other: Map<String, Value>,
}

impl Node {
    /// Node with a mesh and nothing else
    pub fn with_mesh(mesh: usize) -> Self {
        Self {
            mesh: Some(mesh),
            ..Self::default()
        }
    }

    /// Node grouping `children`
    pub fn group(children: Vec<usize>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    /// Builder-style name setter
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder-style transform setter
    pub fn transformed(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mesh: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    matrix: Option<[f32; 16]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    translation: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rotation: Option<[f32; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scale: Option<[f32; 3]>,
    #[serde(flatten)]
    other: Map<String, Value>,
}

impl From<NodeRepr> for Node {
    fn from(repr: NodeRepr) -> Self {
        // glTF forbids both forms on one node; a matrix wins if a file has both
        let transform = match repr.matrix {
            Some(m) => Transform::Matrix(m),
            None => Transform::Trs(Trs {
                translation: repr.translation,
                rotation: repr.rotation,
                scale: repr.scale,
            }),
        };
        Self {
            name: repr.name,
            children: repr.children,
            mesh: repr.mesh,
            transform,
            other: repr.other,
        }
    }
}

impl From<Node> for NodeRepr {
    fn from(node: Node) -> Self {
        let (matrix, trs) = match node.transform {
            Transform::Matrix(m) => (Some(m), Trs::default()),
            Transform::Trs(trs) => (None, trs),
        };
        Self {
            name: node.name,
            children: node.children,
            mesh: node.mesh,
            matrix,
            translation: trs.translation,
            rotation: trs.rotation,
            scale: trs.scale,
            other: node.other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_trs_from_json() {
        let node: Node = serde_json::from_value(json!({
            "name": "Lamp",
            "children": [1, 2],
            "translation": [1.0, 2.0, 3.0],
            "camera": 0
        }))
        .unwrap();

        assert_eq!(node.name.as_deref(), Some("Lamp"));
        assert_eq!(node.children, vec![1, 2]);
        assert_eq!(
            node.transform,
            Transform::Trs(Trs {
                translation: Some([1.0, 2.0, 3.0]),
                rotation: None,
                scale: None,
            })
        );
        assert_eq!(node.other.get("camera"), Some(&json!(0)));
    }

    #[test]
    fn test_matrix_node_writes_no_trs() {
        let node = Node::with_mesh(3).transformed(Transform::from_matrix(glam::Mat4::IDENTITY));
        let value = serde_json::to_value(&node).unwrap();

        assert_eq!(value["mesh"], json!(3));
        assert!(value.get("matrix").is_some());
        assert!(value.get("translation").is_none());
        assert!(value.get("children").is_none());
    }

    #[test]
    fn test_matrix_wins_over_trs() {
        let mut cols = [0.0f32; 16];
        cols[0] = 1.0;
        cols[5] = 1.0;
        cols[10] = 1.0;
        cols[15] = 1.0;
        let node: Node = serde_json::from_value(json!({
            "matrix": cols,
            "translation": [5.0, 5.0, 5.0]
        }))
        .unwrap();
        assert_eq!(node.transform, Transform::Matrix(cols));
    }
}
