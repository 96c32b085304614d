//! In-memory glTF document
//!
//! The JSON layout maps onto these types with serde. Members the core does
//! not interpret are kept in `other` maps so they survive a load/save cycle.
//! Binary payloads are held per buffer in [`Document::payloads`] and never
//! serialized with the JSON.

mod buffer;
mod material;
mod mesh;
mod node;

pub use buffer::{Accessor, Buffer, BufferView, Sparse, SparseStorage, component_type};
pub use material::{
    EXTENSION_TEXTURE_SLOTS, Image, Material, PbrMetallicRoughness, TEXTURE_SOURCE_EXTENSIONS,
    Texture, TextureInfo,
};
pub use mesh::{Attributes, Mesh, Primitive};
pub use node::{Node, Scene};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result, check_index};

/// Top-level members dropped on load because pruning would leave their
/// node and accessor references dangling
pub const UNTRACKED_MEMBERS: &[&str] = &["skins", "animations"];

/// `asset` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Default for Asset {
    fn default() -> Self {
        Self {
            version: "2.0".to_string(),
            generator: None,
            other: Map::new(),
        }
    }
}

/// A parsed glTF document with its binary payloads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub asset: Asset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<Scene>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meshes: Vec<Mesh>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<Material>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub textures: Vec<Texture>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samplers: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessors: Vec<Accessor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffer_views: Vec<BufferView>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffers: Vec<Buffer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions_used: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions_required: Vec<String>,
    /// Unrecognized top-level members (cameras, extensions, extras...)
    #[serde(flatten)]
    pub other: Map<String, Value>,
    /// Binary data, one entry per buffer
    #[serde(skip)]
    pub payloads: Vec<Vec<u8>>,
}

impl Document {
    /// Parse the JSON part of a glTF asset
    ///
    /// Payloads are left empty; the container loader attaches them.
    pub fn from_json_slice(json: &[u8]) -> Result<Self> {
        let mut doc: Document = serde_json::from_slice(json)?;
        for member in UNTRACKED_MEMBERS {
            if doc.other.remove(*member).is_some() {
                tracing::warn!("Dropping '{}': not preserved across pruning", member);
            }
        }
        Ok(doc)
    }

    /// Serialize the JSON part
    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Index of the scene that is displayed by default
    ///
    /// `scene` if set, otherwise scene 0; `None` when there are no scenes.
    pub fn default_scene_index(&self) -> Result<Option<usize>> {
        match self.scene {
            Some(index) if index >= self.scenes.len() => Err(Error::MissingScene {
                index,
                len: self.scenes.len(),
            }),
            Some(index) => Ok(Some(index)),
            None if self.scenes.is_empty() => Ok(None),
            None => Ok(Some(0)),
        }
    }

    /// Top-level roots: the default scene's root list, or, without scenes,
    /// every node that is nobody's child, in index order
    pub fn top_level_roots(&self) -> Result<Vec<usize>> {
        let roots = match self.default_scene_index()? {
            Some(scene) => self.scenes[scene].nodes.clone(),
            None => {
                let mut has_parent = vec![false; self.nodes.len()];
                for (parent, node) in self.nodes.iter().enumerate() {
                    for &child in &node.children {
                        check_index("node", child, self.nodes.len(), || {
                            format!("children of node {parent}")
                        })?;
                        has_parent[child] = true;
                    }
                }
                (0..self.nodes.len()).filter(|&i| !has_parent[i]).collect()
            }
        };
        for &root in &roots {
            check_index("node", root, self.nodes.len(), || "scene roots".into())?;
        }
        Ok(roots)
    }

    /// Roots of every scene, deduplicated, in first-seen order
    pub fn all_scene_roots(&self) -> Result<Vec<usize>> {
        let mut seen = vec![false; self.nodes.len()];
        let mut roots = Vec::new();
        for (scene_index, scene) in self.scenes.iter().enumerate() {
            for &root in &scene.nodes {
                check_index("node", root, self.nodes.len(), || {
                    format!("scene {scene_index}")
                })?;
                if !seen[root] {
                    seen[root] = true;
                    roots.push(root);
                }
            }
        }
        Ok(roots)
    }

    /// Nodes whose transforms place geometry in the world: the roots of
    /// every scene, or the parentless nodes when there are no scenes
    pub fn root_nodes(&self) -> Result<Vec<usize>> {
        if self.scenes.is_empty() {
            self.top_level_roots()
        } else {
            self.all_scene_roots()
        }
    }

    /// Payload bytes of `buffer`
    pub fn payload(&self, buffer: usize) -> Result<&[u8]> {
        check_index("buffer", buffer, self.buffers.len(), || "payload lookup".into())?;
        self.payloads
            .get(buffer)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::Unsupported(format!("buffer {buffer} has no loaded payload")))
    }

    /// Bytes covered by buffer view `view`
    pub fn view_bytes(&self, view: usize) -> Result<&[u8]> {
        check_index("bufferView", view, self.buffer_views.len(), || {
            "view lookup".into()
        })?;
        let bv = &self.buffer_views[view];
        let payload = self.payload(bv.buffer)?;
        match bv.end() {
            Some(end) if end <= payload.len() => Ok(&payload[bv.offset()..end]),
            end => Err(Error::RangeOutOfBounds {
                what: format!("bufferView {view}"),
                start: bv.offset(),
                end: end.unwrap_or(usize::MAX),
                len: payload.len(),
            }),
        }
    }

    /// Whether any node carries a mesh
    pub fn has_mesh_nodes(&self) -> bool {
        self.nodes.iter().any(|n| n.mesh.is_some())
    }
}
