//! Meshes and primitives

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Attribute name (`POSITION`, `TEXCOORD_0`, `_CUSTOM`...) to accessor index
///
/// Ordered so iteration, and therefore output, is deterministic.
pub type Attributes = BTreeMap<String, usize>;

/// Mesh: an ordered list of primitives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mesh {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Drawable unit of a mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Primitive {
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<usize>,
    /// Morph targets, each a partial attribute map
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<Attributes>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Primitive {
    /// Every accessor this primitive reads: attributes, indices, morph targets
    pub fn accessor_refs(&self) -> impl Iterator<Item = usize> + '_ {
        self.attributes
            .values()
            .copied()
            .chain(self.indices)
            .chain(self.targets.iter().flat_map(|t| t.values().copied()))
    }

    /// Rewrite every accessor reference through `f`
    pub fn remap_accessors<E>(
        &mut self,
        mut f: impl FnMut(usize) -> Result<usize, E>,
    ) -> Result<(), E> {
        for index in self.attributes.values_mut() {
            *index = f(*index)?;
        }
        if let Some(index) = self.indices.as_mut() {
            *index = f(*index)?;
        }
        for target in &mut self.targets {
            for index in target.values_mut() {
                *index = f(*index)?;
            }
        }
        Ok(())
    }
}
