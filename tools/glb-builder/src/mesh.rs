//! High-level mesh construction

use glbslice_core::document::{Attributes, Primitive};

use crate::buffer::BufferBuilder;

/// Accessor indices for a mesh
#[derive(Debug, Clone)]
pub struct MeshAccessors {
    pub positions: usize,
    pub normals: Option<usize>,
    pub tangents: Option<usize>,
    pub uvs: Option<usize>,
    pub colors: Option<usize>,
    pub indices: Option<usize>,
}

impl MeshAccessors {
    /// Triangle primitive reading these accessors
    pub fn primitive(&self, material: Option<usize>) -> Primitive {
        let mut attributes = Attributes::new();
        attributes.insert("POSITION".to_string(), self.positions);
        let optional = [
            ("NORMAL", self.normals),
            ("TANGENT", self.tangents),
            ("TEXCOORD_0", self.uvs),
            ("COLOR_0", self.colors),
        ];
        for (name, accessor) in optional {
            if let Some(accessor) = accessor {
                attributes.insert(name.to_string(), accessor);
            }
        }

        Primitive {
            attributes,
            indices: self.indices,
            material,
            ..Primitive::default()
        }
    }
}

/// Builder for mesh data
#[derive(Debug, Default)]
pub struct MeshBuilder {
    positions: Vec<[f32; 3]>,
    normals: Option<Vec<[f32; 3]>>,
    tangents: Option<Vec<[f32; 4]>>,
    uvs: Option<Vec<[f32; 2]>>,
    colors: Option<Vec<[f32; 4]>>,
    indices: Option<Vec<u16>>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set positions (required)
    pub fn positions(mut self, positions: &[[f32; 3]]) -> Self {
        self.positions = positions.to_vec();
        self
    }

    /// Set normals (optional)
    pub fn normals(mut self, normals: &[[f32; 3]]) -> Self {
        self.normals = Some(normals.to_vec());
        self
    }

    /// Set tangents with handedness in w (optional)
    pub fn tangents(mut self, tangents: &[[f32; 4]]) -> Self {
        self.tangents = Some(tangents.to_vec());
        self
    }

    /// Set UVs (optional)
    pub fn uvs(mut self, uvs: &[[f32; 2]]) -> Self {
        self.uvs = Some(uvs.to_vec());
        self
    }

    /// Set vertex colors (optional)
    pub fn colors(mut self, colors: &[[f32; 4]]) -> Self {
        self.colors = Some(colors.to_vec());
        self
    }

    /// Set indices (optional)
    pub fn indices(mut self, indices: &[u16]) -> Self {
        self.indices = Some(indices.to_vec());
        self
    }

    /// Build and pack into buffer
    pub fn build(self, buffer: &mut BufferBuilder) -> MeshAccessors {
        let positions = buffer.pack_positions(&self.positions);
        let normals = self.normals.as_ref().map(|n| buffer.pack_vec3(n));
        let tangents = self.tangents.as_ref().map(|t| buffer.pack_vec4(t));
        let uvs = self.uvs.as_ref().map(|uv| buffer.pack_vec2(uv));
        let colors = self.colors.as_ref().map(|c| buffer.pack_vec4(c));
        let indices = self.indices.as_ref().map(|i| buffer.pack_indices_u16(i));

        MeshAccessors {
            positions,
            normals,
            tangents,
            uvs,
            colors,
            indices,
        }
    }
}
