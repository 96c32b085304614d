//! Shared fixtures for unit tests

use crate::document::{
    Accessor, Buffer, BufferView, Document, Image, Material, Mesh, Node, PbrMetallicRoughness,
    Primitive, Scene, Texture, TextureInfo, component_type,
};

// ============================================================================
// Document Fixture
// ============================================================================

/// Incremental builder for single-buffer test documents
///
/// Views are appended at 4-byte aligned offsets in insertion order, so a
/// fixture whose views are all referenced is already compact.
#[derive(Default)]
pub struct Fixture {
    pub doc: Document,
    payload: Vec<u8>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` as a new view of buffer 0
    pub fn view(&mut self, bytes: &[u8]) -> usize {
        while self.payload.len() % 4 != 0 {
            self.payload.push(0);
        }
        let offset = self.payload.len();
        self.payload.extend_from_slice(bytes);
        self.doc
            .buffer_views
            .push(BufferView::new(0, offset, bytes.len()));
        self.doc.buffer_views.len() - 1
    }

    /// Float VEC3 accessor with min/max
    pub fn positions(&mut self, positions: &[[f32; 3]]) -> usize {
        let bytes: Vec<u8> = positions
            .iter()
            .flatten()
            .flat_map(|f| f.to_le_bytes())
            .collect();
        let view = self.view(&bytes);

        let mut min = [f64::MAX; 3];
        let mut max = [f64::MIN; 3];
        for p in positions {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis] as f64);
                max[axis] = max[axis].max(p[axis] as f64);
            }
        }

        self.doc.accessors.push(Accessor {
            buffer_view: Some(view),
            component_type: component_type::FLOAT,
            count: positions.len(),
            type_: "VEC3".into(),
            min: Some(min.to_vec()),
            max: Some(max.to_vec()),
            ..Accessor::default()
        });
        self.doc.accessors.len() - 1
    }

    /// Float VEC3 accessor without bounds (normals, tangents...)
    pub fn vec3(&mut self, data: &[[f32; 3]]) -> usize {
        let accessor = self.positions(data);
        self.doc.accessors[accessor].min = None;
        self.doc.accessors[accessor].max = None;
        accessor
    }

    /// u16 index accessor
    pub fn indices(&mut self, indices: &[u16]) -> usize {
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let view = self.view(&bytes);
        self.doc.accessors.push(Accessor {
            buffer_view: Some(view),
            component_type: component_type::UNSIGNED_SHORT,
            count: indices.len(),
            type_: "SCALAR".into(),
            ..Accessor::default()
        });
        self.doc.accessors.len() - 1
    }

    /// Mesh with one primitive
    pub fn mesh(
        &mut self,
        attributes: &[(&str, usize)],
        indices: Option<usize>,
        material: Option<usize>,
    ) -> usize {
        self.doc.meshes.push(Mesh {
            name: None,
            primitives: vec![Primitive {
                attributes: attributes
                    .iter()
                    .map(|(name, accessor)| (name.to_string(), *accessor))
                    .collect(),
                indices,
                material,
                ..Primitive::default()
            }],
            ..Mesh::default()
        });
        self.doc.meshes.len() - 1
    }

    /// Indexed triangle spanning `[min, max]` on every axis
    pub fn triangle(&mut self, min: f32, max: f32, material: Option<usize>) -> usize {
        let positions = self.positions(&[[min, min, min], [max, min, max], [min, max, max]]);
        let indices = self.indices(&[0, 1, 2]);
        self.mesh(&[("POSITION", positions)], Some(indices), material)
    }

    /// Embedded image behind a texture; returns the texture index
    pub fn texture(&mut self, image_bytes: &[u8]) -> usize {
        let view = self.view(image_bytes);
        self.doc.images.push(Image::embedded(view, "image/png"));
        self.doc
            .textures
            .push(Texture::with_source(self.doc.images.len() - 1));
        self.doc.textures.len() - 1
    }

    /// Material sampling `texture` as base color
    pub fn base_color_material(&mut self, texture: usize) -> usize {
        self.material(Material {
            pbr_metallic_roughness: Some(PbrMetallicRoughness {
                base_color_texture: Some(TextureInfo::new(texture)),
                ..PbrMetallicRoughness::default()
            }),
            ..Material::default()
        })
    }

    pub fn material(&mut self, material: Material) -> usize {
        self.doc.materials.push(material);
        self.doc.materials.len() - 1
    }

    pub fn node(&mut self, node: Node) -> usize {
        self.doc.nodes.push(node);
        self.doc.nodes.len() - 1
    }

    /// Finish with one scene over `roots`
    pub fn build(mut self, roots: Vec<usize>) -> Document {
        self.doc.scene = Some(0);
        self.doc.scenes = vec![Scene {
            nodes: roots,
            ..Scene::default()
        }];
        if !self.doc.buffer_views.is_empty() {
            self.doc.buffers = vec![Buffer {
                byte_length: self.payload.len(),
                ..Buffer::default()
            }];
            self.doc.payloads = vec![self.payload];
        }
        self.doc
    }
}

// ============================================================================
// Assertions
// ============================================================================

/// Every index reference of `doc` points at an existing object
pub fn assert_refs_in_bounds(doc: &Document) {
    for scene in &doc.scenes {
        assert!(scene.nodes.iter().all(|&n| n < doc.nodes.len()));
    }
    for node in &doc.nodes {
        assert!(node.children.iter().all(|&c| c < doc.nodes.len()));
        assert!(node.mesh.is_none_or(|m| m < doc.meshes.len()));
    }
    for mesh in &doc.meshes {
        for prim in &mesh.primitives {
            assert!(prim.accessor_refs().all(|a| a < doc.accessors.len()));
            assert!(prim.material.is_none_or(|m| m < doc.materials.len()));
        }
    }
    for (i, material) in doc.materials.iter().enumerate() {
        let refs = material.texture_refs(i).expect("well-formed texture slots");
        assert!(refs.iter().all(|&t| t < doc.textures.len()));
    }
    for texture in &doc.textures {
        assert!(texture.image_refs().iter().all(|&i| i < doc.images.len()));
    }
    for accessor in &doc.accessors {
        assert!(accessor.buffer_view_refs().all(|v| v < doc.buffer_views.len()));
    }
    for image in &doc.images {
        assert!(image.buffer_view.is_none_or(|v| v < doc.buffer_views.len()));
    }
    for (i, view) in doc.buffer_views.iter().enumerate() {
        assert!(view.buffer < doc.buffers.len());
        assert!(
            view.end().is_some_and(|end| end <= doc.payloads[view.buffer].len()),
            "view {i} ends past its payload"
        );
    }
}
