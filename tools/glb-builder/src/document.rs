//! Document construction

use glbslice_core::document::{
    Asset, Buffer, Document, Image, Material, Mesh, Node, Scene, Texture,
};

use crate::{BufferBuilder, MeshAccessors};

/// Builder for complete documents
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    nodes: Vec<Node>,
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    textures: Vec<Texture>,
    images: Vec<Image>,
    scenes: Vec<Scene>,
    extensions_used: Vec<String>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node
    pub fn add_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add multiple nodes
    pub fn add_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    /// Get the current node count
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add a mesh with a single triangle primitive
    pub fn add_mesh_from_accessors(
        mut self,
        name: &str,
        accessors: &MeshAccessors,
        material: Option<usize>,
    ) -> Self {
        self.meshes.push(Mesh {
            name: Some(name.to_string()),
            primitives: vec![accessors.primitive(material)],
            ..Mesh::default()
        });
        self
    }

    /// Add a fully built mesh
    pub fn add_mesh(mut self, mesh: Mesh) -> Self {
        self.meshes.push(mesh);
        self
    }

    /// Get the current mesh count
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Add a material
    pub fn add_material(mut self, material: Material) -> Self {
        self.materials.push(material);
        self
    }

    /// Embed encoded image bytes and add a texture sampling them
    pub fn add_embedded_texture(
        mut self,
        name: &str,
        buffer: &mut BufferBuilder,
        bytes: &[u8],
        mime_type: &str,
    ) -> Self {
        let view = buffer.pack_bytes(bytes);
        self.images.push(Image {
            name: Some(name.to_string()),
            ..Image::embedded(view, mime_type)
        });
        self.textures.push(Texture {
            name: Some(name.to_string()),
            ..Texture::with_source(self.images.len() - 1)
        });
        self
    }

    /// Get the current texture count
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Add a scene
    pub fn add_scene(mut self, name: &str, root_nodes: &[usize]) -> Self {
        self.scenes.push(Scene {
            name: Some(name.to_string()),
            nodes: root_nodes.to_vec(),
            ..Scene::default()
        });
        self
    }

    /// Declare an extension in `extensionsUsed`
    pub fn use_extension(mut self, name: &str) -> Self {
        if !self.extensions_used.iter().any(|e| e == name) {
            self.extensions_used.push(name.to_string());
        }
        self
    }

    /// Build the final document, taking the packed payload from `buffer`
    pub fn build(self, buffer: BufferBuilder, generator: &str) -> Document {
        let (payload, buffer_views, accessors) = buffer.into_parts();
        let (buffers, payloads) = if buffer_views.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            let buffer = Buffer {
                byte_length: payload.len(),
                ..Buffer::default()
            };
            (vec![buffer], vec![payload])
        };

        Document {
            asset: Asset {
                generator: Some(generator.to_string()),
                ..Asset::default()
            },
            scene: if self.scenes.is_empty() { None } else { Some(0) },
            scenes: self.scenes,
            nodes: self.nodes,
            meshes: self.meshes,
            materials: self.materials,
            textures: self.textures,
            images: self.images,
            accessors,
            buffer_views,
            buffers,
            extensions_used: self.extensions_used,
            payloads,
            ..Document::default()
        }
    }
}
