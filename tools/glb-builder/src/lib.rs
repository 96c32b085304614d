//! GLB generation utilities for glbslice
//!
//! This library provides builder-pattern APIs for constructing documents
//! in the glbslice document model and writing them as GLB files:
//! - BufferBuilder: Pack binary data with automatic alignment
//! - MeshBuilder: High-level mesh construction
//! - DocumentBuilder: Nodes, materials, textures and scenes
//! - assemble_glb: GLB container writer
//!
//! # Example
//!
//! ```no_run
//! use glb_builder::*;
//!
//! let mut buffer = BufferBuilder::new();
//! let mesh = MeshBuilder::new()
//!     .positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]])
//!     .normals(&[[0.0, 0.0, 1.0]; 3])
//!     .indices(&[0, 1, 2])
//!     .build(&mut buffer);
//!
//! let doc = DocumentBuilder::new()
//!     .add_mesh_from_accessors("Triangle", &mesh, None)
//!     .add_node(Node::with_mesh(0))
//!     .add_scene("Scene", &[0])
//!     .build(buffer, "glb-builder");
//!
//! let glb_bytes = assemble_glb(&doc).unwrap();
//! ```

pub mod buffer;
pub mod document;
pub mod mesh;
pub mod utils;

pub use buffer::BufferBuilder;
pub use document::DocumentBuilder;
pub use mesh::{MeshAccessors, MeshBuilder};
pub use utils::{align_buffer, assemble_glb, compute_bounds, glb_bytes};

// Re-export the document types builders produce
pub use glbslice_core::document::{
    Document, Image, Material, Mesh, Node, PbrMetallicRoughness, Primitive, Texture, TextureInfo,
};
pub use glbslice_core::transform::Transform;
