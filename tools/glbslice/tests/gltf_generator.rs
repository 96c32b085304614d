//! Programmatic GLB generation for integration tests.
//!
//! Generates a small furniture set:
//! - `Planters` root translated by (1, 2, 3)
//! - `Pot`: textured unit box translated by (4, 5, 6)
//! - `Plant` group holding `Leaf`, a box translated by (0, 1, 0)
//! - `Marker`: an empty node that pruning removes

#![allow(dead_code)]

use glb_builder::{
    BufferBuilder, Document, DocumentBuilder, Material, MeshAccessors, MeshBuilder, Node,
    PbrMetallicRoughness, TextureInfo, Transform, assemble_glb,
};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Side length of the generated pot texture
pub const TEXTURE_SIZE: u32 = 64;

/// Two triangles per box face
const BOX_INDICES: [u16; 36] = [
    0, 1, 3, 0, 3, 2, // -z
    4, 6, 7, 4, 7, 5, // +z
    0, 4, 5, 0, 5, 1, // -y
    2, 3, 7, 2, 7, 6, // +y
    0, 2, 6, 0, 6, 4, // -x
    1, 5, 7, 1, 7, 3, // +x
];

/// Encode a gradient as PNG
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 64 * 4) as u8, (y % 64 * 4) as u8, 96, 255])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Axis-aligned box spanning `min..max` on every axis
pub fn box_mesh(buffer: &mut BufferBuilder, min: f32, max: f32) -> MeshAccessors {
    let pick = |bit: bool| if bit { max } else { min };
    let corners: Vec<[f32; 3]> = (0..8)
        .map(|i| [pick(i & 1 != 0), pick(i & 2 != 0), pick(i & 4 != 0)])
        .collect();
    let normals: Vec<[f32; 3]> = corners
        .iter()
        .map(|c| {
            let mid = (min + max) * 0.5;
            let v = [c[0] - mid, c[1] - mid, c[2] - mid];
            let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            [v[0] / len, v[1] / len, v[2] / len]
        })
        .collect();
    let uvs: Vec<[f32; 2]> = corners
        .iter()
        .map(|c| [(c[0] - min) / (max - min), (c[1] - min) / (max - min)])
        .collect();

    MeshBuilder::new()
        .positions(&corners)
        .normals(&normals)
        .uvs(&uvs)
        .indices(&BOX_INDICES)
        .build(buffer)
}

/// The furniture set as a document
pub fn planters_document() -> Document {
    let mut buffer = BufferBuilder::new();
    let pot = box_mesh(&mut buffer, -0.5, 0.5);
    let leaf = box_mesh(&mut buffer, 0.0, 1.0);
    let texture = png_bytes(TEXTURE_SIZE, TEXTURE_SIZE);

    DocumentBuilder::new()
        .add_mesh_from_accessors("Pot", &pot, Some(0))
        .add_mesh_from_accessors("Leaf", &leaf, None)
        .add_embedded_texture("PotColor", &mut buffer, &texture, "image/png")
        .add_material(Material {
            name: Some("Terracotta".to_string()),
            pbr_metallic_roughness: Some(PbrMetallicRoughness {
                base_color_texture: Some(TextureInfo::new(0)),
                ..PbrMetallicRoughness::default()
            }),
            ..Material::default()
        })
        .add_nodes(vec![
            Node::group(vec![1, 2, 4])
                .named("Planters")
                .transformed(Transform::from_translation([1.0, 2.0, 3.0])),
            Node::with_mesh(0)
                .named("Pot")
                .transformed(Transform::from_translation([4.0, 5.0, 6.0])),
            Node::group(vec![3]).named("Plant"),
            Node::with_mesh(1)
                .named("Leaf")
                .transformed(Transform::from_translation([0.0, 1.0, 0.0])),
            Node::default().named("Marker"),
        ])
        .add_scene("Scene", &[0])
        .build(buffer, "gltf_generator")
}

/// The furniture set as GLB bytes
pub fn planters_glb() -> Vec<u8> {
    assemble_glb(&planters_document()).unwrap()
}
