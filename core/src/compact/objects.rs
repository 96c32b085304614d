//! Scene-object liveness: meshes, materials, textures, images

use std::collections::BTreeSet;

use crate::document::Document;
use crate::error::{Result, check_index};
use crate::remap::Remap;

/// Drop meshes, materials, textures and images no node can reach
///
/// Liveness is computed top-down (nodes, then meshes, then materials,
/// then textures) and every collection is renumbered in ascending original
/// order. Samplers, accessors and buffer views are left untouched.
///
/// # Errors
///
/// Structural errors for references past the end of their collection, or
/// for malformed extension texture slots.
pub fn compact_objects(doc: &Document) -> Result<Document> {
    let mut live_meshes = BTreeSet::new();
    for (i, node) in doc.nodes.iter().enumerate() {
        if let Some(mesh) = node.mesh {
            live_meshes.insert(check_index("mesh", mesh, doc.meshes.len(), || {
                format!("node {i}")
            })?);
        }
    }
    let meshes = Remap::from_live("mesh", doc.meshes.len(), &live_meshes)?;

    let mut live_materials = BTreeSet::new();
    for old in meshes.survivors() {
        for (p, prim) in doc.meshes[old].primitives.iter().enumerate() {
            if let Some(material) = prim.material {
                live_materials.insert(check_index(
                    "material",
                    material,
                    doc.materials.len(),
                    || format!("mesh {old} primitive {p}"),
                )?);
            }
        }
    }
    let materials = Remap::from_live("material", doc.materials.len(), &live_materials)?;

    let mut live_textures = BTreeSet::new();
    for old in materials.survivors() {
        for texture in doc.materials[old].texture_refs(old)? {
            live_textures.insert(check_index("texture", texture, doc.textures.len(), || {
                format!("material {old}")
            })?);
        }
    }
    let textures = Remap::from_live("texture", doc.textures.len(), &live_textures)?;

    let mut live_images = BTreeSet::new();
    for old in textures.survivors() {
        for image in doc.textures[old].image_refs() {
            live_images.insert(check_index("image", image, doc.images.len(), || {
                format!("texture {old}")
            })?);
        }
    }
    let images = Remap::from_live("image", doc.images.len(), &live_images)?;

    let mut out = doc.clone();

    for node in &mut out.nodes {
        if let Some(mesh) = node.mesh.as_mut() {
            *mesh = meshes.get(*mesh)?;
        }
    }

    out.meshes = meshes.filter(&doc.meshes);
    for mesh in &mut out.meshes {
        for prim in &mut mesh.primitives {
            if let Some(material) = prim.material.as_mut() {
                *material = materials.get(*material)?;
            }
        }
    }

    out.materials = materials.filter(&doc.materials);
    for (new, material) in out.materials.iter_mut().enumerate() {
        material.remap_textures(new, |t| textures.get(t))?;
    }

    out.textures = textures.filter(&doc.textures);
    for texture in &mut out.textures {
        texture.remap_images(|i| images.get(i))?;
    }

    out.images = images.filter(&doc.images);

    Ok(out)
}
