//! Binary repack: accessors, buffer views and the payload

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::document::{Buffer, BufferView, Document};
use crate::error::{Error, Result, check_index};
use crate::remap::Remap;

/// Byte alignment of every view in the repacked payload
pub const VIEW_ALIGNMENT: usize = 4;

/// Extensions that hold accessor or buffer view indices the repack cannot
/// see, so their references would dangle after renumbering
pub const OPAQUE_REFERENCE_EXTENSIONS: &[&str] = &[
    "KHR_draco_mesh_compression",
    "EXT_meshopt_compression",
    "KHR_meshopt_compression",
    "EXT_mesh_gpu_instancing",
];

/// Keep the accessors and views that meshes and images read, and copy their
/// bytes into one new payload
///
/// Views are written in ascending original index order. Each offset is the
/// running payload length rounded up to [`VIEW_ALIGNMENT`]; the gap is
/// zero-filled. The result has a single buffer, or none when no view
/// survives.
///
/// # Errors
///
/// Structural errors for out-of-range references and for views whose range
/// falls outside their source payload. [`Error::Unsupported`] when the
/// document uses one of [`OPAQUE_REFERENCE_EXTENSIONS`].
pub fn repack_buffers(doc: &Document) -> Result<Document> {
    reject_opaque_references(doc)?;

    let mut live_accessors = BTreeSet::new();
    for (m, mesh) in doc.meshes.iter().enumerate() {
        for (p, prim) in mesh.primitives.iter().enumerate() {
            for accessor in prim.accessor_refs() {
                live_accessors.insert(check_index(
                    "accessor",
                    accessor,
                    doc.accessors.len(),
                    || format!("mesh {m} primitive {p}"),
                )?);
            }
        }
    }
    let accessors = Remap::from_live("accessor", doc.accessors.len(), &live_accessors)?;

    let mut live_views = BTreeSet::new();
    for old in accessors.survivors() {
        for view in doc.accessors[old].buffer_view_refs() {
            live_views.insert(check_index("bufferView", view, doc.buffer_views.len(), || {
                format!("accessor {old}")
            })?);
        }
    }
    for (i, image) in doc.images.iter().enumerate() {
        if let Some(view) = image.buffer_view {
            live_views.insert(check_index("bufferView", view, doc.buffer_views.len(), || {
                format!("image {i}")
            })?);
        }
    }
    let views = Remap::from_live("bufferView", doc.buffer_views.len(), &live_views)?;

    let mut payload = Vec::new();
    let mut buffer_views = Vec::with_capacity(views.live_count());
    for old in views.survivors() {
        let bytes = doc.view_bytes(old)?;
        pad_to_alignment(&mut payload);
        let offset = payload.len();
        payload.extend_from_slice(bytes);
        buffer_views.push(relocated(&doc.buffer_views[old], offset));
    }

    let mut out = doc.clone();

    out.accessors = accessors.filter(&doc.accessors);
    for accessor in &mut out.accessors {
        accessor.remap_buffer_views(|v| views.get(v))?;
    }
    for mesh in &mut out.meshes {
        for prim in &mut mesh.primitives {
            prim.remap_accessors(|a| accessors.get(a))?;
        }
    }
    for image in &mut out.images {
        if let Some(view) = image.buffer_view.as_mut() {
            *view = views.get(*view)?;
        }
    }

    if buffer_views.is_empty() {
        out.buffers = Vec::new();
        out.payloads = Vec::new();
    } else {
        out.buffers = vec![Buffer {
            byte_length: payload.len(),
            name: doc.buffers.first().and_then(|b| b.name.clone()),
            ..Buffer::default()
        }];
        out.payloads = vec![payload];
    }
    out.buffer_views = buffer_views;

    Ok(out)
}

/// Fail on extensions whose index references would be left stale
fn reject_opaque_references(doc: &Document) -> Result<()> {
    let unsupported = |extension: &str, at: String| {
        Error::Unsupported(format!(
            "{extension} on {at} references buffer data that cannot be repacked"
        ))
    };

    if let Some(ext) = doc
        .extensions_used
        .iter()
        .find(|e| OPAQUE_REFERENCE_EXTENSIONS.contains(&e.as_str()))
    {
        return Err(unsupported(ext.as_str(), "the document".into()));
    }
    for (i, node) in doc.nodes.iter().enumerate() {
        if let Some(ext) = opaque_extension(&node.other) {
            return Err(unsupported(ext, format!("node {i}")));
        }
    }
    for (m, mesh) in doc.meshes.iter().enumerate() {
        for (p, prim) in mesh.primitives.iter().enumerate() {
            if let Some(ext) = opaque_extension(&prim.other) {
                return Err(unsupported(ext, format!("mesh {m} primitive {p}")));
            }
        }
    }
    for (i, view) in doc.buffer_views.iter().enumerate() {
        if let Some(ext) = opaque_extension(&view.other) {
            return Err(unsupported(ext, format!("bufferView {i}")));
        }
    }
    Ok(())
}

/// First opaque extension in an object's `extensions` member
fn opaque_extension(other: &Map<String, Value>) -> Option<&'static str> {
    let extensions = other.get("extensions")?.as_object()?;
    OPAQUE_REFERENCE_EXTENSIONS
        .iter()
        .copied()
        .find(|name| extensions.contains_key(*name))
}

fn pad_to_alignment(payload: &mut Vec<u8>) {
    let padded = payload.len().next_multiple_of(VIEW_ALIGNMENT);
    payload.resize(padded, 0);
}

/// Copy of `view` moved to `offset` in buffer 0
fn relocated(view: &BufferView, offset: usize) -> BufferView {
    BufferView {
        buffer: 0,
        // Keep an implicit zero offset implicit
        byte_offset: match (view.byte_offset, offset) {
            (None, 0) => None,
            _ => Some(offset),
        },
        ..view.clone()
    }
}
