//! Reference compaction
//!
//! Two passes, always in this order:
//!
//! 1. [`compact_objects`] - keeps the meshes, materials, textures and images
//!    that surviving nodes can reach and renumbers them densely.
//! 2. [`repack_buffers`] - keeps the accessors and buffer views those objects
//!    read and copies their bytes into a single fresh payload.
//!
//! Liveness always flows from nodes downward, so running the object pass
//! first is what lets the repack pass drop the data of removed meshes and
//! images.

mod binary;
mod objects;

pub use binary::{OPAQUE_REFERENCE_EXTENSIONS, repack_buffers};
pub use objects::compact_objects;

use crate::document::Document;
use crate::error::Result;

/// What a [`compact`] call removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactStats {
    pub meshes: usize,
    pub materials: usize,
    pub textures: usize,
    pub images: usize,
    pub accessors: usize,
    pub buffer_views: usize,
    /// Total payload bytes before compaction
    pub bytes_before: usize,
    /// Payload bytes after compaction
    pub bytes_after: usize,
}

impl CompactStats {
    fn between(before: &Document, after: &Document) -> Self {
        let bytes = |doc: &Document| doc.payloads.iter().map(Vec::len).sum();
        Self {
            meshes: before.meshes.len() - after.meshes.len(),
            materials: before.materials.len() - after.materials.len(),
            textures: before.textures.len() - after.textures.len(),
            images: before.images.len() - after.images.len(),
            accessors: before.accessors.len() - after.accessors.len(),
            buffer_views: before.buffer_views.len() - after.buffer_views.len(),
            bytes_before: bytes(before),
            bytes_after: bytes(after),
        }
    }
}

/// Run both compaction passes
pub fn compact(doc: &Document) -> Result<(Document, CompactStats)> {
    let objects = compact_objects(doc)?;
    let packed = repack_buffers(&objects)?;
    let stats = CompactStats::between(doc, &packed);
    tracing::debug!(
        "Compacted: -{} meshes, -{} materials, -{} textures, -{} images, -{} accessors, -{} views, {} -> {} bytes",
        stats.meshes,
        stats.materials,
        stats.textures,
        stats.images,
        stats.accessors,
        stats.buffer_views,
        stats.bytes_before,
        stats.bytes_after
    );
    Ok((packed, stats))
}
