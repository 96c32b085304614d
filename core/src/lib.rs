//! glbslice core - glTF document surgery
//!
//! This crate holds the algorithms that rewrite the in-memory object graph of
//! a glTF/GLB asset while keeping every cross-reference and the binary
//! payload consistent.
//!
//! # Architecture
//!
//! - [`Document`] - Typed glTF graph plus one binary payload per buffer
//! - [`prune_nodes`] - Removes subtrees that can never draw anything
//! - [`split_document`] - Cuts a scene into independent single-root documents
//! - [`compact`] - Drops unreferenced objects and repacks the payload
//! - [`align_document`] - Moves the bounding box onto an alignment point
//!
//! Every stage takes `&Document` and returns a fresh document; nothing is
//! mutated in place.

pub mod align;
pub mod attributes;
pub mod bounds;
pub mod compact;
pub mod document;
pub mod error;
pub mod prune;
pub mod remap;
pub mod split;
#[cfg(test)]
pub mod test_utils;
pub mod transform;

pub use align::{AlignOutcome, Alignment, AxisAlign, SizeRecord, align_document, align_with};
pub use attributes::{DEFAULT_STRIPPED, strip_attributes};
pub use bounds::{Aabb, BoundsProvider, VertexBounds};
pub use compact::{
    CompactStats, OPAQUE_REFERENCE_EXTENSIONS, compact, compact_objects, repack_buffers,
};
pub use document::{
    Accessor, Asset, Buffer, BufferView, Document, Image, Material, Mesh, Node, Primitive, Scene,
    Texture, TextureInfo,
};
pub use error::{Error, Result};
pub use prune::{PruneReport, dead_nodes, prune_nodes};
pub use remap::Remap;
pub use split::{Granularity, SplitPart, split_document};
pub use transform::{Transform, Trs, combine};
