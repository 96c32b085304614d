//! World-space bounding boxes

use glam::{Mat4, Vec3};

use crate::document::{Document, component_type};
use crate::error::{Error, Result, check_index};
use crate::prune::dead_nodes;
use crate::transform::combine;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box around a single point
    pub fn point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Grow to contain `p`
    pub fn extend(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Source of world-space geometry bounds
pub trait BoundsProvider {
    /// Bounds of every vertex reachable from the scene roots, with node
    /// transforms applied; `None` when there is no geometry
    fn world_bounds(&self, doc: &Document) -> Result<Option<Aabb>>;
}

/// Bounds computed by transforming every `POSITION` vertex
///
/// Float VEC3 data is read directly (honoring `byteStride`); anything else
/// falls back to the eight corners of the accessor's `min`/`max`.
#[derive(Debug, Default, Clone, Copy)]
pub struct VertexBounds;

impl BoundsProvider for VertexBounds {
    fn world_bounds(&self, doc: &Document) -> Result<Option<Aabb>> {
        // Rejects cycles and bad child indices before walking
        dead_nodes(&doc.nodes)?;

        let mut bounds: Option<Aabb> = None;
        let mut stack: Vec<(usize, Mat4)> = doc
            .root_nodes()?
            .into_iter()
            .rev()
            .map(|root| (root, Mat4::IDENTITY))
            .collect();

        while let Some((index, parent)) = stack.pop() {
            let node = &doc.nodes[index];
            let world = combine(parent, node.transform.to_matrix());

            if let Some(mesh) = node.mesh {
                check_index("mesh", mesh, doc.meshes.len(), || format!("node {index}"))?;
                for prim in &doc.meshes[mesh].primitives {
                    let Some(&accessor) = prim.attributes.get("POSITION") else {
                        continue;
                    };
                    check_index("accessor", accessor, doc.accessors.len(), || {
                        format!("mesh {mesh}")
                    })?;
                    for p in positions(doc, accessor)? {
                        let p = world.transform_point3(p);
                        match bounds.as_mut() {
                            Some(b) => b.extend(p),
                            None => bounds = Some(Aabb::point(p)),
                        }
                    }
                }
            }

            stack.extend(node.children.iter().rev().map(|&child| (child, world)));
        }

        Ok(bounds)
    }
}

/// Object-space vertex positions of `accessor`
fn positions(doc: &Document, accessor: usize) -> Result<Vec<Vec3>> {
    const VEC3_SIZE: usize = 12;
    let acc = &doc.accessors[accessor];

    let readable = acc.component_type == component_type::FLOAT
        && acc.type_ == "VEC3"
        && acc.sparse.is_none();
    if let (true, Some(view)) = (readable, acc.buffer_view) {
        let bytes = doc.view_bytes(view)?;
        let stride = doc.buffer_views[view].byte_stride.unwrap_or(VEC3_SIZE);
        let start = acc.byte_offset.unwrap_or(0);
        if acc.count == 0 {
            return Ok(Vec::new());
        }
        let end = stride
            .checked_mul(acc.count - 1)
            .and_then(|span| span.checked_add(start))
            .and_then(|last| last.checked_add(VEC3_SIZE));
        match end {
            Some(end) if end <= bytes.len() => {}
            end => {
                return Err(Error::RangeOutOfBounds {
                    what: format!("accessor {accessor}"),
                    start,
                    end: end.unwrap_or(usize::MAX),
                    len: bytes.len(),
                });
            }
        }

        let read = |at: usize| {
            f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        return Ok((0..acc.count)
            .map(|i| {
                let at = start + i * stride;
                Vec3::new(read(at), read(at + 4), read(at + 8))
            })
            .collect());
    }

    match (acc.min.as_deref(), acc.max.as_deref()) {
        (Some([x0, y0, z0, ..]), Some([x1, y1, z1, ..])) => {
            let (lo, hi) = (
                Vec3::new(*x0 as f32, *y0 as f32, *z0 as f32),
                Vec3::new(*x1 as f32, *y1 as f32, *z1 as f32),
            );
            Ok((0..8)
                .map(|corner| {
                    Vec3::new(
                        if corner & 1 == 0 { lo.x } else { hi.x },
                        if corner & 2 == 0 { lo.y } else { hi.y },
                        if corner & 4 == 0 { lo.z } else { hi.z },
                    )
                })
                .collect())
        }
        _ => {
            tracing::debug!("Accessor {} has no readable positions or bounds", accessor);
            Ok(Vec::new())
        }
    }
}
