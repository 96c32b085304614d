//! Alignment normalization
//!
//! Moves an asset so a chosen point of its world bounding box lands on the
//! origin. Each axis picks the minimum face, the center or the maximum face
//! of the box. The translation is baked into every scene root.

use std::fmt;
use std::str::FromStr;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::bounds::{Aabb, BoundsProvider};
use crate::document::Document;
use crate::error::Result;
use crate::transform::{Transform, combine};

/// Reference point on one axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum AxisAlign {
    /// Minimum face (`-1`)
    Min,
    /// Center (`0`)
    #[default]
    Center,
    /// Maximum face (`+1`)
    Max,
}

impl TryFrom<i32> for AxisAlign {
    type Error = String;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        match value {
            -1 => Ok(AxisAlign::Min),
            0 => Ok(AxisAlign::Center),
            1 => Ok(AxisAlign::Max),
            other => Err(format!("alignment selector must be -1, 0 or 1, got {other}")),
        }
    }
}

impl From<AxisAlign> for i32 {
    fn from(axis: AxisAlign) -> Self {
        match axis {
            AxisAlign::Min => -1,
            AxisAlign::Center => 0,
            AxisAlign::Max => 1,
        }
    }
}

impl AxisAlign {
    fn pick(self, min: f32, max: f32) -> f32 {
        match self {
            AxisAlign::Min => min,
            AxisAlign::Center => (min + max) * 0.5,
            AxisAlign::Max => max,
        }
    }
}

/// Per-axis alignment selectors (x, y, z)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alignment(pub [AxisAlign; 3]);

impl Alignment {
    /// Selectors as -1/0/1
    pub fn selectors(&self) -> [i32; 3] {
        self.0.map(i32::from)
    }

    /// Point of `bounds` that ends up at the origin
    pub fn reference_point(&self, bounds: &Aabb) -> Vec3 {
        let [x, y, z] = self.0;
        Vec3::new(
            x.pick(bounds.min.x, bounds.max.x),
            y.pick(bounds.min.y, bounds.max.y),
            z.pick(bounds.min.z, bounds.max.z),
        )
    }
}

impl TryFrom<[i32; 3]> for Alignment {
    type Error = String;

    fn try_from(value: [i32; 3]) -> std::result::Result<Self, Self::Error> {
        let [x, y, z] = value;
        Ok(Alignment([x.try_into()?, y.try_into()?, z.try_into()?]))
    }
}

/// Parses `"x,y,z"`, e.g. `0,-1,0`
impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<i32>()
                    .map_err(|e| format!("invalid selector '{}': {e}", part.trim()))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let values: [i32; 3] = values
            .try_into()
            .map_err(|v: Vec<i32>| format!("expected 3 selectors, got {}", v.len()))?;
        values.try_into()
    }
}

/// Size and alignment written next to an aligned asset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeRecord {
    pub size: Vec3,
    pub alignment: Alignment,
}

impl fmt::Display for SizeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let round = |v: f32| (v * 10_000.0).round() / 10_000.0;
        let [ax, ay, az] = self.alignment.selectors();
        writeln!(
            f,
            "Size: [{}, {}, {}]",
            round(self.size.x),
            round(self.size.y),
            round(self.size.z)
        )?;
        writeln!(f, "Align to: [{ax}, {ay}, {az}]")
    }
}

/// Result of an alignment pass
#[derive(Debug, Clone)]
pub enum AlignOutcome {
    Aligned {
        document: Document,
        /// Offset added to every scene root
        translation: Vec3,
        record: SizeRecord,
    },
    /// No scene root or no mesh; the document needs no change
    NoGeometry,
}

/// Align `doc` using precomputed world `bounds`
pub fn align_document(
    doc: &Document,
    alignment: Alignment,
    bounds: &Aabb,
) -> Result<AlignOutcome> {
    let roots = doc.root_nodes()?;
    if roots.is_empty() || !doc.has_mesh_nodes() {
        return Ok(AlignOutcome::NoGeometry);
    }

    let translation = -alignment.reference_point(bounds);
    let mut document = doc.clone();
    for root in roots {
        let node = &mut document.nodes[root];
        node.transform = shifted(&node.transform, translation);
    }

    Ok(AlignOutcome::Aligned {
        document,
        translation,
        record: SizeRecord {
            size: bounds.size(),
            alignment,
        },
    })
}

/// Align `doc`, asking `provider` for its world bounds
pub fn align_with(
    doc: &Document,
    alignment: Alignment,
    provider: &dyn BoundsProvider,
) -> Result<AlignOutcome> {
    if doc.root_nodes()?.is_empty() || !doc.has_mesh_nodes() {
        return Ok(AlignOutcome::NoGeometry);
    }
    match provider.world_bounds(doc)? {
        Some(bounds) => align_document(doc, alignment, &bounds),
        None => Ok(AlignOutcome::NoGeometry),
    }
}

/// `translation ∘ transform`, keeping TRS nodes in TRS form
fn shifted(transform: &Transform, translation: Vec3) -> Transform {
    match transform {
        Transform::Trs(trs) => {
            let mut trs = *trs;
            let current = Vec3::from(trs.translation.unwrap_or([0.0; 3]));
            trs.translation = Some((current + translation).to_array());
            Transform::Trs(trs)
        }
        Transform::Matrix(_) => Transform::from_matrix(combine(
            Mat4::from_translation(translation),
            transform.to_matrix(),
        )),
    }
}
