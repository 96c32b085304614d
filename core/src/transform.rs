//! Node transforms and matrix composition
//!
//! Matrices are stored as 16 floats in glTF column-major order: elements
//! 12, 13 and 14 hold the translation.

use glam::{Mat4, Quat, Vec3};

/// Translation, rotation (quaternion `[x, y, z, w]`) and scale
///
/// Absent components fall back to the identity when composed, and stay
/// absent when the node is written back out.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Trs {
    pub translation: Option<[f32; 3]>,
    pub rotation: Option<[f32; 4]>,
    pub scale: Option<[f32; 3]>,
}

/// Local transform of a node: TRS or a single matrix, never both
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Trs(Trs),
    Matrix([f32; 16]),
}

impl Default for Transform {
    fn default() -> Self {
        Transform::Trs(Trs::default())
    }
}

impl Transform {
    /// Matrix-only transform from a composed matrix
    pub fn from_matrix(matrix: Mat4) -> Self {
        Transform::Matrix(matrix.to_cols_array())
    }

    /// Translation-only transform
    pub fn from_translation(translation: [f32; 3]) -> Self {
        Transform::Trs(Trs {
            translation: Some(translation),
            ..Trs::default()
        })
    }

    /// Affine matrix applying translation ∘ rotation ∘ scale
    pub fn to_matrix(&self) -> Mat4 {
        match self {
            Transform::Matrix(m) => Mat4::from_cols_array(m),
            Transform::Trs(trs) => {
                let translation = Vec3::from(trs.translation.unwrap_or([0.0; 3]));
                let scale = Vec3::from(trs.scale.unwrap_or([1.0; 3]));
                let rotation = normalized_rotation(trs.rotation);
                Mat4::from_scale_rotation_translation(scale, rotation, translation)
            }
        }
    }

    /// Whether the transform has no effect
    pub fn is_identity(&self) -> bool {
        self.to_matrix().abs_diff_eq(Mat4::IDENTITY, 1e-6)
    }
}

/// Quaternion from stored components, normalized
///
/// Unnormalized quaternions would scale the rotation matrix; a zero-length
/// quaternion carries no rotation and maps to the identity.
fn normalized_rotation(rotation: Option<[f32; 4]>) -> Quat {
    let Some([x, y, z, w]) = rotation else {
        return Quat::IDENTITY;
    };
    let q = Quat::from_xyzw(x, y, z, w);
    if q.length_squared() <= f32::EPSILON {
        Quat::IDENTITY
    } else {
        q.normalize()
    }
}

/// Compose a parent matrix with a child matrix (`parent · child`)
pub fn combine(parent: Mat4, child: Mat4) -> Mat4 {
    parent * child
}

/// Translation column of an affine matrix
pub fn translation(matrix: &Mat4) -> Vec3 {
    matrix.w_axis.truncate()
}
