//! Rigid transforms that place a copy of a model in space.

use glam::{Mat4, Vec3};

const IDENTITY_EPS: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryOperator {
    pub name: String,
    pub matrix: Mat4,
    pub inverse: Mat4,
    pub is_identity: bool,
}

impl Default for SymmetryOperator {
    fn default() -> Self {
        Self::identity()
    }
}

impl SymmetryOperator {
    pub fn identity() -> Self {
        Self {
            name: "1_555".to_string(),
            matrix: Mat4::IDENTITY,
            inverse: Mat4::IDENTITY,
            is_identity: true,
        }
    }

    pub fn new(name: impl Into<String>, matrix: Mat4) -> Self {
        Self {
            name: name.into(),
            matrix,
            inverse: matrix.inverse(),
            is_identity: is_identity(&matrix),
        }
    }

    /// Pure translation, e.g. a crystal lattice shift.
    pub fn translation(name: impl Into<String>, offset: Vec3) -> Self {
        Self::new(name, Mat4::from_translation(offset))
    }

    pub fn apply(&self, p: Vec3) -> Vec3 {
        if self.is_identity {
            p
        } else {
            self.matrix.transform_point3(p)
        }
    }

    pub fn apply_inverse(&self, p: Vec3) -> Vec3 {
        if self.is_identity {
            p
        } else {
            self.inverse.transform_point3(p)
        }
    }
}

pub fn is_identity(m: &Mat4) -> bool {
    m.abs_diff_eq(Mat4::IDENTITY, IDENTITY_EPS)
}

/// Maps model coordinates of the copy placed by `a` into the model frame of
/// the copy placed by `b`.
pub fn image_transform(a: &SymmetryOperator, b: &SymmetryOperator) -> Mat4 {
    b.inverse * a.matrix
}
