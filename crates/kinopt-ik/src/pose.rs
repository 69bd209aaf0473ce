//! Rigid transforms over a generic scalar.

use nalgebra::{Isometry3, Matrix3, Rotation3, Translation3, UnitQuaternion, Vector3};

use crate::rotation::rotation_from_rpy;
use crate::scalar::Real;

/// Rotation plus translation, mapping child-frame points into the parent
/// frame: `p_parent = rotation · p_child + translation`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose<T: Real> {
    pub rotation: Matrix3<T>,
    pub translation: Vector3<T>,
}

impl<T: Real> Pose<T> {
    pub fn new(rotation: Matrix3<T>, translation: Vector3<T>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Constant pose from a URDF-style `xyz` offset and `rpy` angles.
    pub fn from_xyz_rpy(xyz: [f64; 3], rpy: [f64; 3]) -> Self {
        Self {
            rotation: rotation_from_rpy(T::from(rpy[0]), T::from(rpy[1]), T::from(rpy[2])),
            translation: Vector3::new(T::from(xyz[0]), T::from(xyz[1]), T::from(xyz[2])),
        }
    }

    /// `self ∘ other`: apply `other`, then `self`.
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            rotation: &self.rotation * &other.rotation,
            translation: &self.rotation * &other.translation + &self.translation,
        }
    }

    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.transpose();
        let translation = -(&rotation * &self.translation);
        Self {
            rotation,
            translation,
        }
    }

    /// Transform a point from the child frame into the parent frame.
    pub fn transform_point(&self, point: &Vector3<T>) -> Vector3<T> {
        &self.rotation * point + &self.translation
    }

    /// Convert every entry to another scalar type, dropping derivatives.
    pub fn cast<U: Real>(&self) -> Pose<U> {
        Pose {
            rotation: self.rotation.map(|v| U::from(v.re())),
            translation: self.translation.map(|v| U::from(v.re())),
        }
    }
}

impl Pose<f64> {
    pub fn to_isometry(&self) -> Isometry3<f64> {
        let rotation = Rotation3::from_matrix_unchecked(self.rotation);
        Isometry3::from_parts(
            Translation3::from(self.translation),
            UnitQuaternion::from_rotation_matrix(&rotation),
        )
    }
}

impl From<Isometry3<f64>> for Pose<f64> {
    fn from(iso: Isometry3<f64>) -> Self {
        Self {
            rotation: iso.rotation.to_rotation_matrix().into_inner(),
            translation: iso.translation.vector,
        }
    }
}

impl From<Pose<f64>> for Isometry3<f64> {
    fn from(pose: Pose<f64>) -> Self {
        pose.to_isometry()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
