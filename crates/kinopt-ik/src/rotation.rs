//! Orientation error and roll-pitch-yaw conversion.
//!
//! Euler convention: `R = Rz(yaw) · Ry(pitch) · Rx(roll)`, the fixed-axis
//! XYZ (equivalently intrinsic ZYX) convention URDF uses for `rpy`.

use std::f64::consts::FRAC_PI_2;

use nalgebra::{Matrix3, Vector3};

use crate::scalar::{Real, atan2};

/// Below this `cos(pitch)` the yaw and roll axes are treated as aligned.
pub const GIMBAL_LOCK_THRESHOLD: f64 = 1e-9;

/// `trace(I − R_desired · R_currentᵀ)`.
///
/// For proper rotations this is `2(1 − cos θ)` where θ is the angle of the
/// relative rotation: zero when the rotations coincide, increasing with θ,
/// and saturating at 4 when θ = π. The derivative with respect to θ is
/// `2 sin θ`, so the gradient vanishes at antipodal orientations.
pub fn trace_error<T: Real>(current: &Matrix3<T>, desired: &Matrix3<T>) -> T {
    let relative = desired * current.transpose();
    T::from(3.0) - relative.trace()
}

/// Geodesic angle between two rotations, in `[0, π]`.
pub fn rotation_angle(current: &Matrix3<f64>, desired: &Matrix3<f64>) -> f64 {
    let relative = desired * current.transpose();
    ((relative.trace() - 1.0) * 0.5).clamp(-1.0, 1.0).acos()
}

/// Rotation matrix for `(roll, pitch, yaw)`.
pub fn rotation_from_rpy<T: Real>(roll: T, pitch: T, yaw: T) -> Matrix3<T> {
    let (sr, cr) = roll.sin_cos();
    let (sp, cp) = pitch.sin_cos();
    let (sy, cy) = yaw.sin_cos();

    Matrix3::new(
        cy.clone() * cp.clone(),
        cy.clone() * sp.clone() * sr.clone() - sy.clone() * cr.clone(),
        cy.clone() * sp.clone() * cr.clone() + sy.clone() * sr.clone(),
        sy.clone() * cp.clone(),
        sy.clone() * sp.clone() * sr.clone() + cy.clone() * cr.clone(),
        sy * sp.clone() * cr.clone() - cy * sr.clone(),
        -sp,
        cp.clone() * sr,
        cp * cr,
    )
}

/// `(roll, pitch, yaw)` of a rotation matrix.
///
/// Pitch lies in `[−π/2, π/2]`, roll and yaw in `(−π, π]`. At gimbal lock
/// (`|pitch| = π/2`) only `roll − yaw` (or `roll + yaw`) is determined; yaw is
/// then fixed to zero, pitch to exactly `±π/2`, and roll absorbs the rest.
/// Derivatives stay finite on both branches.
pub fn rpy_from_rotation<T: Real>(rotation: &Matrix3<T>) -> Vector3<T> {
    let r = |i: usize, j: usize| rotation[(i, j)].clone();

    let cos_pitch = r(0, 0).re().hypot(r(1, 0).re());
    if cos_pitch < GIMBAL_LOCK_THRESHOLD {
        let pitch = if r(2, 0).re() < 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 };
        let roll = atan2(-r(1, 2), r(1, 1));
        return Vector3::new(roll, T::from(pitch), T::from(0.0));
    }

    let cos_pitch = (r(0, 0) * r(0, 0) + r(1, 0) * r(1, 0)).sqrt();
    Vector3::new(
        atan2(r(2, 1), r(2, 2)),
        atan2(-r(2, 0), cos_pitch),
        atan2(r(1, 0), r(0, 0)),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Unit};
    use num_dual::Dual64;

    use super::*;

    fn axis_angle(axis: [f64; 3], angle: f64) -> Matrix3<f64> {
        let axis = Unit::new_normalize(Vector3::new(axis[0], axis[1], axis[2]));
        Rotation3::from_axis_angle(&axis, angle).into_inner()
    }

    #[test]
    fn trace_error_is_zero_for_identical_rotations() {
        let r = rotation_from_rpy(0.3, -0.7, 1.9);
        assert_relative_eq!(trace_error(&r, &r), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn trace_error_follows_relative_angle() {
        let desired = rotation_from_rpy(0.1, 0.2, 0.3);
        for &theta in &[0.01, 0.5, 1.0, 2.0, 3.0] {
            let current = axis_angle([1.0, 2.0, -0.5], theta) * desired;
            let expected = 2.0 * (1.0 - theta.cos());
            assert_relative_eq!(trace_error(&current, &desired), expected, epsilon = 1e-12);
            assert_relative_eq!(rotation_angle(&current, &desired), theta, epsilon = 1e-7);
        }
    }

    #[test]
    fn trace_error_saturates_at_antipodal_rotation() {
        let desired = Matrix3::identity();
        let current = axis_angle([0.0, 0.0, 1.0], std::f64::consts::PI);
        assert_relative_eq!(trace_error(&current, &desired), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn rpy_matches_nalgebra_convention() {
        let (roll, pitch, yaw) = (0.4, -0.3, 2.1);
        let ours = rotation_from_rpy(roll, pitch, yaw);
        let theirs = Rotation3::from_euler_angles(roll, pitch, yaw).into_inner();
        assert_relative_eq!(ours, theirs, epsilon = 1e-12);
    }

    #[test]
    fn rpy_round_trip_away_from_gimbal_lock() {
        for &(roll, pitch, yaw) in &[
            (0.0, 0.0, 0.0),
            (0.4, -0.3, 2.1),
            (-3.0, 1.2, -0.5),
            (2.5, -1.4, 3.0),
            (0.1, 1.5, -2.9),
        ] {
            let r = rotation_from_rpy(roll, pitch, yaw);
            let rpy = rpy_from_rotation(&r);
            assert_relative_eq!(rpy, Vector3::new(roll, pitch, yaw), epsilon = 1e-10);
            let back = rotation_from_rpy(rpy[0], rpy[1], rpy[2]);
            assert_relative_eq!(back, r, epsilon = 1e-12);
        }
    }

    #[test]
    fn gimbal_lock_reconstructs_rotation() {
        for &(roll, pitch, yaw) in &[(0.3, FRAC_PI_2, 0.8), (-1.1, -FRAC_PI_2, 0.4)] {
            let r = rotation_from_rpy(roll, pitch, yaw);
            let rpy = rpy_from_rotation(&r);
            assert_relative_eq!(rpy[1], pitch, epsilon = 1e-12);
            assert_eq!(rpy[2], 0.0);
            let back = rotation_from_rpy(rpy[0], rpy[1], rpy[2]);
            assert_relative_eq!(back, r, epsilon = 1e-9);
        }
    }

    #[test]
    fn gimbal_lock_derivatives_are_finite() {
        let t = Dual64::from(0.3).derivative();
        let r = rotation_from_rpy(t, Dual64::from(FRAC_PI_2), Dual64::from(0.0));
        let rpy = rpy_from_rotation(&r);
        for angle in rpy.iter() {
            assert!(angle.re.is_finite());
            assert!(angle.eps.is_finite());
        }
        assert_relative_eq!(rpy[0].eps, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn dual_rotation_derivative_matches_finite_difference() {
        let yaw = 0.7;
        let r = rotation_from_rpy(
            Dual64::from(0.2),
            Dual64::from(-0.4),
            Dual64::from(yaw).derivative(),
        );
        let h = 1e-6;
        let numeric = (rotation_from_rpy(0.2, -0.4, yaw + h) - rotation_from_rpy(0.2, -0.4, yaw - h))
            / (2.0 * h);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(r[(i, j)].eps, numeric[(i, j)], epsilon = 1e-8);
            }
        }
    }
}
