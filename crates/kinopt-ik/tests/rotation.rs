//! Roll-pitch-yaw extraction round trips over random rotations.

use approx::assert_relative_eq;
use kinopt_ik::{rotation::GIMBAL_LOCK_THRESHOLD, rotation_from_rpy, rpy_from_rotation, trace_error};
use kinopt_test_utils::seeded_rng;
use nalgebra::{Rotation3, Unit, Vector3};
use rand::Rng;

fn random_rotation(rng: &mut impl Rng) -> Rotation3<f64> {
    let axis = Unit::new_normalize(Vector3::new(
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    ));
    Rotation3::from_axis_angle(&axis, rng.gen_range(-3.1..3.1))
}

#[test]
fn random_rotations_round_trip() {
    let mut rng = seeded_rng(11);
    for _ in 0..200 {
        let r = random_rotation(&mut rng).into_inner();
        let rpy = rpy_from_rotation(&r);
        if (r[(0, 0)].hypot(r[(1, 0)])) < GIMBAL_LOCK_THRESHOLD {
            continue;
        }
        let back = rotation_from_rpy(rpy[0], rpy[1], rpy[2]);
        assert_relative_eq!(back, r, epsilon = 1e-8);
    }
}

#[test]
fn near_gimbal_lock_still_round_trips() {
    for pitch in [1.5707, -1.5707, 1.57079632] {
        let r = rotation_from_rpy(0.4, pitch, -0.9);
        let rpy = rpy_from_rotation(&r);
        let back = rotation_from_rpy(rpy[0], rpy[1], rpy[2]);
        assert_relative_eq!(back, r, epsilon = 1e-8);
    }
}

#[test]
fn trace_error_is_symmetric_and_bounded() {
    let mut rng = seeded_rng(5);
    for _ in 0..100 {
        let a = random_rotation(&mut rng).into_inner();
        let b = random_rotation(&mut rng).into_inner();
        let ab = trace_error(&a, &b);
        assert!((-1e-12..=4.0 + 1e-12).contains(&ab));
        assert_relative_eq!(ab, trace_error(&b, &a), epsilon = 1e-12);
    }
}
