//! Relative forward kinematics.

use crate::model::{KinematicModel, LinkIndex};
use crate::pose::Pose;
use crate::scalar::Real;

/// Pose of `target` expressed in the frame of `source` at configuration `q`.
///
/// Pure and generic over the scalar, so the same call yields plain poses for
/// `f64` and differentiated poses for dual numbers. `q.len()` must equal
/// `model.dof()`.
pub fn forward_kinematics<T: Real>(
    model: &KinematicModel<T>,
    q: &[T],
    source: LinkIndex,
    target: LinkIndex,
) -> Pose<T> {
    debug_assert_eq!(q.len(), model.dof(), "q.len() must equal model DOF");
    let source_pose = model.link_pose(q, source);
    let target_pose = model.link_pose(q, target);
    source_pose.inverse().compose(&target_pose)
}
