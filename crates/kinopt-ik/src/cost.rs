//! Pose-error cost with an exact gradient.
//!
//! ```text
//! cost(q) = w_p · |t_cur − t_des|² + w_r · |q|² + w_o · o(q)²
//! o(q)    = trace(I − R_des · R_cur(q)ᵀ)
//! ```
//!
//! The value is computed on the `f64` model. The gradient evaluates the same
//! generic function once on a dual-number copy of the model, seeded with one
//! derivative lane per joint, which yields the value and the full gradient
//! in a single pass.

use nalgebra::{DMatrix, DVector, Vector3};
use serde::{Deserialize, Serialize};

use kinopt_nlp::{CostTerm, Variables};

use crate::config::PoseTolerance;
use crate::kinematics::forward_kinematics;
use crate::model::{KinematicModel, LinkIndex};
use crate::pose::Pose;
use crate::rotation::{rotation_angle, rpy_from_rotation, trace_error};
use crate::scalar::{Gradient, Real};

/// Name the pose cost is registered under.
pub const IK_COST: &str = "ik_cost";

const fn default_position_weight() -> f64 {
    1.0
}
const fn default_regularization_weight() -> f64 {
    1e-6
}
const fn default_orientation_weight() -> f64 {
    50.0
}

/// Weights of the three cost terms. Tunables, not physical constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostWeights {
    /// Weight on squared translation error (m⁻²).
    #[serde(default = "default_position_weight")]
    pub position: f64,
    /// Weight on `|q|²`. Kept small so it only breaks ties.
    #[serde(default = "default_regularization_weight")]
    pub regularization: f64,
    /// Weight on the squared orientation error.
    #[serde(default = "default_orientation_weight")]
    pub orientation: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            position: default_position_weight(),
            regularization: default_regularization_weight(),
            orientation: default_orientation_weight(),
        }
    }
}

/// Pose-error cost for any scalar type.
pub fn pose_cost<T: Real>(
    model: &KinematicModel<T>,
    q: &[T],
    source: LinkIndex,
    target: LinkIndex,
    desired: &Pose<T>,
    weights: &CostWeights,
) -> T {
    let current = forward_kinematics(model, q, source, target);
    let position = &current.translation - &desired.translation;
    let orientation = trace_error(&current.rotation, &desired.rotation);
    let regularization = q
        .iter()
        .fold(T::from(0.0), |acc, v| acc + v.clone() * v.clone());

    position.dot(&position) * weights.position
        + regularization * weights.regularization
        + orientation.clone() * orientation * weights.orientation
}

/// How far a configuration leaves the target link from the desired pose.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseResidual {
    /// Translation error norm (m).
    pub position_error: f64,
    /// Angle of the relative rotation (rad).
    pub orientation_angle: f64,
    /// Roll-pitch-yaw of `R_des · R_curᵀ`.
    pub orientation_rpy: Vector3<f64>,
}

impl PoseResidual {
    pub fn within(&self, tolerance: &PoseTolerance) -> bool {
        self.position_error <= tolerance.position && self.orientation_angle <= tolerance.orientation
    }
}

/// Pose error of `target` relative to `desired` at `q`.
pub fn pose_residual(
    model: &KinematicModel<f64>,
    q: &[f64],
    source: LinkIndex,
    target: LinkIndex,
    desired: &Pose<f64>,
) -> PoseResidual {
    let current = forward_kinematics(model, q, source, target);
    let relative = desired.rotation * current.rotation.transpose();
    PoseResidual {
        position_error: (current.translation - desired.translation).norm(),
        orientation_angle: rotation_angle(&current.rotation, &desired.rotation),
        orientation_rpy: rpy_from_rotation(&relative),
    }
}

/// The pose-error cost as a solver cost term.
///
/// Holds its own dual-typed copy of the model, built once at construction.
#[derive(Debug, Clone)]
pub struct PoseCost {
    name: String,
    var_set: String,
    model: KinematicModel<f64>,
    dual_model: KinematicModel<Gradient>,
    source: LinkIndex,
    target: LinkIndex,
    desired: Pose<f64>,
    dual_desired: Pose<Gradient>,
    weights: CostWeights,
}

impl PoseCost {
    /// `var_set` names the configuration variable set this cost reads.
    pub fn new(
        name: impl Into<String>,
        var_set: impl Into<String>,
        model: &KinematicModel<f64>,
        source: LinkIndex,
        target: LinkIndex,
        desired: Pose<f64>,
        weights: CostWeights,
    ) -> Self {
        Self {
            name: name.into(),
            var_set: var_set.into(),
            model: model.clone(),
            dual_model: model.cast(),
            source,
            target,
            dual_desired: desired.cast(),
            desired,
            weights,
        }
    }

    /// Cost at `q`.
    pub fn evaluate(&self, q: &[f64]) -> f64 {
        pose_cost(
            &self.model,
            q,
            self.source,
            self.target,
            &self.desired,
            &self.weights,
        )
    }

    /// Cost and gradient at `q` from one dual-number evaluation.
    pub fn gradient(&self, q: &[f64]) -> (f64, DVector<f64>) {
        let x = DVector::from_column_slice(q);
        num_dual::gradient(
            |q: DVector<Gradient>| {
                pose_cost(
                    &self.dual_model,
                    q.as_slice(),
                    self.source,
                    self.target,
                    &self.dual_desired,
                    &self.weights,
                )
            },
            x,
        )
    }

    /// Pose error left at `q`.
    pub fn residual(&self, q: &[f64]) -> PoseResidual {
        pose_residual(&self.model, q, self.source, self.target, &self.desired)
    }
}

impl CostTerm for PoseCost {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<String> {
        vec![self.var_set.clone()]
    }

    fn cost(&self, variables: &Variables) -> f64 {
        variables
            .values_of(&self.var_set)
            .map_or(f64::NAN, |q| self.evaluate(q.as_slice()))
    }

    fn fill_jacobian_block(&self, var_set: &str, variables: &Variables, jacobian: &mut DMatrix<f64>) {
        if var_set != self.var_set {
            return;
        }
        let Some(q) = variables.values_of(var_set) else {
            return;
        };
        let (_, gradient) = self.gradient(q.as_slice());
        *jacobian = DMatrix::from_row_slice(1, gradient.len(), gradient.as_slice());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use kinopt_test_utils::finite_diff::central_difference;
    use kinopt_test_utils::fixtures::{PLANAR_ARM, SIX_DOF_ARM};

    use super::*;

    const Q_STAR: [f64; 6] = [0.5, 0.3, -0.4, 0.2, 0.1, -0.3];

    fn six_dof_cost(desired_q: &[f64]) -> PoseCost {
        let model = KinematicModel::from_urdf_str(SIX_DOF_ARM).unwrap();
        let base = model.link_index("base").unwrap();
        let tool = model.link_index("tool").unwrap();
        let desired = forward_kinematics(&model, desired_q, base, tool);
        PoseCost::new(IK_COST, "q", &model, base, tool, desired, CostWeights::default())
    }

    #[test]
    fn cost_at_target_is_only_regularization() {
        let cost = six_dof_cost(&Q_STAR);
        let q_norm2: f64 = Q_STAR.iter().map(|v| v * v).sum();
        assert_relative_eq!(cost.evaluate(&Q_STAR), 1e-6 * q_norm2, epsilon = 1e-15);
    }

    #[test]
    fn cost_terms_are_non_negative() {
        let cost = six_dof_cost(&Q_STAR);
        for q in [[0.0; 6], [3.0, -3.0, 1.0, -1.0, 2.0, -2.0], [-0.5; 6]] {
            assert!(cost.evaluate(&q) >= 0.0);
        }
    }

    #[test]
    fn position_term_weighting() {
        let model = KinematicModel::from_urdf_str(PLANAR_ARM).unwrap();
        let base = model.link_index("base").unwrap();
        let tool = model.link_index("tool").unwrap();
        let mut desired = forward_kinematics(&model, &[0.0, 0.0], base, tool);
        desired.translation.x += 0.1;
        let weights = CostWeights {
            position: 2.0,
            regularization: 0.0,
            orientation: 50.0,
        };
        let cost = PoseCost::new(IK_COST, "q", &model, base, tool, desired, weights);
        assert_relative_eq!(cost.evaluate(&[0.0, 0.0]), 2.0 * 0.01, epsilon = 1e-14);
    }

    #[test]
    fn gradient_value_matches_plain_evaluation() {
        let cost = six_dof_cost(&Q_STAR);
        let q = [0.1, -0.2, 0.3, 0.0, 0.5, 1.0];
        let (value, _) = cost.gradient(&q);
        assert_relative_eq!(value, cost.evaluate(&q), epsilon = 1e-14);
    }

    #[test]
    fn gradient_matches_central_difference() {
        let cost = six_dof_cost(&Q_STAR);
        let q = [0.1, -0.2, 0.3, 0.0, 0.5, 1.0];
        let (_, exact) = cost.gradient(&q);
        let numeric = central_difference(|x| cost.evaluate(x), &q);
        for (a, n) in exact.iter().zip(numeric.iter()) {
            assert_relative_eq!(*a, *n, epsilon = 1e-6, max_relative = 1e-6);
        }
    }

    #[test]
    fn gradient_vanishes_at_target_up_to_regularization() {
        let cost = six_dof_cost(&Q_STAR);
        let (_, g) = cost.gradient(&Q_STAR);
        for (gi, qi) in g.iter().zip(Q_STAR.iter()) {
            assert_relative_eq!(*gi, 2e-6 * qi, epsilon = 1e-12);
        }
    }

    #[test]
    fn jacobian_block_is_resized_not_accumulated() {
        let cost = six_dof_cost(&Q_STAR);
        let mut problem = kinopt_nlp::Problem::new();
        let model = KinematicModel::from_urdf_str(SIX_DOF_ARM).unwrap();
        problem
            .add_variable_set(
                crate::variables::ConfigurationVariables::new(
                    "q",
                    &model,
                    &[0.2; 6],
                    &Default::default(),
                )
                .unwrap(),
            )
            .unwrap();

        let mut block = DMatrix::from_element(3, 3, 7.0);
        cost.fill_jacobian_block("q", problem.variables(), &mut block);
        assert_eq!(block.shape(), (1, 6));
        let first = block.clone();
        cost.fill_jacobian_block("q", problem.variables(), &mut block);
        assert_eq!(block, first);
    }

    #[test]
    fn foreign_variable_set_is_a_no_op() {
        let cost = six_dof_cost(&Q_STAR);
        let problem = kinopt_nlp::Problem::new();
        let mut block = DMatrix::from_element(2, 2, 7.0);
        cost.fill_jacobian_block("other", problem.variables(), &mut block);
        assert_eq!(block, DMatrix::from_element(2, 2, 7.0));
    }

    #[test]
    fn residual_reports_pose_error() {
        let cost = six_dof_cost(&Q_STAR);
        let residual = cost.residual(&Q_STAR);
        assert!(residual.position_error < 1e-12);
        assert!(residual.orientation_angle < 1e-6);
        assert!(residual.within(&PoseTolerance::default()));

        let residual = cost.residual(&[0.0; 6]);
        assert!(residual.position_error > 0.05);
        assert!(!residual.within(&PoseTolerance::default()));
    }
}
