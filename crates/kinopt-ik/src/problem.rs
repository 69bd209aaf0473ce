//! Problem assembly and solve orchestration.

use std::fmt;

use nalgebra::DVector;
use tracing::{debug, info, warn};

use kinopt_nlp::{NlpError, NlpSolver, Problem, SolveReport, SqpSolver};

use crate::config::IkConfig;
use crate::constraint::{JOINT_COUPLING, JointCoupling};
use crate::cost::{IK_COST, PoseCost, PoseResidual, pose_residual};
use crate::error::IkError;
use crate::model::{KinematicModel, LinkIndex};
use crate::pose::Pose;
use crate::variables::{CONFIGURATION_VECTOR, ConfigurationVariables};

/// Outcome of an IK solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IkStatus {
    /// The solver converged and the pose is within tolerance.
    Converged,
    /// The solver converged to a stationary point that misses the pose,
    /// typically because the target is out of reach.
    PoseNotReached,
    /// Iteration limit, stalled line search or infeasible subproblem.
    NotConverged,
    /// Non-finite values or an unsolvable subproblem.
    Degenerate,
}

impl fmt::Display for IkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => write!(f, "converged"),
            Self::PoseNotReached => write!(f, "pose not reached"),
            Self::NotConverged => write!(f, "not converged"),
            Self::Degenerate => write!(f, "degenerate"),
        }
    }
}

/// Best configuration found, with the diagnostics needed to trust it.
#[derive(Debug, Clone, PartialEq)]
pub struct IkSolution {
    pub configuration: DVector<f64>,
    pub status: IkStatus,
    pub report: SolveReport,
    pub residual: PoseResidual,
}

impl IkSolution {
    pub fn is_converged(&self) -> bool {
        self.status == IkStatus::Converged
    }
}

/// One IK solve: the configuration variables, the pose cost and any joint
/// couplings, registered in a fresh [`Problem`].
///
/// Consumed by [`solve`](Self::solve); nothing is shared between solves.
#[derive(Debug)]
pub struct IkProblem {
    problem: Problem,
    model: KinematicModel<f64>,
    source: LinkIndex,
    target: LinkIndex,
    desired: Pose<f64>,
    config: IkConfig,
}

impl IkProblem {
    /// Assemble the problem for driving `target` to `desired`, expressed in
    /// the frame of `source`.
    ///
    /// # Errors
    ///
    /// Fails before any solver work when the config is invalid, a link name
    /// is unknown, `initial` does not match the model's DOF, or a coupling
    /// names an unknown joint.
    pub fn new(
        model: &KinematicModel<f64>,
        source: &str,
        target: &str,
        desired: Pose<f64>,
        initial: &[f64],
        config: &IkConfig,
    ) -> Result<Self, IkError> {
        config.validate()?;
        let variables =
            ConfigurationVariables::new(CONFIGURATION_VECTOR, model, initial, &config.bounds)?;
        let source = model.link_index(source)?;
        let target = model.link_index(target)?;
        let cost = PoseCost::new(
            IK_COST,
            CONFIGURATION_VECTOR,
            model,
            source,
            target,
            desired.clone(),
            config.weights,
        );

        let mut problem = Problem::new();
        problem.add_variable_set(variables)?;
        problem.add_cost_term(cost)?;
        if !config.couplings.is_empty() {
            problem.add_constraint_set(JointCoupling::new(
                JOINT_COUPLING,
                CONFIGURATION_VECTOR,
                model,
                &config.couplings,
            )?)?;
        }

        debug!(
            model = model.name(),
            dof = model.dof(),
            constraints = problem.n_constraints(),
            "assembled IK problem"
        );
        Ok(Self {
            problem,
            model: model.clone(),
            source,
            target,
            desired,
            config: config.clone(),
        })
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// Solve with [`SqpSolver`] configured from [`IkConfig::solver`].
    pub fn solve(self) -> Result<IkSolution, IkError> {
        let solver = SqpSolver::new(self.config.solver.clone());
        self.solve_with(&solver)
    }

    /// Solve with any [`NlpSolver`].
    pub fn solve_with(mut self, solver: &impl NlpSolver) -> Result<IkSolution, IkError> {
        let report = solver.solve(&mut self.problem)?;
        let configuration = self
            .problem
            .variables()
            .values_of(CONFIGURATION_VECTOR)
            .ok_or_else(|| NlpError::UnknownVariableSet(CONFIGURATION_VECTOR.to_string()))?;
        let residual = pose_residual(
            &self.model,
            configuration.as_slice(),
            self.source,
            self.target,
            &self.desired,
        );

        let status = if report.status.is_degenerate() {
            IkStatus::Degenerate
        } else if !report.status.is_converged() {
            IkStatus::NotConverged
        } else if residual.within(&self.config.pose_tolerance) {
            IkStatus::Converged
        } else {
            IkStatus::PoseNotReached
        };

        if status == IkStatus::Converged {
            info!(
                iterations = report.iterations,
                position_error = residual.position_error,
                orientation_error = residual.orientation_angle,
                "IK converged"
            );
        } else {
            warn!(
                %status,
                solver_status = %report.status,
                position_error = residual.position_error,
                orientation_error = residual.orientation_angle,
                "IK did not converge"
            );
        }

        Ok(IkSolution {
            configuration,
            status,
            report,
            residual,
        })
    }
}

/// Assemble and solve in one call.
pub fn inverse_kinematics(
    model: &KinematicModel<f64>,
    source: &str,
    target: &str,
    desired: Pose<f64>,
    initial: &[f64],
    config: &IkConfig,
) -> Result<IkSolution, IkError> {
    IkProblem::new(model, source, target, desired, initial, config)?.solve()
}
