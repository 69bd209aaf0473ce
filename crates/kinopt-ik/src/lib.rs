//! Optimization-based inverse kinematics.
//!
//! Finds the joint configuration that brings a target link to a desired pose
//! relative to a source link by minimizing a weighted pose-error cost over
//! the bounded configuration vector. The gradient is exact: forward
//! kinematics is generic over the scalar type and is evaluated once with
//! dual numbers per gradient request.
//!
//! # Architecture
//!
//! ```text
//! RobotDescription ──► KinematicModel<f64> ──cast──► KinematicModel<Gradient>
//!                            │                              │
//!                            ▼                              ▼
//!            ConfigurationVariables ─┐        PoseCost (value + AD gradient)
//!            JointCoupling ──────────┼──► kinopt_nlp::Problem ──► NlpSolver
//!                                    │                              │
//!                                    └──────── IkSolution ◄─────────┘
//! ```
//!
//! ```no_run
//! use kinopt_ik::{IkConfig, KinematicModel, Pose, inverse_kinematics};
//!
//! # fn main() -> Result<(), kinopt_ik::IkError> {
//! let model = KinematicModel::from_urdf_file("arm.urdf")?;
//! let desired = Pose::from_xyz_rpy([0.3, 0.1, 0.4], [0.0, 1.57, 0.0]);
//! let q0 = vec![0.0; model.dof()];
//! let solution = inverse_kinematics(&model, "base", "tool", desired, &q0, &IkConfig::default())?;
//! println!("{} -> {:?}", solution.status, solution.configuration.as_slice());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constraint;
pub mod cost;
pub mod error;
pub mod kinematics;
pub mod model;
pub mod pose;
pub mod problem;
pub mod rotation;
pub mod scalar;
pub mod variables;

pub use config::{IkConfig, PoseTolerance};
pub use constraint::{CouplingConfig, JointCoupling};
pub use cost::{CostWeights, PoseCost, PoseResidual, pose_cost, pose_residual};
pub use error::{ConfigError, IkError, ModelError};
pub use kinematics::forward_kinematics;
pub use model::{KinematicModel, LinkIndex};
pub use pose::Pose;
pub use problem::{IkProblem, IkSolution, IkStatus, inverse_kinematics};
pub use rotation::{rotation_angle, rotation_from_rpy, rpy_from_rotation, trace_error};
pub use scalar::{Gradient, Real};
pub use variables::{BoundPolicy, ConfigurationVariables};
