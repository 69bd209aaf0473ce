//! Nonlinear program container and solver for kinopt.
//!
//! A [`Problem`] is assembled from named components: variable sets (the
//! unknowns and their bounds), cost terms and constraint sets. Costs and
//! constraints read the current variable values through [`Variables`] and
//! write their derivatives one block per variable set, so components can be
//! composed without knowing about each other.
//!
//! # Architecture
//!
//! ```text
//! VariableSet ─┐
//! CostTerm ────┼──► Problem ──► NlpSolver (SqpSolver) ──► SolveReport
//! ConstraintSet┘                    │
//!                                   └──► Clarabel QP subproblems
//! ```
//!
//! The solver writes its final iterate back into the variable sets, so the
//! caller reads the result from the same components it registered.

pub mod component;
pub mod error;
pub mod options;
pub mod problem;
mod qp;
pub mod report;
pub mod sqp;

pub use component::{Bounds, ConstraintSet, CostTerm, VariableSet};
pub use error::NlpError;
pub use options::{JacobianMode, SolverOptions};
pub use problem::{Problem, Variables};
pub use report::{Degeneracy, SolveReport, SolveStatus};
pub use sqp::SqpSolver;

/// A solver that can drive a [`Problem`] to a (local) optimum.
///
/// Implementations read values, bounds and derivatives from the problem's
/// components, iterate, and leave the best iterate found in the problem's
/// variable sets. Numerical trouble is reported through the returned
/// [`SolveReport`]; `Err` is reserved for malformed problems or options.
pub trait NlpSolver {
    /// Solve `problem` in place.
    fn solve(&self, problem: &mut Problem) -> Result<SolveReport, NlpError>;
}
