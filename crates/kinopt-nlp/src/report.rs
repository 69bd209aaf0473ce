//! Solve outcome.

use std::fmt;

/// Why a solve was abandoned as numerically degenerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degeneracy {
    NonFiniteCost,
    NonFiniteGradient,
    NonFiniteConstraint,
    /// The QP subproblem could not be solved.
    SingularSubproblem,
}

/// Terminal status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Optimality and feasibility within `convergence_tolerance`.
    Converged,
    /// Stopped early, but within `acceptable_tolerance`.
    Acceptable,
    IterationLimit,
    /// The line search could not make progress.
    Stalled,
    /// Bounds or linearized constraints admit no point.
    Infeasible,
    Degenerate(Degeneracy),
}

impl SolveStatus {
    /// `Converged` or `Acceptable`.
    pub const fn is_converged(self) -> bool {
        matches!(self, Self::Converged | Self::Acceptable)
    }

    pub const fn is_degenerate(self) -> bool {
        matches!(self, Self::Degenerate(_))
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => write!(f, "converged"),
            Self::Acceptable => write!(f, "acceptable"),
            Self::IterationLimit => write!(f, "iteration limit reached"),
            Self::Stalled => write!(f, "stalled"),
            Self::Infeasible => write!(f, "infeasible"),
            Self::Degenerate(d) => write!(f, "degenerate ({d:?})"),
        }
    }
}

/// Summary of a finished solve. The final iterate lives in the problem.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub status: SolveStatus,
    /// Accepted steps.
    pub iterations: u32,
    /// Objective at the final iterate.
    pub cost: f64,
    /// Infinity norm of the projected Lagrangian gradient.
    pub optimality: f64,
    /// Largest constraint bound violation.
    pub constraint_violation: f64,
}
