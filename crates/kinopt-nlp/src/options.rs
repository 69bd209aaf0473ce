//! Solver options.

use serde::{Deserialize, Serialize};

use crate::error::NlpError;

/// How derivatives are obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JacobianMode {
    /// Use the components' `fill_jacobian_block`.
    #[default]
    Exact,
    /// Central differences over the whole variable vector.
    FiniteDifference,
}

/// Direct linear solvers Clarabel can factor the QP KKT system with.
const LINEAR_ALGEBRA_BACKENDS: &[&str] = &["qdldl"];

/// Options for [`SqpSolver`](crate::SqpSolver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    #[serde(default)]
    pub jacobian_mode: JacobianMode,
    /// Upper bound on accepted steps.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// First-order optimality and feasibility threshold for `Converged`.
    #[serde(default = "default_convergence_tolerance")]
    pub convergence_tolerance: f64,
    /// Looser threshold reported as `Acceptable` when the solve stops early.
    #[serde(default = "default_acceptable_tolerance")]
    pub acceptable_tolerance: f64,
    /// Per-variable step cap in each subproblem.
    #[serde(default = "default_max_step")]
    pub max_step: f64,
    /// Clarabel direct solve method.
    #[serde(default = "default_linear_algebra_backend")]
    pub linear_algebra_backend: String,
}

const fn default_max_iterations() -> u32 {
    250
}
const fn default_convergence_tolerance() -> f64 {
    1e-9
}
const fn default_acceptable_tolerance() -> f64 {
    1e-6
}
const fn default_max_step() -> f64 {
    0.5
}
fn default_linear_algebra_backend() -> String {
    "qdldl".to_string()
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            jacobian_mode: JacobianMode::default(),
            max_iterations: default_max_iterations(),
            convergence_tolerance: default_convergence_tolerance(),
            acceptable_tolerance: default_acceptable_tolerance(),
            max_step: default_max_step(),
            linear_algebra_backend: default_linear_algebra_backend(),
        }
    }
}

impl SolverOptions {
    /// Check option values.
    pub fn validate(&self) -> Result<(), NlpError> {
        if self.max_iterations == 0 {
            return Err(NlpError::InvalidOptions(
                "max_iterations must be > 0".into(),
            ));
        }
        if !(self.convergence_tolerance > 0.0 && self.convergence_tolerance.is_finite()) {
            return Err(NlpError::InvalidOptions(format!(
                "convergence_tolerance must be positive and finite, got {}",
                self.convergence_tolerance
            )));
        }
        if !(self.acceptable_tolerance >= self.convergence_tolerance
            && self.acceptable_tolerance.is_finite())
        {
            return Err(NlpError::InvalidOptions(format!(
                "acceptable_tolerance ({}) must be finite and >= convergence_tolerance ({})",
                self.acceptable_tolerance, self.convergence_tolerance
            )));
        }
        if self.max_step.is_nan() || self.max_step <= 0.0 {
            return Err(NlpError::InvalidOptions(format!(
                "max_step must be > 0, got {}",
                self.max_step
            )));
        }
        if !LINEAR_ALGEBRA_BACKENDS.contains(&self.linear_algebra_backend.as_str()) {
            return Err(NlpError::InvalidOptions(format!(
                "unknown linear_algebra_backend '{}', expected one of {LINEAR_ALGEBRA_BACKENDS:?}",
                self.linear_algebra_backend
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
