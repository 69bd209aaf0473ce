//! Component traits a [`Problem`](crate::Problem) is assembled from.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::problem::Variables;

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Closed interval `[lower, upper]` on a variable or constraint row.
///
/// Infinite endpoints mean "unbounded on that side". Equal endpoints make an
/// equality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Equality bound `[value, value]`.
    pub const fn fixed(value: f64) -> Self {
        Self {
            lower: value,
            upper: value,
        }
    }

    pub const fn unbounded() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }

    pub fn is_equality(&self) -> bool {
        self.lower == self.upper
    }

    /// `false` when `lower > upper` or either endpoint is NaN.
    pub fn is_consistent(&self) -> bool {
        self.lower <= self.upper
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.lower).min(self.upper)
    }

    /// Distance from `value` to the interval, zero inside.
    pub fn violation(&self, value: f64) -> f64 {
        if value < self.lower {
            self.lower - value
        } else if value > self.upper {
            value - self.upper
        } else {
            0.0
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// A named block of decision variables.
pub trait VariableSet: Send {
    fn name(&self) -> &str;

    /// Number of scalar variables in the block.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current values.
    fn values(&self) -> DVector<f64>;

    /// Overwrite the values. `values.len()` equals [`len`](Self::len).
    fn set_variables(&mut self, values: &[f64]);

    /// One bound per variable.
    fn bounds(&self) -> Vec<Bounds>;
}

/// A named scalar cost added to the objective.
pub trait CostTerm: Send {
    fn name(&self) -> &str;

    /// Names of the variable sets this term reads. Checked when the term is
    /// added to a problem.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Objective contribution at the current values.
    fn cost(&self, variables: &Variables) -> f64;

    /// Write `∂cost/∂(var_set)` into `jacobian`, resizing it to
    /// `1 × len(var_set)`.
    ///
    /// Must leave `jacobian` untouched for variable sets the term does not
    /// depend on.
    fn fill_jacobian_block(&self, var_set: &str, variables: &Variables, jacobian: &mut DMatrix<f64>);
}

/// A named block of constraint rows `lower ≤ g(x) ≤ upper`.
pub trait ConstraintSet: Send {
    fn name(&self) -> &str;

    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Number of rows.
    fn rows(&self) -> usize;

    /// Row values at the current variables.
    fn values(&self, variables: &Variables) -> DVector<f64>;

    /// One bound per row.
    fn bounds(&self) -> Vec<Bounds>;

    /// Write `∂g/∂(var_set)` into `jacobian`, resizing it to
    /// `rows × len(var_set)`. Same contract as
    /// [`CostTerm::fill_jacobian_block`].
    fn fill_jacobian_block(&self, var_set: &str, variables: &Variables, jacobian: &mut DMatrix<f64>);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
