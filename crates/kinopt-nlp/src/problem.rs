//! Problem assembly: registered components and whole-problem evaluation.

use nalgebra::{DMatrix, DVector};

use crate::component::{Bounds, ConstraintSet, CostTerm, VariableSet};
use crate::error::NlpError;
use crate::options::JacobianMode;

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// The registered variable sets, laid out end to end in registration order.
#[derive(Default)]
pub struct Variables {
    sets: Vec<Box<dyn VariableSet>>,
}

impl Variables {
    /// Look up a variable set by name.
    pub fn component(&self, name: &str) -> Option<&dyn VariableSet> {
        self.sets
            .iter()
            .find(|set| set.name() == name)
            .map(|set| set.as_ref())
    }

    /// Current values of the named set.
    pub fn values_of(&self, name: &str) -> Option<DVector<f64>> {
        self.component(name).map(|set| set.values())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.component(name).is_some()
    }

    /// Total number of scalar variables.
    pub fn len(&self) -> usize {
        self.sets.iter().map(|set| set.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(offset, set)` pairs in layout order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &dyn VariableSet)> {
        self.sets.iter().scan(0, |offset, set| {
            let start = *offset;
            *offset += set.len();
            Some((start, set.as_ref()))
        })
    }

    /// Concatenated values of all sets.
    pub fn values(&self) -> DVector<f64> {
        let mut x = DVector::zeros(self.len());
        for (offset, set) in self.iter() {
            x.rows_mut(offset, set.len()).copy_from(&set.values());
        }
        x
    }

    /// Concatenated bounds of all sets.
    pub fn bounds(&self) -> Vec<Bounds> {
        self.sets.iter().flat_map(|set| set.bounds()).collect()
    }

    /// Scatter `x` back into the sets.
    pub fn set_values(&mut self, x: &DVector<f64>) {
        let mut offset = 0;
        for set in &mut self.sets {
            let len = set.len();
            set.set_variables(&x.as_slice()[offset..offset + len]);
            offset += len;
        }
    }

    fn push(&mut self, set: Box<dyn VariableSet>) {
        self.sets.push(set);
    }

    fn layout(&self) -> Vec<(usize, usize, String)> {
        self.iter()
            .map(|(offset, set)| (offset, set.len(), set.name().to_string()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Problem
// ---------------------------------------------------------------------------

/// A nonlinear program built from named components.
///
/// ```text
/// minimize   Σ cost_k(x)
/// subject to lower_x ≤ x ≤ upper_x
///            lower_g ≤ g(x) ≤ upper_g
/// ```
#[derive(Default)]
pub struct Problem {
    variables: Variables,
    costs: Vec<Box<dyn CostTerm>>,
    constraints: Vec<Box<dyn ConstraintSet>>,
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable set. Names must be unique among variable sets.
    pub fn add_variable_set(&mut self, set: impl VariableSet + 'static) -> Result<(), NlpError> {
        if self.variables.contains(set.name()) {
            return Err(NlpError::DuplicateName(set.name().to_string()));
        }
        self.variables.push(Box::new(set));
        Ok(())
    }

    /// Register a cost term. Its dependencies must already be registered.
    pub fn add_cost_term(&mut self, term: impl CostTerm + 'static) -> Result<(), NlpError> {
        if self.costs.iter().any(|c| c.name() == term.name()) {
            return Err(NlpError::DuplicateName(term.name().to_string()));
        }
        self.check_dependencies(&term.dependencies())?;
        self.costs.push(Box::new(term));
        Ok(())
    }

    /// Register a constraint set. Its dependencies must already be registered.
    pub fn add_constraint_set(
        &mut self,
        constraint: impl ConstraintSet + 'static,
    ) -> Result<(), NlpError> {
        if self.constraints.iter().any(|c| c.name() == constraint.name()) {
            return Err(NlpError::DuplicateName(constraint.name().to_string()));
        }
        self.check_dependencies(&constraint.dependencies())?;
        self.constraints.push(Box::new(constraint));
        Ok(())
    }

    fn check_dependencies(&self, names: &[String]) -> Result<(), NlpError> {
        match names.iter().find(|name| !self.variables.contains(name)) {
            Some(missing) => Err(NlpError::UnknownVariableSet(missing.clone())),
            None => Ok(()),
        }
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn n_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn n_constraints(&self) -> usize {
        self.constraints.iter().map(|c| c.rows()).sum()
    }

    pub fn n_cost_terms(&self) -> usize {
        self.costs.len()
    }

    /// Current concatenated variable values.
    pub fn values(&self) -> DVector<f64> {
        self.variables.values()
    }

    pub fn set_values(&mut self, x: &DVector<f64>) {
        self.variables.set_values(x);
    }

    pub fn variable_bounds(&self) -> Vec<Bounds> {
        self.variables.bounds()
    }

    pub fn constraint_bounds(&self) -> Vec<Bounds> {
        self.constraints.iter().flat_map(|c| c.bounds()).collect()
    }

    // -- evaluation ---------------------------------------------------------

    /// Objective at the current values.
    pub fn cost(&self) -> f64 {
        self.costs.iter().map(|c| c.cost(&self.variables)).sum()
    }

    /// Stacked constraint rows at the current values.
    pub fn constraint_values(&self) -> DVector<f64> {
        let mut values = DVector::zeros(self.n_constraints());
        let mut row = 0;
        for constraint in &self.constraints {
            let rows = constraint.rows();
            values
                .rows_mut(row, rows)
                .copy_from(&constraint.values(&self.variables));
            row += rows;
        }
        values
    }

    /// Objective gradient at the current values.
    ///
    /// In [`JacobianMode::FiniteDifference`] the variables are perturbed and
    /// restored, hence `&mut self`.
    pub fn cost_gradient(&mut self, mode: JacobianMode) -> DVector<f64> {
        match mode {
            JacobianMode::Exact => self.exact_cost_gradient(),
            JacobianMode::FiniteDifference => {
                let jacobian = self.finite_difference(1, |p| DVector::from_element(1, p.cost()));
                jacobian.row(0).transpose()
            }
        }
    }

    /// Constraint Jacobian (`rows × n`) at the current values.
    pub fn constraint_jacobian(&mut self, mode: JacobianMode) -> DMatrix<f64> {
        match mode {
            JacobianMode::Exact => self.exact_constraint_jacobian(),
            JacobianMode::FiniteDifference => {
                let rows = self.n_constraints();
                self.finite_difference(rows, Problem::constraint_values)
            }
        }
    }

    fn exact_cost_gradient(&self) -> DVector<f64> {
        let mut gradient = DVector::zeros(self.n_variables());
        let mut block = DMatrix::zeros(0, 0);
        for (offset, len, name) in self.variables.layout() {
            for cost in &self.costs {
                block.resize_mut(0, 0, 0.0);
                cost.fill_jacobian_block(&name, &self.variables, &mut block);
                debug_assert!(
                    block.is_empty() || block.shape() == (1, len),
                    "cost term `{}` filled a {:?} block for `{name}`, expected (1, {len})",
                    cost.name(),
                    block.shape(),
                );
                if block.shape() == (1, len) {
                    let mut target = gradient.rows_mut(offset, len);
                    target += block.row(0).transpose();
                }
            }
        }
        gradient
    }

    fn exact_constraint_jacobian(&self) -> DMatrix<f64> {
        let mut jacobian = DMatrix::zeros(self.n_constraints(), self.n_variables());
        let mut block = DMatrix::zeros(0, 0);
        let layout = self.variables.layout();
        let mut row = 0;
        for constraint in &self.constraints {
            let rows = constraint.rows();
            for (offset, len, name) in &layout {
                block.resize_mut(0, 0, 0.0);
                constraint.fill_jacobian_block(name, &self.variables, &mut block);
                debug_assert!(
                    block.is_empty() || block.shape() == (rows, *len),
                    "constraint set `{}` filled a {:?} block for `{name}`, expected ({rows}, {len})",
                    constraint.name(),
                    block.shape(),
                );
                if block.shape() == (rows, *len) {
                    jacobian
                        .view_mut((row, *offset), (rows, *len))
                        .copy_from(&block);
                }
            }
            row += rows;
        }
        jacobian
    }

    /// Central differences of `f` over all variables, step
    /// `cbrt(ε) · max(1, |x_i|)`.
    fn finite_difference<F>(&mut self, rows: usize, f: F) -> DMatrix<f64>
    where
        F: Fn(&Problem) -> DVector<f64>,
    {
        let x = self.values();
        let mut jacobian = DMatrix::zeros(rows, x.len());
        let mut perturbed = x.clone();
        for i in 0..x.len() {
            let h = f64::EPSILON.cbrt() * x[i].abs().max(1.0);
            perturbed[i] = x[i] + h;
            self.set_values(&perturbed);
            let forward = f(self);
            perturbed[i] = x[i] - h;
            self.set_values(&perturbed);
            let backward = f(self);
            perturbed[i] = x[i];
            jacobian
                .column_mut(i)
                .copy_from(&((forward - backward) / (2.0 * h)));
        }
        self.set_values(&x);
        jacobian
    }
}

impl std::fmt::Debug for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Problem")
            .field(
                "variables",
                &self
                    .variables
                    .iter()
                    .map(|(_, s)| (s.name().to_string(), s.len()))
                    .collect::<Vec<_>>(),
            )
            .field(
                "costs",
                &self.costs.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field(
                "constraints",
                &self
                    .constraints
                    .iter()
                    .map(|c| (c.name(), c.rows()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
