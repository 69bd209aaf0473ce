//! The configuration vector as a solver variable set.

use std::f64::consts::PI;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use kinopt_nlp::{Bounds, VariableSet};

use crate::error::IkError;
use crate::model::KinematicModel;
use crate::scalar::Real;

/// Name the configuration variable set is registered under.
pub const CONFIGURATION_VECTOR: &str = "configuration_vector";

/// How per-joint bounds are chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BoundPolicy {
    /// The same interval for every joint.
    Uniform { lower: f64, upper: f64 },
    /// URDF position limits; `[-π, π]` for joints without a range.
    JointLimits,
}

impl Default for BoundPolicy {
    fn default() -> Self {
        Self::Uniform {
            lower: -PI,
            upper: PI,
        }
    }
}

impl BoundPolicy {
    /// One bound per configuration entry of `model`.
    pub fn bounds<T: Real>(&self, model: &KinematicModel<T>) -> Vec<Bounds> {
        match self {
            Self::Uniform { lower, upper } => vec![Bounds::new(*lower, *upper); model.dof()],
            Self::JointLimits => model
                .joint_limits()
                .into_iter()
                .map(|limits| limits.map_or(Bounds::new(-PI, PI), |l| Bounds::new(l.lower, l.upper)))
                .collect(),
        }
    }
}

/// Joint configuration the solver optimizes.
///
/// [`set_variables`](VariableSet::set_variables) stores whatever it is given:
/// bounds are the solver's business, and trial points during a line search
/// may transiently sit outside them.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationVariables {
    name: String,
    values: DVector<f64>,
    bounds: Vec<Bounds>,
}

impl ConfigurationVariables {
    /// # Errors
    ///
    /// [`IkError::DimensionMismatch`] if `initial.len() != model.dof()`.
    pub fn new<T: Real>(
        name: impl Into<String>,
        model: &KinematicModel<T>,
        initial: &[f64],
        policy: &BoundPolicy,
    ) -> Result<Self, IkError> {
        if initial.len() != model.dof() {
            return Err(IkError::DimensionMismatch {
                expected: model.dof(),
                got: initial.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            values: DVector::from_column_slice(initial),
            bounds: policy.bounds(model),
        })
    }
}

impl VariableSet for ConfigurationVariables {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn values(&self) -> DVector<f64> {
        self.values.clone()
    }

    fn set_variables(&mut self, values: &[f64]) {
        self.values.copy_from_slice(values);
    }

    fn bounds(&self) -> Vec<Bounds> {
        self.bounds.clone()
    }
}
