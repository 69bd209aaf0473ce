//! Joint-coupling constraint set.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use kinopt_nlp::{Bounds, ConstraintSet, Variables};

use crate::error::{ConfigError, IkError};
use crate::model::KinematicModel;
use crate::scalar::Real;

/// Name the coupling constraint set is registered under.
pub const JOINT_COUPLING: &str = "joint_coupling";

const fn default_ratio() -> f64 {
    1.0
}

/// `q[follower] = ratio · q[leader] + offset`, as in a URDF `<mimic>` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingConfig {
    pub leader: String,
    pub follower: String,
    #[serde(default = "default_ratio")]
    pub ratio: f64,
    #[serde(default)]
    pub offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CouplingRow {
    leader: usize,
    follower: usize,
    ratio: f64,
    offset: f64,
}

/// One equality row `q[follower] − ratio · q[leader] = offset` per coupling.
#[derive(Debug, Clone, PartialEq)]
pub struct JointCoupling {
    name: String,
    var_set: String,
    dof: usize,
    rows: Vec<CouplingRow>,
}

impl JointCoupling {
    /// Resolve joint names against `model`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] when a joint is unknown or not actuated,
    /// or when a joint is coupled to itself.
    pub fn new<T: Real>(
        name: impl Into<String>,
        var_set: impl Into<String>,
        model: &KinematicModel<T>,
        couplings: &[CouplingConfig],
    ) -> Result<Self, IkError> {
        let joint_names = model.joint_names();
        let index_of = |joint: &str| {
            joint_names.iter().position(|name| *name == joint).ok_or_else(|| {
                ConfigError::invalid("couplings", format!("unknown actuated joint '{joint}'"))
            })
        };

        let rows = couplings
            .iter()
            .map(|coupling| {
                let leader = index_of(&coupling.leader)?;
                let follower = index_of(&coupling.follower)?;
                if leader == follower {
                    return Err(ConfigError::invalid(
                        "couplings",
                        format!("joint '{}' is coupled to itself", coupling.leader),
                    ));
                }
                Ok(CouplingRow {
                    leader,
                    follower,
                    ratio: coupling.ratio,
                    offset: coupling.offset,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            name: name.into(),
            var_set: var_set.into(),
            dof: model.dof(),
            rows,
        })
    }
}

impl ConstraintSet for JointCoupling {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<String> {
        vec![self.var_set.clone()]
    }

    fn rows(&self) -> usize {
        self.rows.len()
    }

    fn values(&self, variables: &Variables) -> DVector<f64> {
        let Some(q) = variables.values_of(&self.var_set) else {
            return DVector::from_element(self.rows.len(), f64::NAN);
        };
        DVector::from_iterator(
            self.rows.len(),
            self.rows
                .iter()
                .map(|row| q[row.follower] - row.ratio * q[row.leader]),
        )
    }

    fn bounds(&self) -> Vec<Bounds> {
        self.rows.iter().map(|row| Bounds::fixed(row.offset)).collect()
    }

    fn fill_jacobian_block(&self, var_set: &str, _variables: &Variables, jacobian: &mut DMatrix<f64>) {
        if var_set != self.var_set {
            return;
        }
        *jacobian = DMatrix::zeros(self.rows.len(), self.dof);
        for (i, row) in self.rows.iter().enumerate() {
            jacobian[(i, row.follower)] = 1.0;
            jacobian[(i, row.leader)] = -row.ratio;
        }
    }
}
