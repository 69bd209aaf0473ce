//! Quadratic subproblem of one SQP iteration.
//!
//! ```text
//! minimize   ½ dᵀ B d + gᵀ d
//! subject to step.lower ≤ d ≤ step.upper
//!            rows.lower ≤ J d ≤ rows.upper
//! ```
//!
//! When every row is an equality the KKT system is solved directly and the
//! result is used if it respects the step box. Otherwise the subproblem goes
//! to Clarabel.

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus,
    SupportedConeT::{self, NonnegativeConeT, ZeroConeT},
};
use nalgebra::{DMatrix, DVector};

use crate::component::Bounds;

/// Slack allowed when checking a Newton step against the step box.
const BOX_TOLERANCE: f64 = 1e-12;

const QP_MAX_ITER: u32 = 200;
const QP_TOLERANCE: f64 = 1e-10;

pub(crate) struct QpSubproblem<'a> {
    pub hessian: &'a DMatrix<f64>,
    pub gradient: &'a DVector<f64>,
    /// Per-variable step bounds.
    pub step: &'a [Bounds],
    /// Linearized constraint rows, `m × n`.
    pub jacobian: &'a DMatrix<f64>,
    pub rows: &'a [Bounds],
}

#[derive(Debug, Clone)]
pub(crate) struct QpStep {
    pub direction: DVector<f64>,
    /// One multiplier per constraint row, sign convention `∇L = g + Jᵀλ`.
    pub multipliers: DVector<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QpFailure {
    Infeasible,
    Numerical,
}

impl QpSubproblem<'_> {
    pub fn solve(&self, backend: &str) -> Result<QpStep, QpFailure> {
        if self.rows.iter().all(Bounds::is_equality) {
            if let Some(step) = self.newton_step() {
                let inside = step
                    .direction
                    .iter()
                    .zip(self.step)
                    .all(|(&d, b)| d >= b.lower - BOX_TOLERANCE && d <= b.upper + BOX_TOLERANCE);
                if inside {
                    return Ok(step);
                }
            }
        }
        self.interior_point_step(backend)
    }

    /// Solve `[B Jᵀ; J 0] [d; λ] = [−g; r]` ignoring the step box.
    fn newton_step(&self) -> Option<QpStep> {
        let n = self.gradient.len();
        let m = self.rows.len();
        let mut kkt = DMatrix::zeros(n + m, n + m);
        kkt.view_mut((0, 0), (n, n)).copy_from(self.hessian);
        kkt.view_mut((n, 0), (m, n)).copy_from(self.jacobian);
        kkt.view_mut((0, n), (n, m))
            .copy_from(&self.jacobian.transpose());

        let mut rhs = DVector::zeros(n + m);
        rhs.rows_mut(0, n).copy_from(&(-self.gradient));
        for (i, row) in self.rows.iter().enumerate() {
            rhs[n + i] = row.upper;
        }

        let solution = kkt.lu().solve(&rhs)?;
        if solution.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some(QpStep {
            direction: solution.rows(0, n).into_owned(),
            multipliers: solution.rows(n, m).into_owned(),
        })
    }

    fn interior_point_step(&self, backend: &str) -> Result<QpStep, QpFailure> {
        let n = self.gradient.len();
        let (a, b, cones, origins) = self.conic_rows();

        let p_csc = dmatrix_to_csc_upper_tri(self.hessian);
        let a_csc = dmatrix_to_csc(&a);
        let q: Vec<f64> = self.gradient.iter().copied().collect();

        let settings = DefaultSettingsBuilder::default()
            .max_iter(QP_MAX_ITER)
            .verbose(false)
            .tol_gap_abs(QP_TOLERANCE)
            .tol_gap_rel(QP_TOLERANCE)
            .tol_feas(QP_TOLERANCE)
            .direct_solve_method(backend.to_string())
            .build()
            .map_err(|_| QpFailure::Numerical)?;

        let mut solver = DefaultSolver::new(&p_csc, &q, &a_csc, &b, &cones, settings);
        solver.solve();
        let solution = &solver.solution;

        match solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => {}
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                return Err(QpFailure::Infeasible);
            }
            _ => return Err(QpFailure::Numerical),
        }

        let direction = DVector::from_column_slice(&solution.x[..n]);
        let mut multipliers = DVector::zeros(self.rows.len());
        for (k, origin) in origins.iter().enumerate() {
            match *origin {
                RowOrigin::Upper(i) => multipliers[i] += solution.z[k],
                RowOrigin::Lower(i) => multipliers[i] -= solution.z[k],
                RowOrigin::Step => {}
            }
        }
        Ok(QpStep {
            direction,
            multipliers,
        })
    }

    /// Assemble `A d + s = b` with equalities first, then `A d ≤ b` rows.
    fn conic_rows(&self) -> (DMatrix<f64>, Vec<f64>, Vec<SupportedConeT<f64>>, Vec<RowOrigin>) {
        let n = self.gradient.len();
        let mut rows: Vec<(DVector<f64>, f64, RowOrigin)> = Vec::new();

        let equalities: Vec<usize> = (0..self.rows.len())
            .filter(|&i| self.rows[i].is_equality())
            .collect();
        for &i in &equalities {
            rows.push((
                self.jacobian.row(i).transpose(),
                self.rows[i].upper,
                RowOrigin::Upper(i),
            ));
        }
        let n_eq = rows.len();

        for (i, bounds) in self.rows.iter().enumerate() {
            if bounds.is_equality() {
                continue;
            }
            let gradient = self.jacobian.row(i).transpose();
            if bounds.upper.is_finite() {
                rows.push((gradient.clone(), bounds.upper, RowOrigin::Upper(i)));
            }
            if bounds.lower.is_finite() {
                rows.push((-gradient, -bounds.lower, RowOrigin::Lower(i)));
            }
        }

        for (j, bounds) in self.step.iter().enumerate() {
            if bounds.upper.is_finite() {
                rows.push((unit(n, j, 1.0), bounds.upper, RowOrigin::Step));
            }
            if bounds.lower.is_finite() {
                rows.push((unit(n, j, -1.0), -bounds.lower, RowOrigin::Step));
            }
        }

        let mut a = DMatrix::zeros(rows.len(), n);
        let mut b = Vec::with_capacity(rows.len());
        let mut origins = Vec::with_capacity(rows.len());
        for (k, (gradient, rhs, origin)) in rows.into_iter().enumerate() {
            a.row_mut(k).copy_from(&gradient.transpose());
            b.push(rhs);
            origins.push(origin);
        }

        let mut cones = Vec::with_capacity(2);
        if n_eq > 0 {
            cones.push(ZeroConeT(n_eq));
        }
        if b.len() > n_eq {
            cones.push(NonnegativeConeT(b.len() - n_eq));
        }
        (a, b, cones, origins)
    }
}

/// Which constraint row a conic row came from.
#[derive(Debug, Clone, Copy)]
enum RowOrigin {
    Upper(usize),
    Lower(usize),
    Step,
}

fn unit(n: usize, j: usize, value: f64) -> DVector<f64> {
    let mut v = DVector::zeros(n);
    v[j] = value;
    v
}

/// Convert a nalgebra `DMatrix<f64>` to a Clarabel `CscMatrix<f64>`.
fn dmatrix_to_csc(m: &DMatrix<f64>) -> CscMatrix<f64> {
    let (nrows, ncols) = m.shape();
    let mut colptr = vec![0usize; ncols + 1];
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();

    for (j, column) in m.column_iter().enumerate() {
        for (i, &v) in column.iter().enumerate() {
            if v != 0.0 {
                rowval.push(i);
                nzval.push(v);
            }
        }
        colptr[j + 1] = rowval.len();
    }

    CscMatrix::new(nrows, ncols, colptr, rowval, nzval)
}

/// Upper triangle of a symmetric matrix as `CscMatrix<f64>`.
fn dmatrix_to_csc_upper_tri(m: &DMatrix<f64>) -> CscMatrix<f64> {
    let n = m.ncols();
    let mut colptr = vec![0usize; n + 1];
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();

    for j in 0..n {
        for i in 0..=j {
            let v = 0.5 * (m[(i, j)] + m[(j, i)]);
            if v != 0.0 {
                rowval.push(i);
                nzval.push(v);
            }
        }
        colptr[j + 1] = rowval.len();
    }

    CscMatrix::new(n, n, colptr, rowval, nzval)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
