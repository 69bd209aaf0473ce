//! Sequential quadratic programming with a damped BFGS Hessian.
//!
//! Each iteration linearizes the constraints, solves a box-capped QP for the
//! step and its multipliers, then backtracks on an ℓ1 merit function.
//! Convergence is declared on the projected Lagrangian gradient
//! `‖P[lb,ub](x − ∇L) − x‖∞` together with the largest constraint violation.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, info, warn};

use crate::component::Bounds;
use crate::error::NlpError;
use crate::options::{JacobianMode, SolverOptions};
use crate::problem::Problem;
use crate::qp::{QpFailure, QpSubproblem};
use crate::report::{Degeneracy, SolveReport, SolveStatus};
use crate::NlpSolver;

/// Armijo sufficient-decrease constant.
const ARMIJO: f64 = 1e-4;
/// Smallest line-search step before the solve is declared stalled.
const MIN_STEP_LENGTH: f64 = 1e-10;
/// Powell damping threshold on `sᵀy / sᵀBs`.
const DAMPING: f64 = 0.2;
/// Merit penalty margin over the largest multiplier.
const PENALTY_MARGIN: f64 = 1.1;

/// SQP solver for [`Problem`]s with bounds and general constraints.
#[derive(Debug, Clone, Default)]
pub struct SqpSolver {
    options: SolverOptions,
}

impl SqpSolver {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }
}

/// Function values and derivatives at one iterate.
struct Evaluation {
    cost: f64,
    gradient: DVector<f64>,
    constraints: DVector<f64>,
    jacobian: DMatrix<f64>,
}

impl Evaluation {
    fn at(problem: &mut Problem, mode: JacobianMode) -> Result<Self, Degeneracy> {
        let cost = problem.cost();
        if !cost.is_finite() {
            return Err(Degeneracy::NonFiniteCost);
        }
        let gradient = problem.cost_gradient(mode);
        if gradient.iter().any(|g| !g.is_finite()) {
            return Err(Degeneracy::NonFiniteGradient);
        }
        let constraints = problem.constraint_values();
        let jacobian = problem.constraint_jacobian(mode);
        if constraints.iter().chain(jacobian.iter()).any(|v| !v.is_finite()) {
            return Err(Degeneracy::NonFiniteConstraint);
        }
        Ok(Self {
            cost,
            gradient,
            constraints,
            jacobian,
        })
    }

    fn lagrangian_gradient(&self, multipliers: &DVector<f64>) -> DVector<f64> {
        &self.gradient + self.jacobian.tr_mul(multipliers)
    }
}

impl NlpSolver for SqpSolver {
    fn solve(&self, problem: &mut Problem) -> Result<SolveReport, NlpError> {
        self.options.validate()?;
        let n = problem.n_variables();
        if n == 0 {
            return Err(NlpError::EmptyProblem);
        }
        let mode = self.options.jacobian_mode;
        let bounds = problem.variable_bounds();
        let row_bounds = problem.constraint_bounds();

        info!(
            variables = n,
            constraints = row_bounds.len(),
            costs = problem.n_cost_terms(),
            "starting SQP solve"
        );

        if let Some(index) = bounds.iter().position(|b| !b.is_consistent()) {
            warn!(index, bounds = ?bounds[index], "variable bounds admit no value");
            return Ok(report_at(problem, SolveStatus::Infeasible, 0, f64::INFINITY, &row_bounds));
        }

        let mut x = project(&problem.values(), &bounds);
        problem.set_values(&x);
        let mut current = match Evaluation::at(problem, mode) {
            Ok(evaluation) => evaluation,
            Err(degeneracy) => {
                warn!(?degeneracy, "initial point is not finite");
                let status = SolveStatus::Degenerate(degeneracy);
                return Ok(report_at(problem, status, 0, f64::INFINITY, &row_bounds));
            }
        };

        let mut hessian = DMatrix::<f64>::identity(n, n);
        let mut hessian_scaled = false;
        let mut penalty = 0.0_f64;
        let mut iterations = 0_u32;
        let mut optimality;
        let mut violation;

        let status = loop {
            let step_box: Vec<Bounds> = x
                .iter()
                .zip(&bounds)
                .map(|(&xi, b)| {
                    Bounds::new(
                        (b.lower - xi).max(-self.options.max_step),
                        (b.upper - xi).min(self.options.max_step),
                    )
                })
                .collect();
            let linearized: Vec<Bounds> = row_bounds
                .iter()
                .zip(current.constraints.iter())
                .map(|(b, &c)| Bounds::new(b.lower - c, b.upper - c))
                .collect();

            let subproblem = QpSubproblem {
                hessian: &hessian,
                gradient: &current.gradient,
                step: &step_box,
                jacobian: &current.jacobian,
                rows: &linearized,
            };
            let step = match subproblem.solve(&self.options.linear_algebra_backend) {
                Ok(step) => step,
                Err(failure) => {
                    optimality = f64::INFINITY;
                    violation = max_violation(&current.constraints, &row_bounds);
                    break subproblem_status(failure);
                }
            };

            let lagrangian = current.lagrangian_gradient(&step.multipliers);
            optimality = projected_gradient_norm(&x, &lagrangian, &bounds);
            violation = max_violation(&current.constraints, &row_bounds);
            debug!(
                iteration = iterations,
                cost = current.cost,
                optimality,
                violation,
                step = step.direction.amax(),
                "SQP iterate"
            );

            if optimality <= self.options.convergence_tolerance
                && violation <= self.options.convergence_tolerance
            {
                break SolveStatus::Converged;
            }
            if iterations >= self.options.max_iterations {
                break SolveStatus::IterationLimit;
            }

            // Line search on cost + penalty · ℓ1 violation.
            let largest_multiplier = step.multipliers.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
            penalty = penalty.max(PENALTY_MARGIN * largest_multiplier);
            let l1_violation = total_violation(&current.constraints, &row_bounds);
            let merit = current.cost + penalty * l1_violation;
            let slope = current.gradient.dot(&step.direction) - penalty * l1_violation;
            if slope.is_nan() || slope >= 0.0 {
                debug!(slope, "step is not a descent direction");
                break SolveStatus::Stalled;
            }

            let mut alpha = 1.0;
            let accepted = loop {
                let trial = project(&(&x + &step.direction * alpha), &bounds);
                problem.set_values(&trial);
                let trial_cost = problem.cost();
                let trial_merit = trial_cost
                    + penalty * total_violation(&problem.constraint_values(), &row_bounds);
                if trial_merit.is_finite() && trial_merit <= merit + ARMIJO * alpha * slope {
                    break Some(trial);
                }
                alpha *= 0.5;
                if alpha < MIN_STEP_LENGTH {
                    break None;
                }
            };
            let Some(x_next) = accepted else {
                problem.set_values(&x);
                break SolveStatus::Stalled;
            };

            let next = match Evaluation::at(problem, mode) {
                Ok(evaluation) => evaluation,
                Err(degeneracy) => {
                    problem.set_values(&x);
                    break SolveStatus::Degenerate(degeneracy);
                }
            };

            let s = &x_next - &x;
            let y = next.lagrangian_gradient(&step.multipliers) - &lagrangian;
            if !hessian_scaled {
                let sy = s.dot(&y);
                if sy > 0.0 {
                    hessian = DMatrix::identity(n, n) * (y.norm_squared() / sy);
                    hessian_scaled = true;
                }
            }
            damped_bfgs_update(&mut hessian, &s, &y);

            x = x_next;
            current = next;
            iterations += 1;
        };

        let status = match status {
            SolveStatus::IterationLimit | SolveStatus::Stalled
                if optimality <= self.options.acceptable_tolerance
                    && violation <= self.options.acceptable_tolerance =>
            {
                SolveStatus::Acceptable
            }
            other => other,
        };

        let report = SolveReport {
            status,
            iterations,
            cost: problem.cost(),
            optimality,
            constraint_violation: violation,
        };
        if status.is_converged() {
            info!(%status, iterations, cost = report.cost, optimality, "SQP finished");
        } else {
            warn!(%status, iterations, cost = report.cost, optimality, violation, "SQP did not converge");
        }
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn subproblem_status(failure: QpFailure) -> SolveStatus {
    match failure {
        QpFailure::Infeasible => SolveStatus::Infeasible,
        QpFailure::Numerical => SolveStatus::Degenerate(Degeneracy::SingularSubproblem),
    }
}

fn report_at(
    problem: &Problem,
    status: SolveStatus,
    iterations: u32,
    optimality: f64,
    row_bounds: &[Bounds],
) -> SolveReport {
    SolveReport {
        status,
        iterations,
        cost: problem.cost(),
        optimality,
        constraint_violation: max_violation(&problem.constraint_values(), row_bounds),
    }
}

fn project(x: &DVector<f64>, bounds: &[Bounds]) -> DVector<f64> {
    DVector::from_iterator(x.len(), x.iter().zip(bounds).map(|(&v, b)| b.clamp(v)))
}

/// `‖P[lb,ub](x − ∇L) − x‖∞`; zero at a bound-constrained stationary point.
fn projected_gradient_norm(x: &DVector<f64>, gradient: &DVector<f64>, bounds: &[Bounds]) -> f64 {
    x.iter()
        .zip(gradient.iter())
        .zip(bounds)
        .map(|((&xi, &gi), b)| (b.clamp(xi - gi) - xi).abs())
        .fold(0.0, f64::max)
}

fn max_violation(values: &DVector<f64>, bounds: &[Bounds]) -> f64 {
    values
        .iter()
        .zip(bounds)
        .map(|(&v, b)| b.violation(v))
        .fold(0.0, f64::max)
}

fn total_violation(values: &DVector<f64>, bounds: &[Bounds]) -> f64 {
    values.iter().zip(bounds).map(|(&v, b)| b.violation(v)).sum()
}

/// Powell-damped BFGS update; keeps `b` positive definite.
fn damped_bfgs_update(b: &mut DMatrix<f64>, s: &DVector<f64>, y: &DVector<f64>) {
    let bs = &*b * s;
    let sbs = s.dot(&bs);
    if sbs.is_nan() || sbs <= f64::MIN_POSITIVE {
        return;
    }
    let sy = s.dot(y);
    let r = if sy >= DAMPING * sbs {
        y.clone()
    } else {
        let theta = (1.0 - DAMPING) * sbs / (sbs - sy);
        y * theta + &bs * (1.0 - theta)
    };
    let sr = s.dot(&r);
    if sr.is_nan() || sr <= f64::MIN_POSITIVE {
        return;
    }
    *b += &r * r.transpose() / sr - &bs * bs.transpose() / sbs;
    let symmetric = (&*b + b.transpose()) * 0.5;
    *b = symmetric;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
