//! End-to-end solves against known configurations.

use approx::assert_relative_eq;
use kinopt_ik::{
    BoundPolicy, CouplingConfig, IkConfig, IkProblem, IkStatus, KinematicModel, Pose,
    forward_kinematics, inverse_kinematics, pose_residual,
};
use kinopt_nlp::{Degeneracy, NlpError, NlpSolver, Problem, SolveReport, SolveStatus};
use kinopt_test_utils::fixtures::{PLANAR_ARM, SIX_DOF_ARM};
use nalgebra::Vector3;

const SIX_DOF_TARGET: [f64; 6] = [0.5, 0.3, -0.4, 0.2, 0.1, -0.3];

fn target_pose(model: &KinematicModel<f64>, q: &[f64]) -> Pose<f64> {
    let base = model.link_index("base").unwrap();
    let tool = model.link_index("tool").unwrap();
    forward_kinematics(model, q, base, tool)
}

fn planar() -> KinematicModel<f64> {
    KinematicModel::from_urdf_str(PLANAR_ARM).unwrap()
}

fn six_dof() -> KinematicModel<f64> {
    KinematicModel::from_urdf_str(SIX_DOF_ARM).unwrap()
}

// ---------------------------------------------------------------------------
// Convergence
// ---------------------------------------------------------------------------

#[test]
fn planar_arm_converges_to_reachable_pose() {
    let model = planar();
    let desired = target_pose(&model, &[0.4, -0.6]);
    for initial in [[0.5, -0.5], [0.0, 0.3], [0.0, 0.0]] {
        let solution =
            inverse_kinematics(&model, "base", "tool", desired.clone(), &initial, &IkConfig::default())
                .unwrap();
        assert_eq!(solution.status, IkStatus::Converged, "from {initial:?}");
        assert!(solution.report.status.is_converged());
        assert!(solution.residual.position_error < 1e-4);
        assert!(solution.report.cost < 1e-5);

        let reached = target_pose(&model, solution.configuration.as_slice());
        assert_relative_eq!(reached.translation, desired.translation, epsilon = 1e-4);
    }
}

#[test]
fn six_dof_arm_converges_from_nearby_guess() {
    let model = six_dof();
    let desired = target_pose(&model, &SIX_DOF_TARGET);
    let initial: Vec<f64> = SIX_DOF_TARGET.iter().map(|v| v + 0.1).collect();

    let solution =
        inverse_kinematics(&model, "base", "tool", desired, &initial, &IkConfig::default()).unwrap();
    assert_eq!(solution.status, IkStatus::Converged, "{:?}", solution.report);
    assert!(solution.report.iterations <= IkConfig::default().solver.max_iterations);
    assert!(solution.residual.position_error < 1e-3, "{:?}", solution.residual);
    assert!(solution.residual.orientation_angle < 1e-2, "{:?}", solution.residual);
    assert!(solution.report.cost < 1e-4);
}

#[test]
fn source_link_frame_is_honored() {
    // Target expressed relative to the upper link rather than the base.
    let model = planar();
    let upper = model.link_index("upper_link").unwrap();
    let tool = model.link_index("tool").unwrap();
    let q_star = [0.9, -0.7];
    let desired = forward_kinematics(&model, &q_star, upper, tool);

    let solution =
        inverse_kinematics(&model, "upper_link", "tool", desired, &[0.0, 0.0], &IkConfig::default())
            .unwrap();
    // Only the elbow affects this relative pose.
    assert!(solution.residual.position_error < 1e-4);
    assert_relative_eq!(solution.configuration[1], -0.7, epsilon = 1e-3);
}

// ---------------------------------------------------------------------------
// Non-convergence
// ---------------------------------------------------------------------------

#[test]
fn unreachable_pose_terminates_with_finite_cost() {
    for model in [planar(), six_dof()] {
        let mut desired = target_pose(&model, &vec![0.2; model.dof()]);
        desired.translation = Vector3::new(5.0, 5.0, 5.0);
        let initial = vec![0.0; model.dof()];

        let solution =
            inverse_kinematics(&model, "base", "tool", desired, &initial, &IkConfig::default())
                .unwrap();
        assert_ne!(solution.status, IkStatus::Converged);
        assert!(!solution.is_converged());
        assert!(solution.report.cost.is_finite());
        assert!(solution.report.iterations <= 250);
        assert!(solution.residual.position_error > 1.0);
    }
}

#[test]
fn bounds_are_respected() {
    let model = planar();
    let desired = target_pose(&model, &[0.4, -0.6]);
    let config = IkConfig {
        bounds: BoundPolicy::Uniform {
            lower: -0.3,
            upper: 0.3,
        },
        ..IkConfig::default()
    };
    let solution = inverse_kinematics(&model, "base", "tool", desired, &[0.0, 0.0], &config).unwrap();
    for &q in solution.configuration.iter() {
        assert!((-0.3 - 1e-9..=0.3 + 1e-9).contains(&q), "q = {q}");
    }
    assert_ne!(solution.status, IkStatus::Converged);
}

#[test]
fn default_bounds_hold_at_convergence() {
    let model = six_dof();
    let desired = target_pose(&model, &SIX_DOF_TARGET);
    let solution =
        inverse_kinematics(&model, "base", "tool", desired, &[0.0; 6], &IkConfig::default()).unwrap();
    let pi = std::f64::consts::PI;
    assert!(solution.configuration.iter().all(|q| q.abs() <= pi + 1e-9));
}

// ---------------------------------------------------------------------------
// Determinism and isolation
// ---------------------------------------------------------------------------

#[test]
fn solving_twice_gives_the_same_answer() {
    let model = six_dof();
    let desired = target_pose(&model, &SIX_DOF_TARGET);
    let initial = [0.3, 0.1, -0.2, 0.0, 0.3, 0.0];
    let first =
        inverse_kinematics(&model, "base", "tool", desired.clone(), &initial, &IkConfig::default())
            .unwrap();
    let second =
        inverse_kinematics(&model, "base", "tool", desired, &initial, &IkConfig::default()).unwrap();
    assert_relative_eq!(first.configuration, second.configuration, epsilon = 1e-12);
    assert_eq!(first.report.iterations, second.report.iterations);
    assert_eq!(first.status, second.status);
}

#[test]
fn concurrent_solves_share_the_plain_model() {
    let model = planar();
    let targets = [[0.4, -0.6], [-0.5, 0.8], [1.0, 0.2], [0.0, -1.2]];
    std::thread::scope(|scope| {
        let handles: Vec<_> = targets
            .iter()
            .map(|q_star| {
                let model = &model;
                scope.spawn(move || {
                    let desired = target_pose(model, q_star);
                    inverse_kinematics(model, "base", "tool", desired, &[0.0, 0.0], &IkConfig::default())
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            let solution = handle.join().unwrap();
            assert!(solution.residual.position_error < 1e-3);
        }
    });
}

// ---------------------------------------------------------------------------
// Constraints and solver substitution
// ---------------------------------------------------------------------------

#[test]
fn joint_coupling_is_enforced() {
    let model = six_dof();
    // Reachable target that already satisfies j6 = j4.
    let q_star = [0.5, 0.3, -0.4, 0.2, 0.1, 0.2];
    let desired = target_pose(&model, &q_star);
    let config = IkConfig {
        couplings: vec![CouplingConfig {
            leader: "j4_forearm_roll".into(),
            follower: "j6_wrist_roll".into(),
            ratio: 1.0,
            offset: 0.0,
        }],
        ..IkConfig::default()
    };
    let initial = [0.4, 0.2, -0.3, 0.0, 0.2, 0.3];
    let solution = inverse_kinematics(&model, "base", "tool", desired, &initial, &config).unwrap();
    let q = &solution.configuration;
    assert!((q[5] - q[3]).abs() < 1e-8, "coupling violated: {q:?}");
    assert!(solution.report.constraint_violation < 1e-8);
    assert_ne!(solution.status, IkStatus::Degenerate);
}

/// Leaves the problem untouched and reports the iteration limit.
struct GiveUp;

impl NlpSolver for GiveUp {
    fn solve(&self, problem: &mut Problem) -> Result<SolveReport, NlpError> {
        Ok(SolveReport {
            status: SolveStatus::IterationLimit,
            iterations: 0,
            cost: problem.cost(),
            optimality: f64::INFINITY,
            constraint_violation: 0.0,
        })
    }
}

#[test]
fn non_converged_solve_still_returns_best_configuration() {
    let model = planar();
    let desired = target_pose(&model, &[0.4, -0.6]);
    let problem =
        IkProblem::new(&model, "base", "tool", desired, &[0.1, 0.2], &IkConfig::default()).unwrap();
    let solution = problem.solve_with(&GiveUp).unwrap();
    assert_eq!(solution.status, IkStatus::NotConverged);
    assert_eq!(solution.configuration.as_slice(), &[0.1, 0.2]);
    assert!(solution.residual.position_error > 0.0);
}

#[test]
fn antipodal_orientation_does_not_produce_nan() {
    // Desired orientation rotated by π about Z relative to q = 0: the
    // orientation gradient vanishes there, but nothing may turn non-finite.
    let model = planar();
    let mut desired = target_pose(&model, &[0.0, 0.0]);
    desired.rotation = nalgebra::Rotation3::from_euler_angles(0.0, 0.0, std::f64::consts::PI)
        .into_inner();
    let solution =
        inverse_kinematics(&model, "base", "tool", desired, &[0.0, 0.0], &IkConfig::default())
            .unwrap();
    assert!(solution.report.cost.is_finite());
    assert!(solution.configuration.iter().all(|q| q.is_finite()));
    assert_eq!(solution.status, IkStatus::PoseNotReached);
    assert!(solution.residual.orientation_angle > 1.0);
}

#[test]
fn nan_target_is_reported_degenerate() {
    let model = planar();
    let mut desired = target_pose(&model, &[0.4, -0.6]);
    desired.translation.x = f64::NAN;
    let solution =
        inverse_kinematics(&model, "base", "tool", desired, &[0.0, 0.0], &IkConfig::default())
            .unwrap();
    assert_eq!(solution.status, IkStatus::Degenerate);
    assert_eq!(
        solution.report.status,
        SolveStatus::Degenerate(Degeneracy::NonFiniteCost)
    );
    assert!(!solution.is_converged());
    assert_eq!(solution.configuration.as_slice(), &[0.0, 0.0]);
}

#[test]
fn reported_residual_matches_reached_pose() {
    let model = six_dof();
    let desired = target_pose(&model, &SIX_DOF_TARGET);
    let solution = inverse_kinematics(
        &model,
        "base",
        "tool",
        desired.clone(),
        &[0.0; 6],
        &IkConfig::default(),
    )
    .unwrap();

    let base = model.link_index("base").unwrap();
    let tool = model.link_index("tool").unwrap();
    let q = solution.configuration.as_slice();
    assert_eq!(solution.residual, pose_residual(&model, q, base, tool, &desired));

    let reached = target_pose(&model, q);
    assert_relative_eq!(
        solution.residual.position_error,
        (reached.translation - desired.translation).norm(),
        epsilon = 1e-15
    );
}
