//! kinopt command-line interface.
//!
//! - `solve`: solve inverse kinematics for a target pose and print the report
//! - `fk`: print the forward-kinematics pose for a joint configuration

mod logger;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, error};

use kinopt_ik::{
    IkConfig, IkError, IkSolution, KinematicModel, Pose, forward_kinematics, inverse_kinematics,
    rpy_from_rotation,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Optimization-based inverse kinematics for URDF robots.
#[derive(Parser)]
#[command(name = "kinopt", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve for joint values that place `target` at the given pose.
    Solve {
        /// Robot description.
        #[arg(long)]
        urdf: PathBuf,

        /// Link whose frame the target pose is expressed in.
        #[arg(long)]
        source: String,

        /// Link to drive to the target pose.
        #[arg(long)]
        target: String,

        /// Desired position.
        #[arg(long, required = true, num_args = 3, value_names = ["X", "Y", "Z"],
              allow_negative_numbers = true)]
        xyz: Vec<f64>,

        /// Desired orientation as roll, pitch, yaw in radians.
        #[arg(long, num_args = 3, value_names = ["R", "P", "Y"], allow_negative_numbers = true,
              default_values_t = [0.0, 0.0, 0.0])]
        rpy: Vec<f64>,

        /// TOML solver configuration.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Initial guess, one value per actuated joint. Zeros when omitted.
        #[arg(long, num_args = 1.., allow_negative_numbers = true)]
        initial: Option<Vec<f64>>,
    },

    /// Print the pose of `target` relative to `source`.
    Fk {
        /// Robot description.
        #[arg(long)]
        urdf: PathBuf,

        #[arg(long)]
        source: String,

        #[arg(long)]
        target: String,

        /// Joint values, one per actuated joint.
        #[arg(long, num_args = 1.., allow_negative_numbers = true)]
        joints: Vec<f64>,
    },
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn load_model(path: &Path) -> Result<KinematicModel<f64>, IkError> {
    let model = KinematicModel::from_urdf_file(path)?;
    debug!(robot = model.name(), dof = model.dof(), "loaded model");
    Ok(model)
}

fn triple(values: &[f64]) -> [f64; 3] {
    [values[0], values[1], values[2]]
}

fn print_pose(pose: &Pose<f64>) {
    let t = &pose.translation;
    let rpy = rpy_from_rotation(&pose.rotation);
    println!("xyz: [{:.6}, {:.6}, {:.6}]", t.x, t.y, t.z);
    println!("rpy: [{:.6}, {:.6}, {:.6}]", rpy.x, rpy.y, rpy.z);
}

fn print_solution(model: &KinematicModel<f64>, solution: &IkSolution) {
    let report = &solution.report;
    println!("status: {} (solver: {})", solution.status, report.status);
    println!(
        "iterations={}, cost={:.3e}, optimality={:.3e}, violation={:.3e}",
        report.iterations, report.cost, report.optimality, report.constraint_violation
    );
    println!(
        "position error={:.3e} m, orientation error={:.3e} rad",
        solution.residual.position_error, solution.residual.orientation_angle
    );
    println!();
    for (name, value) in model.joint_names().iter().zip(solution.configuration.iter()) {
        println!("  {name:<24} {value:>10.6}");
    }
}

fn run_solve(
    urdf: &Path,
    source: &str,
    target: &str,
    xyz: &[f64],
    rpy: &[f64],
    config: Option<&Path>,
    initial: Option<Vec<f64>>,
) -> Result<IkSolution, IkError> {
    let model = load_model(urdf)?;
    let config = match config {
        Some(path) => IkConfig::from_file(path)?,
        None => IkConfig::default(),
    };
    let initial = initial.unwrap_or_else(|| vec![0.0; model.dof()]);
    let desired = Pose::from_xyz_rpy(triple(xyz), triple(rpy));

    let solution = inverse_kinematics(&model, source, target, desired, &initial, &config)?;
    print_solution(&model, &solution);
    Ok(solution)
}

fn run_fk(urdf: &Path, source: &str, target: &str, joints: &[f64]) -> Result<(), IkError> {
    let model = load_model(urdf)?;
    if joints.len() != model.dof() {
        return Err(IkError::DimensionMismatch {
            expected: model.dof(),
            got: joints.len(),
        });
    }
    let pose = forward_kinematics(
        &model,
        joints,
        model.link_index(source)?,
        model.link_index(target)?,
    );
    print_pose(&pose);
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    logger::init_logger();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Solve {
            urdf,
            source,
            target,
            xyz,
            rpy,
            config,
            initial,
        } => run_solve(
            &urdf,
            &source,
            &target,
            &xyz,
            &rpy,
            config.as_deref(),
            initial,
        )
        .map(|solution| solution.is_converged()),
        Commands::Fk {
            urdf,
            source,
            target,
            joints,
        } => run_fk(&urdf, &source, &target, &joints).map(|()| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        // The best configuration was printed; signal that the pose was missed.
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn solve_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "kinopt", "solve", "--urdf", "arm.urdf", "--source", "base", "--target", "tool", "--xyz", "0.3", "-0.2",
            "0.5", "--rpy", "0", "-1.57", "0", "--initial", "0.1", "-0.1",
        ])
        .unwrap();
        let Commands::Solve {
            xyz, rpy, initial, source, ..
        } = cli.command
        else {
            panic!("expected solve");
        };
        assert_eq!(xyz, vec![0.3, -0.2, 0.5]);
        assert_eq!(rpy, vec![0.0, -1.57, 0.0]);
        assert_eq!(initial, Some(vec![0.1, -0.1]));
        assert_eq!(source, "base");
    }

    #[test]
    fn rpy_defaults_to_identity() {
        let cli = Cli::try_parse_from([
            "kinopt", "solve", "--urdf", "arm.urdf", "--source", "base", "--target", "tool", "--xyz", "1", "2", "3",
        ])
        .unwrap();
        let Commands::Solve { rpy, .. } = cli.command else {
            panic!("expected solve");
        };
        assert_eq!(rpy, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn xyz_requires_three_values() {
        let result = Cli::try_parse_from([
            "kinopt", "solve", "--urdf", "arm.urdf", "--source", "base", "--target", "tool", "--xyz", "1", "2",
        ]);
        assert!(result.is_err());
    }
}
