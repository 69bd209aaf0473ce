//! Robot descriptions for kinopt.
//!
//! [`parse_file`] and [`parse_str`] read URDF through `urdf-rs` and return a
//! validated [`RobotDescription`]: every joint references declared links,
//! every link except the single root has exactly one parent joint, and
//! position limits are ordered. Only the kinematic content is kept; inertial,
//! visual and collision data are dropped.

pub mod description;
pub mod error;
pub mod parse;

pub use description::{JointDescription, JointKind, Origin, PositionLimits, RobotDescription};
pub use error::UrdfError;
pub use parse::{parse_file, parse_str};
