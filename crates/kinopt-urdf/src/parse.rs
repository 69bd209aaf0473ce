//! URDF reading through `urdf-rs`.

use std::path::Path;

use tracing::debug;

use crate::description::{JointDescription, JointKind, Origin, PositionLimits, RobotDescription};
use crate::error::UrdfError;

/// Read and validate a URDF file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<RobotDescription, UrdfError> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path).map_err(|source| UrdfError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&xml)
}

/// Read and validate URDF XML.
pub fn parse_str(xml: &str) -> Result<RobotDescription, UrdfError> {
    let robot = urdf_rs::read_from_string(xml).map_err(|e| UrdfError::Parse(e.to_string()))?;
    let links = robot.links.iter().map(|link| link.name.clone()).collect();
    let joints = robot.joints.iter().map(describe_joint).collect();
    let description = RobotDescription::new(robot.name, links, joints)?;
    debug!(
        robot = description.name(),
        root = description.root(),
        links = description.links().len(),
        dof = description.dof(),
        "parsed URDF"
    );
    Ok(description)
}

fn describe_joint(joint: &urdf_rs::Joint) -> JointDescription {
    let kind = match joint.joint_type {
        urdf_rs::JointType::Revolute => JointKind::Revolute,
        urdf_rs::JointType::Continuous => JointKind::Continuous,
        urdf_rs::JointType::Prismatic => JointKind::Prismatic,
        urdf_rs::JointType::Fixed => JointKind::Fixed,
        urdf_rs::JointType::Floating => JointKind::Floating,
        urdf_rs::JointType::Planar => JointKind::Planar,
        urdf_rs::JointType::Spherical => JointKind::Spherical,
    };

    // urdf-rs fills a missing <limit> with zeros; a zero-width range means
    // no range was given.
    let limit = &joint.limit;
    let limits = matches!(kind, JointKind::Revolute | JointKind::Prismatic)
        .then_some(PositionLimits {
            lower: limit.lower,
            upper: limit.upper,
        })
        .filter(|l| l.lower != 0.0 || l.upper != 0.0);

    JointDescription {
        name: joint.name.clone(),
        kind,
        parent: joint.parent.link.clone(),
        child: joint.child.link.clone(),
        origin: Origin {
            xyz: *joint.origin.xyz,
            rpy: *joint.origin.rpy,
        },
        axis: *joint.axis.xyz,
        limits,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
