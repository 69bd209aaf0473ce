//! Kinematic tree over a generic scalar, built from a [`RobotDescription`].
//!
//! Links and joints are stored in depth-first order from the root link,
//! visiting sibling joints by name. Each actuated joint (revolute,
//! continuous, prismatic) takes the next index of the configuration vector
//! in that order, so the layout is deterministic for a given description.

use std::collections::HashSet;
use std::path::Path;

use nalgebra::{Matrix3, Vector3};
use tracing::warn;

use kinopt_urdf::{JointDescription, JointKind, PositionLimits, RobotDescription};

use crate::error::{IkError, ModelError};
use crate::pose::Pose;
use crate::scalar::Real;

/// Index of a link inside a [`KinematicModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkIndex(usize);

/// How a joint moves its child link.
#[derive(Debug, Clone, PartialEq)]
pub enum JointMotion<T: Real> {
    Fixed,
    /// Rotation by `q[index]` radians about a unit `axis`.
    Revolute { axis: Vector3<T>, index: usize },
    /// Translation by `q[index]` meters along a unit `axis`.
    Prismatic { axis: Vector3<T>, index: usize },
}

impl<T: Real> JointMotion<T> {
    /// Configuration index driving this joint, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Fixed => None,
            Self::Revolute { index, .. } | Self::Prismatic { index, .. } => Some(*index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Joint<T: Real> {
    pub name: String,
    pub parent: LinkIndex,
    pub child: LinkIndex,
    /// Parent link frame to joint frame.
    pub origin: Pose<T>,
    pub motion: JointMotion<T>,
    pub limits: Option<PositionLimits>,
}

impl<T: Real> Joint<T> {
    /// Parent link frame to child link frame at configuration `q`.
    pub fn transform(&self, q: &[T]) -> Pose<T> {
        match &self.motion {
            JointMotion::Fixed => self.origin.clone(),
            JointMotion::Revolute { axis, index } => self.origin.compose(&Pose::new(
                axis_rotation(axis, &q[*index]),
                Vector3::zeros(),
            )),
            JointMotion::Prismatic { axis, index } => self.origin.compose(&Pose::new(
                Matrix3::identity(),
                axis * q[*index].clone(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub name: String,
    /// Index into [`KinematicModel::joints`]; `None` for the root.
    pub parent_joint: Option<usize>,
}

/// A kinematic tree whose constants are of scalar type `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicModel<T: Real> {
    name: String,
    links: Vec<Link>,
    joints: Vec<Joint<T>>,
    dof: usize,
}

impl KinematicModel<f64> {
    /// Parse a URDF file and build the model.
    pub fn from_urdf_file(path: impl AsRef<Path>) -> Result<Self, IkError> {
        let robot = kinopt_urdf::parse_file(path)?;
        Ok(Self::from_description(&robot)?)
    }

    /// Parse a URDF string and build the model.
    pub fn from_urdf_str(xml: &str) -> Result<Self, IkError> {
        let robot = kinopt_urdf::parse_str(xml)?;
        Ok(Self::from_description(&robot)?)
    }
}

impl<T: Real> KinematicModel<T> {
    /// Build the tree from a parsed robot description.
    ///
    /// # Errors
    ///
    /// [`ModelError::UnsupportedJoint`] for multi-DOF joints or a zero
    /// motion axis, [`ModelError::Disconnected`] when a link cannot be
    /// reached from the root (a joint cycle detached from it).
    pub fn from_description(robot: &RobotDescription) -> Result<Self, ModelError> {
        let mut links = vec![Link {
            name: robot.root().to_string(),
            parent_joint: None,
        }];
        let mut joints: Vec<Joint<T>> = Vec::new();
        let mut placed: HashSet<&str> = HashSet::from([robot.root()]);
        let mut dof = 0;

        let mut stack: Vec<(&JointDescription, LinkIndex)> = robot
            .children_of(robot.root())
            .rev()
            .map(|joint| (joint, LinkIndex(0)))
            .collect();

        while let Some((data, parent)) = stack.pop() {
            if !placed.insert(data.child.as_str()) {
                warn!(joint = %data.name, link = %data.child, "link already placed; skipping joint");
                continue;
            }
            let motion = joint_motion(data, &mut dof)?;
            let child = LinkIndex(links.len());
            links.push(Link {
                name: data.child.clone(),
                parent_joint: Some(joints.len()),
            });
            joints.push(Joint {
                name: data.name.clone(),
                parent,
                child,
                origin: Pose::from_xyz_rpy(data.origin.xyz, data.origin.rpy),
                motion,
                limits: data.limits,
            });
            stack.extend(robot.children_of(&data.child).rev().map(|joint| (joint, child)));
        }

        if let Some(name) = robot.links().iter().find(|name| !placed.contains(name.as_str())) {
            return Err(ModelError::Disconnected(name.clone()));
        }

        Ok(Self {
            name: robot.name().to_string(),
            links,
            joints,
            dof,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length of the configuration vector.
    pub fn dof(&self) -> usize {
        self.dof
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn joints(&self) -> &[Joint<T>] {
        &self.joints
    }

    /// Resolve a link name.
    pub fn link_index(&self, name: &str) -> Result<LinkIndex, ModelError> {
        self.links
            .iter()
            .position(|link| link.name == name)
            .map(LinkIndex)
            .ok_or_else(|| ModelError::UnknownLink(name.to_string()))
    }

    /// Actuated joints in configuration order.
    pub fn actuated_joints(&self) -> impl Iterator<Item = &Joint<T>> {
        self.joints.iter().filter(|joint| joint.motion.index().is_some())
    }

    /// Names of the actuated joints in configuration order.
    pub fn joint_names(&self) -> Vec<&str> {
        self.actuated_joints().map(|j| j.name.as_str()).collect()
    }

    /// Position limits of the actuated joints in configuration order.
    pub fn joint_limits(&self) -> Vec<Option<PositionLimits>> {
        self.actuated_joints().map(|j| j.limits).collect()
    }

    /// Pose of `link` in the root frame at configuration `q`.
    pub fn link_pose(&self, q: &[T], link: LinkIndex) -> Pose<T> {
        let mut path = Vec::new();
        let mut current = link.0;
        while let Some(joint) = self.links[current].parent_joint {
            path.push(joint);
            current = self.joints[joint].parent.0;
        }
        path.iter()
            .rev()
            .fold(Pose::identity(), |pose, &joint| {
                pose.compose(&self.joints[joint].transform(q))
            })
    }

    /// Independent copy with every constant converted to `U`.
    pub fn cast<U: Real>(&self) -> KinematicModel<U> {
        KinematicModel {
            name: self.name.clone(),
            links: self.links.clone(),
            joints: self
                .joints
                .iter()
                .map(|joint| Joint {
                    name: joint.name.clone(),
                    parent: joint.parent,
                    child: joint.child,
                    origin: joint.origin.cast(),
                    motion: match &joint.motion {
                        JointMotion::Fixed => JointMotion::Fixed,
                        JointMotion::Revolute { axis, index } => JointMotion::Revolute {
                            axis: axis.map(|v| U::from(v.re())),
                            index: *index,
                        },
                        JointMotion::Prismatic { axis, index } => JointMotion::Prismatic {
                            axis: axis.map(|v| U::from(v.re())),
                            index: *index,
                        },
                    },
                    limits: joint.limits,
                })
                .collect(),
            dof: self.dof,
        }
    }
}

fn joint_motion<T: Real>(
    data: &JointDescription,
    dof: &mut usize,
) -> Result<JointMotion<T>, ModelError> {
    let unsupported = |kind: &str| ModelError::UnsupportedJoint {
        joint: data.name.clone(),
        kind: kind.to_string(),
    };

    let axis = Vector3::from(data.axis);
    let norm = axis.norm();
    let unit_axis = || {
        if norm > f64::EPSILON {
            Ok((axis / norm).map(T::from))
        } else {
            Err(unsupported("zero axis"))
        }
    };

    let motion = match data.kind {
        JointKind::Fixed => return Ok(JointMotion::Fixed),
        JointKind::Revolute | JointKind::Continuous => JointMotion::Revolute {
            axis: unit_axis()?,
            index: *dof,
        },
        JointKind::Prismatic => JointMotion::Prismatic {
            axis: unit_axis()?,
            index: *dof,
        },
        JointKind::Floating => return Err(unsupported("floating")),
        JointKind::Planar => return Err(unsupported("planar")),
        JointKind::Spherical => return Err(unsupported("spherical")),
    };
    *dof += 1;
    Ok(motion)
}

/// Rodrigues' formula for a unit `axis`.
fn axis_rotation<T: Real>(axis: &Vector3<T>, angle: &T) -> Matrix3<T> {
    let (s, c) = angle.sin_cos();
    let (x, y, z) = (axis.x.clone(), axis.y.clone(), axis.z.clone());
    let zero = T::from(0.0);
    let k = Matrix3::new(
        zero.clone(),
        -z.clone(),
        y.clone(),
        z,
        zero.clone(),
        -x.clone(),
        -y,
        x,
        zero,
    );
    let k2 = &k * &k;
    Matrix3::identity() + k * s + k2 * (T::from(1.0) - c)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
