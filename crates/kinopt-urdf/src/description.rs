//! Validated kinematic content of a robot description.

use std::collections::{HashMap, HashSet};

use crate::error::UrdfError;

/// Joint type as declared in the description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointKind {
    Revolute,
    Continuous,
    Prismatic,
    Fixed,
    Floating,
    Planar,
    Spherical,
}

impl JointKind {
    /// Single-axis joints that take one configuration entry.
    pub const fn is_actuated(self) -> bool {
        matches!(self, Self::Revolute | Self::Continuous | Self::Prismatic)
    }
}

/// Parent-link-to-joint transform as translation plus roll, pitch, yaw.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Origin {
    pub xyz: [f64; 3],
    pub rpy: [f64; 3],
}

/// Closed position interval, radians or meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionLimits {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JointDescription {
    pub name: String,
    pub kind: JointKind,
    pub parent: String,
    pub child: String,
    pub origin: Origin,
    /// Motion axis in the joint frame, not necessarily unit length.
    pub axis: [f64; 3],
    /// `None` for continuous joints and joints declared without a range.
    pub limits: Option<PositionLimits>,
}

/// Links and joints of one robot, checked to form a rooted tree.
///
/// Joints keep their declaration order; [`children_of`](Self::children_of)
/// yields them sorted by name so that traversals do not depend on how the
/// file happens to be ordered.
#[derive(Debug, Clone)]
pub struct RobotDescription {
    name: String,
    root: String,
    links: Vec<String>,
    joints: Vec<JointDescription>,
    children: HashMap<String, Vec<usize>>,
}

impl RobotDescription {
    /// Validate and index a set of links and joints.
    ///
    /// # Errors
    ///
    /// Duplicate names, joints referencing undeclared links, links with more
    /// than one parent, inverted limits, and anything other than exactly one
    /// parentless link.
    pub fn new(
        name: impl Into<String>,
        links: Vec<String>,
        joints: Vec<JointDescription>,
    ) -> Result<Self, UrdfError> {
        let mut declared = HashSet::new();
        for link in &links {
            if !declared.insert(link.as_str()) {
                return Err(UrdfError::DuplicateLink(link.clone()));
            }
        }

        let mut joint_names = HashSet::new();
        let mut parented = HashSet::new();
        for joint in &joints {
            if !joint_names.insert(joint.name.as_str()) {
                return Err(UrdfError::DuplicateJoint(joint.name.clone()));
            }
            for link in [&joint.parent, &joint.child] {
                if !declared.contains(link.as_str()) {
                    return Err(UrdfError::UnknownLink {
                        joint: joint.name.clone(),
                        link: link.clone(),
                    });
                }
            }
            if !parented.insert(joint.child.as_str()) {
                return Err(UrdfError::MultipleParents(joint.child.clone()));
            }
            if let Some(limits) = joint.limits.filter(|l| l.lower > l.upper) {
                return Err(UrdfError::InvalidLimits {
                    joint: joint.name.clone(),
                    lower: limits.lower,
                    upper: limits.upper,
                });
            }
        }

        let mut roots: Vec<&String> = links
            .iter()
            .filter(|link| !parented.contains(link.as_str()))
            .collect();
        let root = match roots.len() {
            0 => return Err(UrdfError::NoRoot),
            1 => roots[0].clone(),
            _ => {
                roots.sort_unstable();
                return Err(UrdfError::MultipleRoots(roots.into_iter().cloned().collect()));
            }
        };

        let mut children: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, joint) in joints.iter().enumerate() {
            children.entry(joint.parent.clone()).or_default().push(index);
        }
        for indices in children.values_mut() {
            indices.sort_unstable_by(|&a, &b| joints[a].name.cmp(&joints[b].name));
        }

        Ok(Self {
            name: name.into(),
            root,
            links,
            joints,
            children,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The only link without a parent joint.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Link names in declaration order.
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Joints in declaration order.
    pub fn joints(&self) -> &[JointDescription] {
        &self.joints
    }

    pub fn joint(&self, name: &str) -> Option<&JointDescription> {
        self.joints.iter().find(|joint| joint.name == name)
    }

    pub fn has_link(&self, name: &str) -> bool {
        self.links.iter().any(|link| link == name)
    }

    /// Joints whose parent is `link`, by joint name.
    pub fn children_of<'a>(
        &'a self,
        link: &str,
    ) -> impl DoubleEndedIterator<Item = &'a JointDescription> + use<'a> {
        self.children
            .get(link)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|&index| &self.joints[index])
    }

    /// Number of actuated joints anywhere in the tree.
    pub fn dof(&self) -> usize {
        self.joints.iter().filter(|joint| joint.kind.is_actuated()).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
