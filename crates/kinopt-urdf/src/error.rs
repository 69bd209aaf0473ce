use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UrdfError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed URDF: {0}")]
    Parse(String),

    #[error("Link {0} is declared twice")]
    DuplicateLink(String),

    #[error("Joint {0} is declared twice")]
    DuplicateJoint(String),

    #[error("Joint {joint} references undeclared link {link}")]
    UnknownLink { joint: String, link: String },

    #[error("Link {0} is the child of more than one joint")]
    MultipleParents(String),

    #[error("Every link has a parent joint; no root link")]
    NoRoot,

    #[error("Several parentless links: {}", .0.join(", "))]
    MultipleRoots(Vec<String>),

    #[error("Joint {joint} has lower limit {lower} above upper limit {upper}")]
    InvalidLimits { joint: String, lower: f64, upper: f64 },
}
