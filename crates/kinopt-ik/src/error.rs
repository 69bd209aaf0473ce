use thiserror::Error;

/// Top-level error type for kinopt-ik.
///
/// Only construction-time contract violations are errors. A solve that ends
/// without convergence still returns an [`IkSolution`](crate::IkSolution)
/// carrying its status.
#[derive(Debug, Error)]
pub enum IkError {
    #[error("Initial configuration has {got} entries, model has {expected} degrees of freedom")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URDF error: {0}")]
    Urdf(#[from] kinopt_urdf::UrdfError),

    #[error("Solver error: {0}")]
    Nlp(#[from] kinopt_nlp::NlpError),
}

/// Kinematic model construction and lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Unknown link: {0}")]
    UnknownLink(String),

    #[error("Joint {joint} has unsupported type {kind}")]
    UnsupportedJoint { joint: String, kind: String },

    #[error("Link {0} is not reachable from the root link")]
    Disconnected(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}
