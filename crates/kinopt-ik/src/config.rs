use std::path::Path;

use serde::{Deserialize, Serialize};

use kinopt_nlp::SolverOptions;

use crate::constraint::CouplingConfig;
use crate::cost::CostWeights;
use crate::error::ConfigError;
use crate::variables::BoundPolicy;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_position_tolerance() -> f64 {
    1e-3
}
const fn default_orientation_tolerance() -> f64 {
    1e-2
}

// ---------------------------------------------------------------------------
// PoseTolerance
// ---------------------------------------------------------------------------

/// How close the final pose must be for a solve to count as converged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseTolerance {
    /// Translation error in meters (default: 1e-3).
    #[serde(default = "default_position_tolerance")]
    pub position: f64,
    /// Rotation angle in radians (default: 1e-2).
    #[serde(default = "default_orientation_tolerance")]
    pub orientation: f64,
}

impl Default for PoseTolerance {
    fn default() -> Self {
        Self {
            position: default_position_tolerance(),
            orientation: default_orientation_tolerance(),
        }
    }
}

// ---------------------------------------------------------------------------
// IkConfig
// ---------------------------------------------------------------------------

/// Everything an IK solve can be tuned with.
///
/// Every section is optional in TOML:
///
/// ```toml
/// [solver]
/// max_iterations = 500
///
/// [weights]
/// orientation = 20.0
///
/// [bounds]
/// policy = "joint_limits"
///
/// [[couplings]]
/// leader = "finger_left"
/// follower = "finger_right"
/// ratio = -1.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IkConfig {
    #[serde(default)]
    pub solver: SolverOptions,
    #[serde(default)]
    pub weights: CostWeights,
    #[serde(default)]
    pub bounds: BoundPolicy,
    #[serde(default)]
    pub pose_tolerance: PoseTolerance,
    #[serde(default)]
    pub couplings: Vec<CouplingConfig>,
}

impl IkConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.solver
            .validate()
            .map_err(|e| ConfigError::invalid("solver", e.to_string()))?;

        for (field, value) in [
            ("weights.position", self.weights.position),
            ("weights.regularization", self.weights.regularization),
            ("weights.orientation", self.weights.orientation),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be finite and >= 0, got {value}"),
                ));
            }
        }

        if let BoundPolicy::Uniform { lower, upper } = self.bounds {
            if lower.is_nan() || upper.is_nan() || lower > upper {
                return Err(ConfigError::invalid(
                    "bounds",
                    format!("lower ({lower}) must not exceed upper ({upper})"),
                ));
            }
        }

        for (field, value) in [
            ("pose_tolerance.position", self.pose_tolerance.position),
            ("pose_tolerance.orientation", self.pose_tolerance.orientation),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::invalid(field, format!("must be > 0, got {value}")));
            }
        }

        for coupling in &self.couplings {
            if !coupling.ratio.is_finite() || !coupling.offset.is_finite() {
                return Err(ConfigError::invalid(
                    "couplings",
                    format!(
                        "ratio and offset of '{}' -> '{}' must be finite",
                        coupling.leader, coupling.follower
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
