//! Shared test fixtures and utilities for kinopt crates.
//!
//! Provides URDF fixtures, deterministic RNG setup and a central
//! finite-difference helper for checking analytic derivatives.

pub mod finite_diff;
pub mod fixtures;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use finite_diff::central_difference;
pub use rng::{random_configuration, seeded_rng};
