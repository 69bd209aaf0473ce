//! Error types for problem assembly and solver configuration.

/// Errors raised while building a problem or configuring a solver.
///
/// Numerical failures during a solve are not errors; they are reported in
/// [`SolveStatus`](crate::SolveStatus).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NlpError {
    /// Two components of the same kind share a name.
    #[error("duplicate component name: {0}")]
    DuplicateName(String),

    /// A component referred to a variable set that is not registered.
    #[error("unknown variable set: {0}")]
    UnknownVariableSet(String),

    /// The problem has no variables to optimize.
    #[error("problem has no variables")]
    EmptyProblem,

    /// Solver options failed validation.
    #[error("invalid solver options: {0}")]
    InvalidOptions(String),
}
