//! Tracing subscriber setup for the binary.

use tracing::Level;

/// Install the global subscriber at INFO, overridable via `RUST_LOG`
/// (e.g. `RUST_LOG=kinopt_nlp=debug` to trace SQP iterations).
pub fn init_logger() {
    init_logger_with_level(Level::INFO);
}

pub fn init_logger_with_level(default_level: Level) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
