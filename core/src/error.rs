//! Error taxonomy shared by both CLI binaries.
//!
//! Every failure path in this crate resolves to one of these kinds before it
//! reaches `main`, so the exit code is always a function of the error alone.

use thiserror::Error;

/// The distinguishable failure categories a command can end in.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration file or a CLI flag could not be interpreted.
    #[error("configuration error: {0}")]
    Config(String),

    /// The service could not be reached (and could not be started, or the
    /// bring-up deadline elapsed).
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// The service requires credentials that were not supplied.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The command was invoked with missing or malformed arguments.
    #[error("usage error: {0}")]
    Usage(String),

    /// A service call failed after the connection was established.
    #[error("transport error: {0}")]
    Transport(String),

    /// The job reached a terminal error status reported by the service.
    #[error("job ended in error status: {0}")]
    State(String),

    /// A local filesystem operation failed (payload, results, last id).
    #[error("local I/O error: {0}")]
    LocalIo(String),
}

impl PipelineError {
    /// The process exit code this error should produce.
    ///
    /// 0 is never returned here; success has no `PipelineError` value.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Usage(_) => 2,
            _ => 1,
        }
    }
}

/// Walk an [`anyhow::Error`]'s cause chain looking for a [`PipelineError`].
///
/// Command handlers return `anyhow::Result`, which keeps the rich context
/// chain `main` prints; this recovers the typed kind so the exit code can
/// still be computed from it.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(pe) = cause.downcast_ref::<PipelineError>() {
            return pe.exit_code();
        }
    }
    1
}
