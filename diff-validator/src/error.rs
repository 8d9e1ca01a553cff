//! Validator error hierarchy.

use thiserror::Error;

/// Convenient alias for validator results.
pub type DiffResult<T> = Result<T, DiffError>;

/// Why a dry-run apply failed.
#[derive(Debug, Error)]
pub enum DiffError {
    /// The diff does not apply cleanly. `stderr` is the tool's (truncated)
    /// complaint, good enough to locate the conflicting hunk.
    #[error("diff does not apply: {stderr}")]
    Conflict { stderr: String },

    /// The diff utility could not be spawned or its channels broke.
    #[error("failed to run diff utility: {0}")]
    Spawn(#[from] std::io::Error),

    /// The dry run exceeded its time budget.
    #[error("diff dry-run timed out after {secs}s")]
    Timeout { secs: u64 },
}
