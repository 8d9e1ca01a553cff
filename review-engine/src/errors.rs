//! Broker error taxonomy.
//!
//! Every variant has a stable snake_case wire code; handlers put that code in
//! the response envelope so no exception ever crosses the RPC boundary.
//! Validation failures are deliberately not audit events.

use review_store::state::InvalidTransition;
use review_store::StoreError;
use thiserror::Error;

/// Convenient alias for engine results.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Root error type for verb execution.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Unknown review id.
    #[error("review not found")]
    NotFound,

    /// The state machine rejected the requested move.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// A verb precondition on status failed (e.g. revision of a review that
    /// is not in changes_requested).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Dry-run apply failed at submission time.
    #[error("diff validation failed: {0}")]
    DiffValidationFailed(String),

    /// Dry-run apply failed at claim time; the review was auto-rejected.
    #[error("diff no longer applies: {0}")]
    DiffConflict(String),

    /// Counter-patch failed validation at verdict submission.
    #[error("counter-patch validation failed: {0}")]
    CounterPatchValidationFailed(String),

    /// Stored counter-patch no longer applies at acceptance time.
    #[error("counter-patch no longer applies: {0}")]
    StaleCounterPatch(String),

    /// Counter-patch attached to an approving verdict.
    #[error("a counter-patch cannot accompany an approved verdict")]
    CounterPatchNotAllowed,

    /// Accept/reject with nothing pending.
    #[error("no pending counter-patch")]
    NoPendingCounterPatch,

    /// Two consecutive discussion messages from the same role.
    #[error("turn violation: {0}")]
    TurnViolation(String),

    /// Verdict carried a claim generation that is no longer current.
    #[error("stale claim generation: supplied {supplied}, current {current}")]
    StaleClaimGeneration { supplied: i64, current: i64 },

    /// Input-shape problem the type system could not catch.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The diff utility itself failed (spawn error or timeout), as distinct
    /// from a patch that merely does not apply.
    #[error("diff tool failure: {0}")]
    ToolFailure(String),

    /// Store-layer failure; the transaction was rolled back.
    #[error("db error: {0}")]
    Db(#[from] StoreError),
}

impl BrokerError {
    /// Stable machine-readable code for the wire envelope.
    pub fn code(&self) -> &'static str {
        match self {
            BrokerError::NotFound => "not_found",
            BrokerError::InvalidTransition(_) => "invalid_transition",
            BrokerError::InvalidState(_) => "invalid_state",
            BrokerError::DiffValidationFailed(_) => "diff_validation_failed",
            BrokerError::DiffConflict(_) => "diff_conflict",
            BrokerError::CounterPatchValidationFailed(_) => "counter_patch_validation_failed",
            BrokerError::StaleCounterPatch(_) => "stale_counter_patch",
            BrokerError::CounterPatchNotAllowed => "counter_patch_not_allowed",
            BrokerError::NoPendingCounterPatch => "no_pending_counter_patch",
            BrokerError::TurnViolation(_) => "turn_violation",
            BrokerError::StaleClaimGeneration { .. } => "stale_claim_generation",
            BrokerError::BadRequest(_) => "bad_request",
            BrokerError::ToolFailure(_) => "tool_failure",
            BrokerError::Db(_) => "db_error",
        }
    }
}
