use serde::Deserialize;

/// Request body for a reviewer verdict.
#[derive(Debug, Deserialize)]
pub struct SubmitVerdictRequest {
    pub review_id: String,
    /// "approved", "changes_requested" or "comment".
    pub verdict: String,
    /// Required for every non-approved verdict.
    #[serde(default)]
    pub notes: Option<String>,
    /// Alternative diff; only valid with "changes_requested" or "comment".
    #[serde(default)]
    pub counter_patch: Option<String>,
    /// Token from the claim; a mismatch means someone re-claimed since.
    pub claim_generation: i64,
}
