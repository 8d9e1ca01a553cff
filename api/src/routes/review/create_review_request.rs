use review_engine::CreateReviewInput;
use review_store::Category;
use serde::Deserialize;

/// Request body for submitting a proposal or a revision.
///
/// A present `review_id` makes this a revision of that review, which must be
/// sitting in `changes_requested`.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    /// One-line summary of the proposal.
    pub intent: String,
    /// Submitting agent type, e.g. "gsd-executor".
    pub agent_type: String,
    /// "proposer" or "reviewer".
    pub agent_role: String,
    /// Workflow phase label.
    pub phase: String,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub description: Option<String>,
    /// Unified diff covering the proposed change; may span many files.
    #[serde(default)]
    pub diff: Option<String>,
    #[serde(default)]
    pub review_id: Option<String>,
    /// Store the diff without a dry-run apply (post-commit diffs whose
    /// "before" state is already gone from the working tree).
    #[serde(default)]
    pub skip_diff_validation: bool,
}

impl From<CreateReviewRequest> for CreateReviewInput {
    fn from(r: CreateReviewRequest) -> Self {
        CreateReviewInput {
            intent: r.intent,
            agent_type: r.agent_type,
            agent_role: r.agent_role,
            phase: r.phase,
            plan: r.plan,
            task: r.task,
            project: r.project,
            category: r.category,
            description: r.description,
            diff: r.diff,
            review_id: r.review_id,
            skip_diff_validation: r.skip_diff_validation,
        }
    }
}
