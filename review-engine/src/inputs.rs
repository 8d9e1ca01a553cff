//! Typed verb inputs, assembled by the transport layer.

use review_store::{Category, SenderRole};

/// Input for `create_review`: both fresh submissions and revisions
/// (a revision carries the parent's `review_id`).
#[derive(Debug, Clone, Default)]
pub struct CreateReviewInput {
    pub intent: String,
    pub agent_type: String,
    pub agent_role: String,
    pub phase: String,
    pub plan: Option<String>,
    pub task: Option<String>,
    pub project: Option<String>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub diff: Option<String>,
    pub review_id: Option<String>,
    pub skip_diff_validation: bool,
}

/// Reviewer verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    ChangesRequested,
    Comment,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Approved => "approved",
            Verdict::ChangesRequested => "changes_requested",
            Verdict::Comment => "comment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "approved" => Verdict::Approved,
            "changes_requested" => Verdict::ChangesRequested,
            "comment" => Verdict::Comment,
            _ => return None,
        })
    }
}

/// Input for `submit_verdict`.
#[derive(Debug, Clone)]
pub struct VerdictInput {
    pub review_id: String,
    pub verdict: Verdict,
    pub notes: Option<String>,
    pub counter_patch: Option<String>,
    pub claim_generation: i64,
}

/// Input for `add_message`.
#[derive(Debug, Clone)]
pub struct MessageInput {
    pub review_id: String,
    pub sender_role: SenderRole,
    pub body: String,
    /// Opaque JSON blob; stored verbatim, parsed only on read.
    pub metadata: Option<String>,
}
