//! Wire-facing result shapes.
//!
//! Everything here serializes straight into the response envelope. Large
//! text bodies (diff, description, counter-patch) appear only in the
//! proposal view; listings stay compact so dashboards and queue polls do
//! not drag megabytes of diff around.

use std::collections::BTreeMap;

use review_store::audit::AuditStats;
use review_store::reviews::FeedEntry;
use review_store::{AuditEvent, Category, CounterPatchStatus, Priority, Review, ReviewStatus};
use serde::Serialize;

/// Compact review row for listings and the activity feed.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewSummary {
    pub id: String,
    pub status: ReviewStatus,
    pub intent: String,
    pub agent_type: String,
    pub agent_role: String,
    pub phase: String,
    pub plan: Option<String>,
    pub task: Option<String>,
    pub project: String,
    pub category: Option<Category>,
    pub priority: Priority,
    pub current_round: i64,
    pub claimed_by: Option<String>,
    pub claim_generation: i64,
    pub counter_patch_status: Option<CounterPatchStatus>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Review> for ReviewSummary {
    fn from(r: &Review) -> Self {
        Self {
            id: r.id.clone(),
            status: r.status,
            intent: r.intent.clone(),
            agent_type: r.agent_type.clone(),
            agent_role: r.agent_role.clone(),
            phase: r.phase.clone(),
            plan: r.plan.clone(),
            task: r.task.clone(),
            project: r.project.clone(),
            category: r.category,
            priority: r.priority,
            current_round: r.current_round,
            claimed_by: r.claimed_by.clone(),
            claim_generation: r.claim_generation,
            counter_patch_status: r.counter_patch_status,
            created_at: r.created_at.clone(),
            updated_at: r.updated_at.clone(),
        }
    }
}

/// Full status row: every scalar plus affected files, without diff bodies.
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    #[serde(flatten)]
    pub summary: ReviewSummary,
    pub affected_files: Vec<String>,
    pub skip_diff_validation: bool,
    pub verdict_reason: Option<String>,
}

impl From<&Review> for StatusView {
    fn from(r: &Review) -> Self {
        Self {
            summary: ReviewSummary::from(r),
            affected_files: r.affected_files.clone(),
            skip_diff_validation: r.skip_diff_validation,
            verdict_reason: r.verdict_reason.clone(),
        }
    }
}

/// Everything, including the proposal and counter-patch bodies.
#[derive(Debug, Clone, Serialize)]
pub struct ProposalView {
    #[serde(flatten)]
    pub status: StatusView,
    pub description: Option<String>,
    pub diff: Option<String>,
    pub counter_patch: Option<String>,
    pub counter_patch_affected_files: Option<Vec<String>>,
}

impl From<&Review> for ProposalView {
    fn from(r: &Review) -> Self {
        Self {
            status: StatusView::from(r),
            description: r.description.clone(),
            diff: r.diff.clone(),
            counter_patch: r.counter_patch.clone(),
            counter_patch_affected_files: r.counter_patch_affected_files.clone(),
        }
    }
}

/// One discussion message with parsed metadata.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: i64,
    pub sender_role: review_store::SenderRole,
    pub round: i64,
    pub body: String,
    /// Parsed metadata; `null` when absent or malformed.
    pub metadata: Option<serde_json::Value>,
    /// True when metadata was present but not valid JSON.
    pub metadata_warning: bool,
    pub created_at: String,
}

/// Result of `get_discussion`.
#[derive(Debug, Clone, Serialize)]
pub struct DiscussionView {
    pub review_id: String,
    pub count: usize,
    pub messages: Vec<MessageView>,
}

/// Result of `list_reviews`.
#[derive(Debug, Clone, Serialize)]
pub struct ListView {
    pub count: usize,
    pub reviews: Vec<ReviewSummary>,
}

/// One activity-feed entry.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    #[serde(flatten)]
    pub review: ReviewSummary,
    pub last_message: Option<String>,
    pub message_count: i64,
}

impl From<FeedEntry> for FeedItem {
    fn from(e: FeedEntry) -> Self {
        Self {
            review: ReviewSummary::from(&e.review),
            last_message: e.last_message,
            message_count: e.message_count,
        }
    }
}

/// Result of `get_review_stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsView {
    pub counts_by_status: BTreeMap<String, i64>,
    pub counts_by_category: BTreeMap<String, i64>,
    pub counts_by_priority: BTreeMap<String, i64>,
    pub total_verdicts: i64,
    pub approved_verdicts: i64,
    pub approval_rate: Option<f64>,
    pub avg_secs_to_verdict: Option<f64>,
    pub avg_secs_in_state: BTreeMap<String, f64>,
}

impl StatsView {
    pub fn from_parts(
        by_status: Vec<(String, i64)>,
        by_category: Vec<(String, i64)>,
        by_priority: Vec<(String, i64)>,
        audit: AuditStats,
    ) -> Self {
        Self {
            counts_by_status: by_status.into_iter().collect(),
            counts_by_category: by_category.into_iter().collect(),
            counts_by_priority: by_priority.into_iter().collect(),
            total_verdicts: audit.total_verdicts,
            approved_verdicts: audit.approved_verdicts,
            approval_rate: audit.approval_rate,
            avg_secs_to_verdict: audit.avg_secs_to_verdict,
            avg_secs_in_state: audit.avg_secs_in_state,
        }
    }
}

/// Result of `get_review_timeline` / `get_audit_log`.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineView {
    pub review_id: Option<String>,
    pub count: usize,
    pub events: Vec<AuditEvent>,
}

/// Compact snapshot for dashboard pushes; idempotent to re-render.
#[derive(Debug, Clone, Serialize)]
pub struct OverviewSnapshot {
    pub counts_by_status: BTreeMap<String, i64>,
    pub recent: Vec<FeedItem>,
}

// Verb outcomes.

#[derive(Debug, Clone, Serialize)]
pub struct CreateReviewOut {
    pub review_id: String,
    pub status: ReviewStatus,
    pub current_round: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClaimOut {
    pub review_id: String,
    pub status: ReviewStatus,
    pub claim_generation: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerdictOut {
    pub review_id: String,
    pub status: ReviewStatus,
    pub counter_patch_status: Option<CounterPatchStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CounterPatchOut {
    pub review_id: String,
    pub status: ReviewStatus,
    pub counter_patch_status: Option<CounterPatchStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloseOut {
    pub review_id: String,
    pub status: ReviewStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageOut {
    pub review_id: String,
    pub message_id: i64,
    pub round: i64,
}
