//! Persisted entities and their closed vocabularies.
//!
//! Enums round-trip to TEXT columns via `as_str`/`parse`; structs are plain
//! value records with one-way foreign keys to the review (no object graphs).

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

/// Review lifecycle state. Transitions are guarded by [`crate::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Claimed,
    InReview,
    Approved,
    ChangesRequested,
    Closed,
}

impl ReviewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Claimed => "claimed",
            ReviewStatus::InReview => "in_review",
            ReviewStatus::Approved => "approved",
            ReviewStatus::ChangesRequested => "changes_requested",
            ReviewStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "pending" => ReviewStatus::Pending,
            "claimed" => ReviewStatus::Claimed,
            "in_review" => ReviewStatus::InReview,
            "approved" => ReviewStatus::Approved,
            "changes_requested" => ReviewStatus::ChangesRequested,
            "closed" => ReviewStatus::Closed,
            _ => return None,
        })
    }
}

/// Review priority tier, frozen at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    Normal,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "critical" => Priority::Critical,
            "normal" => Priority::Normal,
            "low" => Priority::Low,
            _ => return None,
        })
    }
}

/// What kind of proposal this review carries; drives reviewer filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    PlanReview,
    CodeChange,
    Verification,
    Handoff,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::PlanReview => "plan_review",
            Category::CodeChange => "code_change",
            Category::Verification => "verification",
            Category::Handoff => "handoff",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "plan_review" => Category::PlanReview,
            "code_change" => Category::CodeChange,
            "verification" => Category::Verification,
            "handoff" => Category::Handoff,
            _ => return None,
        })
    }
}

/// Which side of the protocol a discussion message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    Proposer,
    Reviewer,
}

impl SenderRole {
    pub fn as_str(self) -> &'static str {
        match self {
            SenderRole::Proposer => "proposer",
            SenderRole::Reviewer => "reviewer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "proposer" => SenderRole::Proposer,
            "reviewer" => SenderRole::Reviewer,
            _ => return None,
        })
    }
}

/// Lifecycle of a reviewer-supplied counter-patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterPatchStatus {
    Pending,
    Accepted,
    Rejected,
}

impl CounterPatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CounterPatchStatus::Pending => "pending",
            CounterPatchStatus::Accepted => "accepted",
            CounterPatchStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "pending" => CounterPatchStatus::Pending,
            "accepted" => CounterPatchStatus::Accepted,
            "rejected" => CounterPatchStatus::Rejected,
            _ => return None,
        })
    }
}

/// Audit event kind. The audit table is append-only; these are the only
/// event types it ever contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ReviewCreated,
    RevisionCreated,
    Claimed,
    AutoRejected,
    VerdictSubmitted,
    Closed,
    CounterPatchSubmitted,
    CounterPatchAccepted,
    CounterPatchRejected,
    MessageAdded,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::ReviewCreated => "review_created",
            EventType::RevisionCreated => "revision_created",
            EventType::Claimed => "claimed",
            EventType::AutoRejected => "auto_rejected",
            EventType::VerdictSubmitted => "verdict_submitted",
            EventType::Closed => "closed",
            EventType::CounterPatchSubmitted => "counter_patch_submitted",
            EventType::CounterPatchAccepted => "counter_patch_accepted",
            EventType::CounterPatchRejected => "counter_patch_rejected",
            EventType::MessageAdded => "message_added",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "review_created" => EventType::ReviewCreated,
            "revision_created" => EventType::RevisionCreated,
            "claimed" => EventType::Claimed,
            "auto_rejected" => EventType::AutoRejected,
            "verdict_submitted" => EventType::VerdictSubmitted,
            "closed" => EventType::Closed,
            "counter_patch_submitted" => EventType::CounterPatchSubmitted,
            "counter_patch_accepted" => EventType::CounterPatchAccepted,
            "counter_patch_rejected" => EventType::CounterPatchRejected,
            "message_added" => EventType::MessageAdded,
            _ => return None,
        })
    }
}

// SQLite bindings: every vocabulary is a TEXT column.

macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(self.as_str().into())
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let s = value.as_str()?;
                <$ty>::parse(s).ok_or_else(|| {
                    FromSqlError::Other(format!("unknown {}: {s}", stringify!($ty)).into())
                })
            }
        }
    };
}

sql_text_enum!(ReviewStatus);
sql_text_enum!(Priority);
sql_text_enum!(Category);
sql_text_enum!(SenderRole);
sql_text_enum!(CounterPatchStatus);
sql_text_enum!(EventType);

/// The primary entity: one (intent, proposed change, discussion, verdict)
/// tuple with identity and lifecycle.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: String,
    pub status: ReviewStatus,
    pub intent: String,
    pub description: Option<String>,
    pub diff: Option<String>,
    pub affected_files: Vec<String>,
    pub skip_diff_validation: bool,
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
    pub verdict_reason: Option<String>,
    pub counter_patch: Option<String>,
    pub counter_patch_affected_files: Option<Vec<String>>,
    pub counter_patch_status: Option<CounterPatchStatus>,
    pub created_at: String,
    pub updated_at: String,
}

/// One discussion entry. `id` is the insertion-order rank; `created_at` is
/// display-only and may tie under sub-second inserts.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: i64,
    pub review_id: String,
    pub sender_role: SenderRole,
    pub round: i64,
    pub body: String,
    pub metadata: Option<String>,
    pub created_at: String,
}

/// One append-only audit record. Never mutated, never deleted.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub id: i64,
    pub review_id: String,
    pub event_type: EventType,
    pub actor: String,
    pub metadata: serde_json::Value,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for s in [
            ReviewStatus::Pending,
            ReviewStatus::Claimed,
            ReviewStatus::InReview,
            ReviewStatus::Approved,
            ReviewStatus::ChangesRequested,
            ReviewStatus::Closed,
        ] {
            assert_eq!(ReviewStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(ReviewStatus::parse("auto_rejected"), None);
    }

    #[test]
    fn event_type_round_trips() {
        for e in [
            EventType::ReviewCreated,
            EventType::RevisionCreated,
            EventType::Claimed,
            EventType::AutoRejected,
            EventType::VerdictSubmitted,
            EventType::Closed,
            EventType::CounterPatchSubmitted,
            EventType::CounterPatchAccepted,
            EventType::CounterPatchRejected,
            EventType::MessageAdded,
        ] {
            assert_eq!(EventType::parse(e.as_str()), Some(e));
        }
    }
}
