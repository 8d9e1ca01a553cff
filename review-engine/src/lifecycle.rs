//! Write verbs: create/revise, claim, verdict, counter-patch, close.
//!
//! Each verb is one `BEGIN IMMEDIATE` transaction: fetch → pure validation →
//! mutate → audit append → commit, with the waiter signal fired only after
//! the commit. A dry-run apply inside the transaction is the one suspension
//! point that holds the write lock across an await; that is intentional:
//! claim-time validation must see the same row it is about to move.

use diff_validator::{affected_files, DiffError};
use review_store::state::InvalidTransition;
use review_store::{
    audit, infer_priority, reviews, time, validate_transition, CounterPatchStatus, EventType,
    Review, ReviewStatus,
};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::broker::Broker;
use crate::errors::{BrokerError, BrokerResult};
use crate::inputs::{CreateReviewInput, Verdict, VerdictInput};
use crate::views::{ClaimOut, CloseOut, CounterPatchOut, CreateReviewOut, VerdictOut};

/// A patch conflict maps to the given error kind; tool breakage (spawn
/// failure, timeout) is never a conflict.
fn diff_failure(e: DiffError, conflict: impl FnOnce(String) -> BrokerError) -> BrokerError {
    match e {
        DiffError::Conflict { stderr } => conflict(stderr),
        other => BrokerError::ToolFailure(other.to_string()),
    }
}

impl Broker {
    /// `create_review`: fresh submission, or a revision when `review_id`
    /// names an existing review in `changes_requested`.
    pub async fn create_review(&self, input: CreateReviewInput) -> BrokerResult<CreateReviewOut> {
        if input.intent.trim().is_empty() {
            return Err(BrokerError::BadRequest("intent must not be empty".into()));
        }
        if input.agent_type.trim().is_empty() {
            return Err(BrokerError::BadRequest("agent_type must not be empty".into()));
        }
        if input.phase.trim().is_empty() {
            return Err(BrokerError::BadRequest("phase must not be empty".into()));
        }
        if !matches!(input.agent_role.as_str(), "proposer" | "reviewer") {
            return Err(BrokerError::BadRequest(
                "agent_role must be proposer or reviewer".into(),
            ));
        }

        match input.review_id.clone() {
            Some(parent) => self.revise(&parent, input).await,
            None => self.create_new(input).await,
        }
    }

    async fn create_new(&self, input: CreateReviewInput) -> BrokerResult<CreateReviewOut> {
        let txn = self.store().begin_write().await?;
        let now = time::now_rfc3339_ms();

        let affected = match &input.diff {
            Some(diff) => {
                let files = affected_files(diff);
                if !input.skip_diff_validation {
                    self.validator()
                        .check_apply(diff)
                        .await
                        .map_err(|e| diff_failure(e, BrokerError::DiffValidationFailed))?;
                }
                files
            }
            None => Vec::new(),
        };

        let priority = infer_priority(&input.agent_type, &input.phase, input.task.as_deref());
        let project = input
            .project
            .clone()
            .unwrap_or_else(|| self.validator().worktree().display().to_string());

        let review = Review {
            id: Uuid::new_v4().to_string(),
            status: ReviewStatus::Pending,
            intent: input.intent,
            description: input.description,
            diff: input.diff,
            affected_files: affected,
            skip_diff_validation: input.skip_diff_validation,
            agent_type: input.agent_type,
            agent_role: input.agent_role,
            phase: input.phase,
            plan: input.plan,
            task: input.task,
            project,
            category: input.category,
            priority,
            current_round: 1,
            claimed_by: None,
            claim_generation: 0,
            verdict_reason: None,
            counter_patch: None,
            counter_patch_affected_files: None,
            counter_patch_status: None,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        reviews::insert(&txn, &review)?;
        audit::append(
            &txn,
            &review.id,
            EventType::ReviewCreated,
            &review.agent_role,
            &json!({
                "status": "pending",
                "category": review.category,
                "priority": review.priority,
                "project": review.project.clone(),
                "round": 1,
            }),
            &now,
        )?;
        txn.commit()?;
        self.signals().emit(&review.id);

        info!(review_id = %review.id, priority = priority.as_str(), "review created");
        Ok(CreateReviewOut {
            review_id: review.id,
            status: ReviewStatus::Pending,
            current_round: 1,
        })
    }

    async fn revise(
        &self,
        parent_id: &str,
        input: CreateReviewInput,
    ) -> BrokerResult<CreateReviewOut> {
        let txn = self.store().begin_write().await?;
        let mut review = Self::fetch(&txn, parent_id)?;

        if review.status != ReviewStatus::ChangesRequested {
            return Err(BrokerError::InvalidState(format!(
                "revision requires changes_requested, review is {}",
                review.status.as_str()
            )));
        }
        validate_transition(review.status, ReviewStatus::Pending)?;

        let affected = match &input.diff {
            Some(diff) => {
                let files = affected_files(diff);
                if !input.skip_diff_validation {
                    self.validator()
                        .check_apply(diff)
                        .await
                        .map_err(|e| diff_failure(e, BrokerError::DiffValidationFailed))?;
                }
                files
            }
            None => Vec::new(),
        };

        let now = time::now_rfc3339_ms();
        review.current_round += 1;
        review.status = ReviewStatus::Pending;
        review.claimed_by = None;
        review.counter_patch = None;
        review.counter_patch_affected_files = None;
        review.counter_patch_status = None;
        review.intent = input.intent;
        review.description = input.description;
        review.diff = input.diff;
        review.affected_files = affected;
        review.skip_diff_validation = input.skip_diff_validation;
        review.updated_at = now.clone();
        // claim_generation deliberately untouched: the next successful claim
        // increments it.

        reviews::update(&txn, &review)?;
        audit::append(
            &txn,
            parent_id,
            EventType::RevisionCreated,
            &review.agent_role,
            &json!({ "status": "pending", "round": review.current_round }),
            &now,
        )?;
        txn.commit()?;
        self.signals().emit(parent_id);

        info!(review_id = parent_id, round = review.current_round, "revision created");
        Ok(CreateReviewOut {
            review_id: parent_id.to_string(),
            status: ReviewStatus::Pending,
            current_round: review.current_round,
        })
    }

    /// `claim_review`: at-most-one claim per pending review. A diff that no
    /// longer applies auto-rejects the review into `changes_requested` with
    /// the tool's stderr as the verdict reason.
    pub async fn claim_review(&self, review_id: &str, reviewer_id: &str) -> BrokerResult<ClaimOut> {
        if reviewer_id.trim().is_empty() {
            return Err(BrokerError::BadRequest("reviewer_id must not be empty".into()));
        }

        let txn = self.store().begin_write().await?;
        let mut review = Self::fetch(&txn, review_id)?;
        validate_transition(review.status, ReviewStatus::Claimed)?;
        let now = time::now_rfc3339_ms();

        if !review.skip_diff_validation {
            if let Some(diff) = review.diff.clone() {
                if let Err(e) = self.validator().check_apply(&diff).await {
                    let stderr = match e {
                        DiffError::Conflict { stderr } => stderr,
                        other => return Err(BrokerError::ToolFailure(other.to_string())),
                    };
                    review.status = ReviewStatus::ChangesRequested;
                    review.verdict_reason = Some(stderr.clone());
                    review.updated_at = now.clone();
                    reviews::update(&txn, &review)?;
                    audit::append(
                        &txn,
                        review_id,
                        EventType::AutoRejected,
                        reviewer_id,
                        &json!({ "status": "changes_requested", "reviewer_id": reviewer_id }),
                        &now,
                    )?;
                    txn.commit()?;
                    self.signals().emit(review_id);
                    warn!(review_id, reviewer_id, "claim auto-rejected, diff is stale");
                    return Err(BrokerError::DiffConflict(stderr));
                }
            }
        }

        // Conditional update in addition to the write lock.
        if !reviews::claim_pending(&txn, review_id, reviewer_id, &now)? {
            return Err(BrokerError::InvalidTransition(InvalidTransition {
                from: review.status,
                to: ReviewStatus::Claimed,
            }));
        }
        let claim_generation = review.claim_generation + 1;
        audit::append(
            &txn,
            review_id,
            EventType::Claimed,
            reviewer_id,
            &json!({
                "status": "claimed",
                "reviewer_id": reviewer_id,
                "claim_generation": claim_generation,
            }),
            &now,
        )?;
        txn.commit()?;
        self.signals().emit(review_id);

        debug!(review_id, reviewer_id, claim_generation, "review claimed");
        Ok(ClaimOut {
            review_id: review_id.to_string(),
            status: ReviewStatus::Claimed,
            claim_generation,
        })
    }

    /// `submit_verdict`: approved / changes_requested / comment, with an
    /// optional counter-patch on the non-approving kinds.
    pub async fn submit_verdict(&self, input: VerdictInput) -> BrokerResult<VerdictOut> {
        if input.verdict != Verdict::Approved
            && input
                .notes
                .as_deref()
                .map(|n| n.trim().is_empty())
                .unwrap_or(true)
        {
            return Err(BrokerError::BadRequest(format!(
                "notes are required for a {} verdict",
                input.verdict.as_str()
            )));
        }
        if input.verdict == Verdict::Approved && input.counter_patch.is_some() {
            return Err(BrokerError::CounterPatchNotAllowed);
        }

        let txn = self.store().begin_write().await?;
        let mut review = Self::fetch(&txn, &input.review_id)?;

        if !matches!(
            review.status,
            ReviewStatus::Claimed | ReviewStatus::InReview
        ) {
            return Err(BrokerError::InvalidTransition(InvalidTransition {
                from: review.status,
                to: match input.verdict {
                    Verdict::Approved => ReviewStatus::Approved,
                    Verdict::ChangesRequested => ReviewStatus::ChangesRequested,
                    Verdict::Comment => review.status,
                },
            }));
        }
        if input.claim_generation != review.claim_generation {
            return Err(BrokerError::StaleClaimGeneration {
                supplied: input.claim_generation,
                current: review.claim_generation,
            });
        }

        let now = time::now_rfc3339_ms();
        let actor = review.claimed_by.clone().unwrap_or_else(|| "reviewer".into());

        if let Some(cp) = &input.counter_patch {
            if !review.skip_diff_validation {
                self.validator()
                    .check_apply(cp)
                    .await
                    .map_err(|e| diff_failure(e, BrokerError::CounterPatchValidationFailed))?;
            }
            review.counter_patch = Some(cp.clone());
            review.counter_patch_affected_files = Some(affected_files(cp));
            review.counter_patch_status = Some(CounterPatchStatus::Pending);
            audit::append(
                &txn,
                &input.review_id,
                EventType::CounterPatchSubmitted,
                &actor,
                &json!({ "files": review.counter_patch_affected_files.clone() }),
                &now,
            )?;
        }

        let status_changed = match input.verdict {
            Verdict::Approved => {
                validate_transition(review.status, ReviewStatus::Approved)?;
                review.status = ReviewStatus::Approved;
                review.verdict_reason = input.notes.clone();
                true
            }
            Verdict::ChangesRequested => {
                validate_transition(review.status, ReviewStatus::ChangesRequested)?;
                review.status = ReviewStatus::ChangesRequested;
                review.verdict_reason = input.notes.clone();
                true
            }
            // The one verdict kind that leaves the review where it is.
            Verdict::Comment => false,
        };

        review.updated_at = now.clone();
        reviews::update(&txn, &review)?;

        let mut metadata = json!({
            "verdict": input.verdict.as_str(),
            "has_counter_patch": input.counter_patch.is_some(),
        });
        if status_changed {
            metadata["status"] = json!(review.status.as_str());
        }
        audit::append(
            &txn,
            &input.review_id,
            EventType::VerdictSubmitted,
            &actor,
            &metadata,
            &now,
        )?;
        txn.commit()?;
        self.signals().emit(&input.review_id);

        info!(
            review_id = %input.review_id,
            verdict = input.verdict.as_str(),
            has_counter_patch = input.counter_patch.is_some(),
            "verdict submitted"
        );
        Ok(VerdictOut {
            review_id: input.review_id,
            status: review.status,
            counter_patch_status: review.counter_patch_status,
        })
    }

    /// `accept_counter_patch`: re-validates against the tree as it is *now*;
    /// a drifted tree yields `stale_counter_patch` with no row change.
    pub async fn accept_counter_patch(&self, review_id: &str) -> BrokerResult<CounterPatchOut> {
        let txn = self.store().begin_write().await?;
        let mut review = Self::fetch(&txn, review_id)?;

        if review.counter_patch_status != Some(CounterPatchStatus::Pending) {
            return Err(BrokerError::NoPendingCounterPatch);
        }
        let counter_patch = review
            .counter_patch
            .clone()
            .ok_or_else(|| BrokerError::InvalidState("pending counter-patch with no body".into()))?;

        if !review.skip_diff_validation {
            self.validator()
                .check_apply(&counter_patch)
                .await
                .map_err(|e| diff_failure(e, BrokerError::StaleCounterPatch))?;
        }

        let now = time::now_rfc3339_ms();
        review.diff = Some(counter_patch);
        review.affected_files = review
            .counter_patch_affected_files
            .take()
            .unwrap_or_default();
        review.counter_patch = None;
        review.counter_patch_status = Some(CounterPatchStatus::Accepted);
        review.updated_at = now.clone();
        reviews::update(&txn, &review)?;
        audit::append(
            &txn,
            review_id,
            EventType::CounterPatchAccepted,
            "proposer",
            &json!({}),
            &now,
        )?;
        txn.commit()?;
        self.signals().emit(review_id);

        info!(review_id, "counter-patch accepted");
        Ok(CounterPatchOut {
            review_id: review_id.to_string(),
            status: review.status,
            counter_patch_status: review.counter_patch_status,
        })
    }

    /// `reject_counter_patch`: clears the pending patch without touching the
    /// proposal.
    pub async fn reject_counter_patch(&self, review_id: &str) -> BrokerResult<CounterPatchOut> {
        let txn = self.store().begin_write().await?;
        let mut review = Self::fetch(&txn, review_id)?;

        if review.counter_patch_status != Some(CounterPatchStatus::Pending) {
            return Err(BrokerError::NoPendingCounterPatch);
        }

        let now = time::now_rfc3339_ms();
        review.counter_patch = None;
        review.counter_patch_affected_files = None;
        review.counter_patch_status = Some(CounterPatchStatus::Rejected);
        review.updated_at = now.clone();
        reviews::update(&txn, &review)?;
        audit::append(
            &txn,
            review_id,
            EventType::CounterPatchRejected,
            "proposer",
            &json!({}),
            &now,
        )?;
        txn.commit()?;
        self.signals().emit(review_id);

        info!(review_id, "counter-patch rejected");
        Ok(CounterPatchOut {
            review_id: review_id.to_string(),
            status: review.status,
            counter_patch_status: review.counter_patch_status,
        })
    }

    /// `close_review`: terminal from any non-terminal state.
    pub async fn close_review(
        &self,
        review_id: &str,
        closer_role: Option<&str>,
    ) -> BrokerResult<CloseOut> {
        let txn = self.store().begin_write().await?;
        let mut review = Self::fetch(&txn, review_id)?;
        validate_transition(review.status, ReviewStatus::Closed)?;

        let now = time::now_rfc3339_ms();
        review.status = ReviewStatus::Closed;
        review.claimed_by = None;
        review.updated_at = now.clone();
        reviews::update(&txn, &review)?;

        let actor = closer_role.unwrap_or("proposer");
        audit::append(
            &txn,
            review_id,
            EventType::Closed,
            actor,
            &json!({ "status": "closed", "closer_role": actor }),
            &now,
        )?;
        txn.commit()?;

        // Wake watchers so they observe the terminal state, then drop the
        // per-review gate.
        self.signals().emit(review_id);
        self.signals().cleanup(review_id);

        info!(review_id, "review closed");
        Ok(CloseOut {
            review_id: review_id.to_string(),
            status: ReviewStatus::Closed,
        })
    }
}
