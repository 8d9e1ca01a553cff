//! Discussion verbs: strictly alternating proposer/reviewer messages.

use review_store::{audit, messages, reviews, time, EventType, ReviewStatus};
use serde_json::json;
use tracing::debug;

use crate::broker::Broker;
use crate::errors::{BrokerError, BrokerResult};
use crate::inputs::MessageInput;
use crate::views::{DiscussionView, MessageOut, MessageView};

impl Broker {
    /// `add_message`: insert one message, copying the review's current round.
    ///
    /// Alternation is global across rounds: the last message by insertion
    /// rank must come from the other role, whatever round it belonged to.
    pub async fn add_message(&self, input: MessageInput) -> BrokerResult<MessageOut> {
        if input.body.trim().is_empty() {
            return Err(BrokerError::BadRequest("body must not be empty".into()));
        }

        let txn = self.store().begin_write().await?;
        let review = Self::fetch(&txn, &input.review_id)?;

        if !matches!(
            review.status,
            ReviewStatus::Claimed | ReviewStatus::InReview | ReviewStatus::ChangesRequested
        ) {
            return Err(BrokerError::InvalidState(format!(
                "messages require claimed, in_review or changes_requested, review is {}",
                review.status.as_str()
            )));
        }

        if let Some(last) = messages::last_sender(&txn, &input.review_id)? {
            if last == input.sender_role {
                return Err(BrokerError::TurnViolation(format!(
                    "{} already sent the last message",
                    last.as_str()
                )));
            }
        }

        let now = time::now_rfc3339_ms();
        let message_id = messages::insert(
            &txn,
            &input.review_id,
            input.sender_role,
            review.current_round,
            &input.body,
            input.metadata.as_deref(),
            &now,
        )?;
        reviews::touch(&txn, &input.review_id, &now)?;
        audit::append(
            &txn,
            &input.review_id,
            EventType::MessageAdded,
            input.sender_role.as_str(),
            &json!({
                "sender_role": input.sender_role.as_str(),
                "round": review.current_round,
            }),
            &now,
        )?;
        txn.commit()?;
        self.signals().emit(&input.review_id);

        debug!(
            review_id = %input.review_id,
            sender = input.sender_role.as_str(),
            message_id,
            "message added"
        );
        Ok(MessageOut {
            review_id: input.review_id,
            message_id,
            round: review.current_round,
        })
    }

    /// `get_discussion`: all messages in insertion order, optionally one
    /// round. Malformed metadata comes back as `null` plus a warning flag,
    /// never as an error.
    pub async fn get_discussion(
        &self,
        review_id: &str,
        round: Option<i64>,
    ) -> BrokerResult<DiscussionView> {
        let conn = self.store().read().await;
        Self::fetch(&conn, review_id)?;
        let rows = messages::list(&conn, review_id, round)?;
        drop(conn);

        let messages: Vec<MessageView> = rows
            .into_iter()
            .map(|m| {
                let (metadata, metadata_warning) = match m.metadata.as_deref() {
                    None => (None, false),
                    Some(raw) => match serde_json::from_str(raw) {
                        Ok(value) => (Some(value), false),
                        Err(_) => (None, true),
                    },
                };
                MessageView {
                    id: m.id,
                    sender_role: m.sender_role,
                    round: m.round,
                    body: m.body,
                    metadata,
                    metadata_warning,
                    created_at: m.created_at,
                }
            })
            .collect();

        Ok(DiscussionView {
            review_id: review_id.to_string(),
            count: messages.len(),
            messages,
        })
    }
}
