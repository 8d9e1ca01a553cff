//! Read verbs: queue listing, status, proposal, feed, audit, stats.
//!
//! Reads never take the write lock and never open a transaction. The two
//! long-poll verbs register on a signal before re-reading, so a commit that
//! fires the signal is always visible to the awakened reader.

use std::time::{Duration, Instant};

use review_store::reviews::{CountDimension, ReviewFilter};
use review_store::{audit, reviews};
use tracing::debug;

use crate::broker::Broker;
use crate::errors::BrokerResult;
use crate::notify::{WaitOutcome, LONG_POLL};
use crate::views::{
    FeedItem, ListView, OverviewSnapshot, ProposalView, ReviewSummary, StatsView, StatusView,
    TimelineView,
};

/// Row budget for the activity feed and overview snapshot.
const FEED_LIMIT: i64 = 20;

impl Broker {
    /// `list_reviews`: priority-then-age ordering. With `wait`, holds until
    /// a matching review appears or the long-poll budget runs out; a wake
    /// for a non-matching change goes back to waiting.
    pub async fn list_reviews(&self, filter: ReviewFilter, wait: bool) -> BrokerResult<ListView> {
        let deadline = Instant::now() + LONG_POLL;
        loop {
            let rows = {
                let conn = self.store().read().await;
                reviews::list(&conn, &filter)?
            };
            if !rows.is_empty() || !wait {
                return Ok(ListView {
                    count: rows.len(),
                    reviews: rows.iter().map(ReviewSummary::from).collect(),
                });
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(ListView {
                    count: 0,
                    reviews: Vec::new(),
                });
            }
            debug!(remaining_ms = remaining.as_millis() as u64, "list long-poll parked");
            if self.signals().wait_any(remaining).await == WaitOutcome::TimedOut {
                return Ok(ListView {
                    count: 0,
                    reviews: Vec::new(),
                });
            }
        }
    }

    /// `get_review_status`: full row without diff bodies. With `wait`,
    /// parks on the per-review signal and re-reads once it fires.
    pub async fn get_review_status(
        &self,
        review_id: &str,
        wait: bool,
        caller_id: Option<&str>,
    ) -> BrokerResult<StatusView> {
        if let Some(caller) = caller_id {
            debug!(review_id, caller, wait, "status poll");
        }

        let review = {
            let conn = self.store().read().await;
            Self::fetch(&conn, review_id)?
        };
        if !wait {
            return Ok(StatusView::from(&review));
        }

        self.signals().wait(review_id, LONG_POLL).await;
        let conn = self.store().read().await;
        let review = Self::fetch(&conn, review_id)?;
        Ok(StatusView::from(&review))
    }

    /// `get_proposal`: the complete row including diff and counter-patch.
    pub async fn get_proposal(&self, review_id: &str) -> BrokerResult<ProposalView> {
        let conn = self.store().read().await;
        let review = Self::fetch(&conn, review_id)?;
        Ok(ProposalView::from(&review))
    }

    /// `get_activity_feed`: recent reviews with last-message previews.
    pub async fn get_activity_feed(&self, filter: ReviewFilter) -> BrokerResult<Vec<FeedItem>> {
        let conn = self.store().read().await;
        let entries = reviews::activity_feed(&conn, &filter, FEED_LIMIT)?;
        Ok(entries.into_iter().map(FeedItem::from).collect())
    }

    /// `get_audit_log`: one review's events, or every event in append order.
    pub async fn get_audit_log(&self, review_id: Option<&str>) -> BrokerResult<TimelineView> {
        let conn = self.store().read().await;
        let events = match review_id {
            Some(id) => {
                Self::fetch(&conn, id)?;
                audit::for_review(&conn, id)?
            }
            None => audit::all(&conn)?,
        };
        Ok(TimelineView {
            review_id: review_id.map(str::to_string),
            count: events.len(),
            events,
        })
    }

    /// `get_review_timeline`: chronological events for one review.
    pub async fn get_review_timeline(&self, review_id: &str) -> BrokerResult<TimelineView> {
        self.get_audit_log(Some(review_id)).await
    }

    /// `get_review_stats`: counts plus verdict and timing metrics.
    pub async fn get_review_stats(&self, project: Option<&str>) -> BrokerResult<StatsView> {
        let conn = self.store().read().await;
        let by_status = reviews::counts_by(&conn, CountDimension::Status, project)?;
        let by_category = reviews::counts_by(&conn, CountDimension::Category, project)?;
        let by_priority = reviews::counts_by(&conn, CountDimension::Priority, project)?;
        let audit_stats = audit::stats(&conn, project)?;
        Ok(StatsView::from_parts(
            by_status,
            by_category,
            by_priority,
            audit_stats,
        ))
    }

    /// Compact dashboard snapshot for the push channel.
    pub async fn overview_snapshot(&self) -> BrokerResult<OverviewSnapshot> {
        let conn = self.store().read().await;
        let by_status = reviews::counts_by(&conn, CountDimension::Status, None)?;
        let entries = reviews::activity_feed(&conn, &ReviewFilter::default(), FEED_LIMIT)?;
        Ok(OverviewSnapshot {
            counts_by_status: by_status.into_iter().collect(),
            recent: entries.into_iter().map(FeedItem::from).collect(),
        })
    }

    /// Bounded wait on the global signal, for the push channel.
    pub async fn wait_for_any_change(&self, timeout: Duration) -> WaitOutcome {
        self.signals().wait_any(timeout).await
    }
}

// Re-exported so transports can build filters without depending on the
// store crate directly.
pub use review_store::reviews::ReviewFilter as Filter;
