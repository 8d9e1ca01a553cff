//! Append-only audit log and the views derived from it.
//!
//! Lifecycle events carry the resulting review status under a `status`
//! metadata key; events that do not change state (comment verdicts,
//! counter-patch bookkeeping, messages) omit it. Timing stats pair
//! consecutive status-bearing events per review, so open-ended tails (a
//! review parked in its latest state) contribute nothing.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, Row};

use crate::error::{StoreError, StoreResult};
use crate::models::{AuditEvent, EventType};

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<AuditEvent> {
    let metadata_raw: String = row.get(4)?;
    let metadata = serde_json::from_str(&metadata_raw).unwrap_or(serde_json::Value::Null);
    Ok(AuditEvent {
        id: row.get(0)?,
        review_id: row.get(1)?,
        event_type: row.get(2)?,
        actor: row.get(3)?,
        metadata,
        created_at: row.get(5)?,
    })
}

/// Appends one event inside the caller's transaction. Returns the event id.
pub fn append(
    conn: &Connection,
    review_id: &str,
    event_type: EventType,
    actor: &str,
    metadata: &serde_json::Value,
    now: &str,
) -> StoreResult<i64> {
    let metadata = serde_json::to_string(metadata)
        .map_err(|e| StoreError::Corrupt(format!("unserializable event metadata: {e}")))?;
    conn.execute(
        "INSERT INTO audit_events (review_id, event_type, actor, metadata, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![review_id, event_type, actor, metadata, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Chronological event sequence for one review.
pub fn for_review(conn: &Connection, review_id: &str) -> StoreResult<Vec<AuditEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, review_id, event_type, actor, metadata, created_at \
         FROM audit_events WHERE review_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![review_id], row_to_event)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Every event across all reviews, in append order.
pub fn all(conn: &Connection) -> StoreResult<Vec<AuditEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, review_id, event_type, actor, metadata, created_at \
         FROM audit_events ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], row_to_event)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Lifetime verdict and timing metrics derived purely from the audit log.
#[derive(Debug, Clone, Default)]
pub struct AuditStats {
    pub total_verdicts: i64,
    pub approved_verdicts: i64,
    /// `approved / total`, absent until the first verdict exists.
    pub approval_rate: Option<f64>,
    /// Mean seconds from (re)submission to the next verdict on that review.
    pub avg_secs_to_verdict: Option<f64>,
    /// Mean seconds spent in each state, keyed by status name. States whose
    /// occupancy never ended are not represented.
    pub avg_secs_in_state: BTreeMap<String, f64>,
}

/// Computes [`AuditStats`], optionally restricted to one project label.
///
/// The project filter joins through the review row; the review's project is
/// immutable, so this does not reintroduce "status is a moving target".
pub fn stats(conn: &Connection, project: Option<&str>) -> StoreResult<AuditStats> {
    let project_clause = if project.is_some() {
        " AND EXISTS (SELECT 1 FROM reviews r WHERE r.id = e.review_id AND r.project = ?1)"
    } else {
        ""
    };

    let mut out = AuditStats::default();

    // Verdict counts and approval rate.
    let sql = format!(
        "SELECT COUNT(*), \
         SUM(CASE WHEN json_extract(e.metadata, '$.verdict') = 'approved' THEN 1 ELSE 0 END) \
         FROM audit_events e WHERE e.event_type = 'verdict_submitted'{project_clause}"
    );
    let (total, approved): (i64, Option<i64>) = if let Some(project) = project {
        conn.query_row(&sql, params![project], |r| Ok((r.get(0)?, r.get(1)?)))?
    } else {
        conn.query_row(&sql, [], |r| Ok((r.get(0)?, r.get(1)?)))?
    };
    out.total_verdicts = total;
    out.approved_verdicts = approved.unwrap_or(0);
    if total > 0 {
        out.approval_rate = Some(out.approved_verdicts as f64 / total as f64);
    }

    // Mean time from submission (creation or revision) to the next verdict.
    let sql = format!(
        "SELECT AVG((julianday(v.created_at) - julianday(e.created_at)) * 86400.0) \
         FROM audit_events e \
         JOIN audit_events v ON v.review_id = e.review_id \
           AND v.id = (SELECT MIN(x.id) FROM audit_events x \
                       WHERE x.review_id = e.review_id \
                         AND x.event_type = 'verdict_submitted' AND x.id > e.id) \
         WHERE e.event_type IN ('review_created', 'revision_created'){project_clause}"
    );
    out.avg_secs_to_verdict = if let Some(project) = project {
        conn.query_row(&sql, params![project], |r| r.get(0))?
    } else {
        conn.query_row(&sql, [], |r| r.get(0))?
    };

    // Mean occupancy per state from consecutive status-bearing events.
    let sql = format!(
        "SELECT json_extract(e.metadata, '$.status'), \
         AVG((julianday(n.created_at) - julianday(e.created_at)) * 86400.0) \
         FROM audit_events e \
         JOIN audit_events n ON n.review_id = e.review_id \
           AND n.id = (SELECT MIN(x.id) FROM audit_events x \
                       WHERE x.review_id = e.review_id AND x.id > e.id \
                         AND json_extract(x.metadata, '$.status') IS NOT NULL) \
         WHERE json_extract(e.metadata, '$.status') IS NOT NULL{project_clause} \
         GROUP BY json_extract(e.metadata, '$.status')"
    );
    let mut stmt = conn.prepare(&sql)?;
    if let Some(project) = project {
        let rows = stmt.query_map(params![project], |r| Ok((r.get(0)?, r.get(1)?)))?;
        collect_occupancy(rows, &mut out.avg_secs_in_state)?;
    } else {
        let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
        collect_occupancy(rows, &mut out.avg_secs_in_state)?;
    }

    Ok(out)
}

fn collect_occupancy(
    rows: impl Iterator<Item = rusqlite::Result<(String, f64)>>,
    into: &mut BTreeMap<String, f64>,
) -> StoreResult<()> {
    for r in rows {
        let (state, secs) = r?;
        into.insert(state, secs);
    }
    Ok(())
}
