//! Review row queries.
//!
//! Functions take `&Connection` so they run equally under a read borrow or
//! inside a `WriteTxn` (which derefs to the connection).

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{StoreError, StoreResult};
use crate::models::{Category, Priority, Review, ReviewStatus};

const REVIEW_COLS: &str = "id, status, intent, description, diff, affected_files, \
     skip_diff_validation, agent_type, agent_role, phase, plan, task, project, category, \
     priority, current_round, claimed_by, claim_generation, verdict_reason, counter_patch, \
     counter_patch_affected_files, counter_patch_status, created_at, updated_at";

/// Filter for [`list`]; `None` fields match everything.
#[derive(Debug, Default, Clone)]
pub struct ReviewFilter {
    pub status: Option<ReviewStatus>,
    pub category: Option<Category>,
    pub project: Option<String>,
}

fn files_to_json(files: &[String]) -> String {
    serde_json::to_string(files).unwrap_or_else(|_| "[]".to_string())
}

fn files_from_json(raw: &str) -> StoreResult<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|e| StoreError::Corrupt(format!("affected_files not a JSON array: {e}")))
}

fn row_to_review(row: &Row<'_>) -> rusqlite::Result<Review> {
    let affected_raw: String = row.get(5)?;
    let counter_files_raw: Option<String> = row.get(20)?;
    let to_sql_err = |e: StoreError| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::other(e.to_string())),
        )
    };

    Ok(Review {
        id: row.get(0)?,
        status: row.get(1)?,
        intent: row.get(2)?,
        description: row.get(3)?,
        diff: row.get(4)?,
        affected_files: files_from_json(&affected_raw).map_err(to_sql_err)?,
        skip_diff_validation: row.get::<_, i64>(6)? != 0,
        agent_type: row.get(7)?,
        agent_role: row.get(8)?,
        phase: row.get(9)?,
        plan: row.get(10)?,
        task: row.get(11)?,
        project: row.get(12)?,
        category: row.get(13)?,
        priority: row.get(14)?,
        current_round: row.get(15)?,
        claimed_by: row.get(16)?,
        claim_generation: row.get(17)?,
        verdict_reason: row.get(18)?,
        counter_patch: row.get(19)?,
        counter_patch_affected_files: match counter_files_raw {
            Some(raw) => Some(files_from_json(&raw).map_err(to_sql_err)?),
            None => None,
        },
        counter_patch_status: row.get(21)?,
        created_at: row.get(22)?,
        updated_at: row.get(23)?,
    })
}

/// Inserts a freshly created review row.
pub fn insert(conn: &Connection, review: &Review) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO reviews (id, status, intent, description, diff, affected_files, \
         skip_diff_validation, agent_type, agent_role, phase, plan, task, project, category, \
         priority, current_round, claimed_by, claim_generation, verdict_reason, counter_patch, \
         counter_patch_affected_files, counter_patch_status, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
         ?18, ?19, ?20, ?21, ?22, ?23, ?24)",
        params![
            review.id,
            review.status,
            review.intent,
            review.description,
            review.diff,
            files_to_json(&review.affected_files),
            review.skip_diff_validation as i64,
            review.agent_type,
            review.agent_role,
            review.phase,
            review.plan,
            review.task,
            review.project,
            review.category,
            review.priority,
            review.current_round,
            review.claimed_by,
            review.claim_generation,
            review.verdict_reason,
            review.counter_patch,
            review
                .counter_patch_affected_files
                .as_deref()
                .map(files_to_json),
            review.counter_patch_status,
            review.created_at,
            review.updated_at,
        ],
    )?;
    Ok(())
}

/// Fetches one review by id.
pub fn get(conn: &Connection, id: &str) -> StoreResult<Option<Review>> {
    let sql = format!("SELECT {REVIEW_COLS} FROM reviews WHERE id = ?1");
    Ok(conn
        .query_row(&sql, params![id], row_to_review)
        .optional()?)
}

/// Rewrites every mutable column from the given struct.
///
/// `id`, `agent_*`, `phase`, `plan`, `task`, `project`, `priority` and
/// `created_at` are immutable after insert and deliberately not touched.
pub fn update(conn: &Connection, review: &Review) -> StoreResult<()> {
    let n = conn.execute(
        "UPDATE reviews SET status = ?2, intent = ?3, description = ?4, diff = ?5, \
         affected_files = ?6, skip_diff_validation = ?7, current_round = ?8, claimed_by = ?9, \
         claim_generation = ?10, verdict_reason = ?11, counter_patch = ?12, \
         counter_patch_affected_files = ?13, counter_patch_status = ?14, updated_at = ?15 \
         WHERE id = ?1",
        params![
            review.id,
            review.status,
            review.intent,
            review.description,
            review.diff,
            files_to_json(&review.affected_files),
            review.skip_diff_validation as i64,
            review.current_round,
            review.claimed_by,
            review.claim_generation,
            review.verdict_reason,
            review.counter_patch,
            review
                .counter_patch_affected_files
                .as_deref()
                .map(files_to_json),
            review.counter_patch_status,
            review.updated_at,
        ],
    )?;
    if n != 1 {
        return Err(StoreError::Corrupt(format!(
            "update touched {n} rows for review {}",
            review.id
        )));
    }
    Ok(())
}

/// Conditional claim: moves `pending -> claimed` and bumps the generation in
/// one statement. Returns false when the row was not pending anymore; the
/// write lock already prevents that, this is belt and braces.
pub fn claim_pending(
    conn: &Connection,
    id: &str,
    reviewer_id: &str,
    now: &str,
) -> StoreResult<bool> {
    let n = conn.execute(
        "UPDATE reviews SET status = 'claimed', claimed_by = ?2, \
         claim_generation = claim_generation + 1, updated_at = ?3 \
         WHERE id = ?1 AND status = 'pending'",
        params![id, reviewer_id, now],
    )?;
    Ok(n == 1)
}

/// Refreshes `updated_at` without changing anything else (message inserts).
pub fn touch(conn: &Connection, id: &str, now: &str) -> StoreResult<()> {
    conn.execute(
        "UPDATE reviews SET updated_at = ?2 WHERE id = ?1",
        params![id, now],
    )?;
    Ok(())
}

/// Lists reviews matching the filter, ordered by priority tier
/// (critical, normal, low; null sorts as normal) then `created_at` ascending.
pub fn list(conn: &Connection, filter: &ReviewFilter) -> StoreResult<Vec<Review>> {
    let mut sql = format!("SELECT {REVIEW_COLS} FROM reviews WHERE 1=1");
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(status) = filter.status {
        sql.push_str(&format!(" AND status = ?{}", args.len() + 1));
        args.push(Box::new(status.as_str().to_string()));
    }
    if let Some(category) = filter.category {
        sql.push_str(&format!(" AND category = ?{}", args.len() + 1));
        args.push(Box::new(category.as_str().to_string()));
    }
    if let Some(project) = &filter.project {
        sql.push_str(&format!(" AND project = ?{}", args.len() + 1));
        args.push(Box::new(project.clone()));
    }

    sql.push_str(
        " ORDER BY CASE COALESCE(priority, 'normal') \
         WHEN 'critical' THEN 0 WHEN 'normal' THEN 1 ELSE 2 END, created_at ASC",
    );

    let mut stmt = conn.prepare(&sql)?;
    let params = rusqlite::params_from_iter(args.iter().map(|a| a.as_ref()));
    let rows = stmt.query_map(params, row_to_review)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// One activity-feed entry: a recent review plus its latest message preview.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub review: Review,
    pub last_message: Option<String>,
    pub message_count: i64,
}

/// Most recently updated reviews with their discussion previews.
pub fn activity_feed(
    conn: &Connection,
    filter: &ReviewFilter,
    limit: i64,
) -> StoreResult<Vec<FeedEntry>> {
    let mut sql = format!(
        "SELECT {REVIEW_COLS}, \
         (SELECT body FROM messages m WHERE m.review_id = reviews.id \
            ORDER BY m.id DESC LIMIT 1) AS last_message, \
         (SELECT COUNT(*) FROM messages m WHERE m.review_id = reviews.id) AS message_count \
         FROM reviews WHERE 1=1"
    );
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(status) = filter.status {
        sql.push_str(&format!(" AND status = ?{}", args.len() + 1));
        args.push(Box::new(status.as_str().to_string()));
    }
    if let Some(category) = filter.category {
        sql.push_str(&format!(" AND category = ?{}", args.len() + 1));
        args.push(Box::new(category.as_str().to_string()));
    }
    if let Some(project) = &filter.project {
        sql.push_str(&format!(" AND project = ?{}", args.len() + 1));
        args.push(Box::new(project.clone()));
    }

    sql.push_str(&format!(
        " ORDER BY updated_at DESC LIMIT ?{}",
        args.len() + 1
    ));
    args.push(Box::new(limit));

    let mut stmt = conn.prepare(&sql)?;
    let params = rusqlite::params_from_iter(args.iter().map(|a| a.as_ref()));
    let rows = stmt.query_map(params, |row| {
        let review = row_to_review(row)?;
        let last_message: Option<String> = row.get(24)?;
        let message_count: i64 = row.get(25)?;
        Ok(FeedEntry {
            review,
            last_message,
            message_count,
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Counts grouped by a review column, for stats and the overview snapshot.
pub fn counts_by(
    conn: &Connection,
    column: CountDimension,
    project: Option<&str>,
) -> StoreResult<Vec<(String, i64)>> {
    let col = column.column();
    let mut sql = format!(
        "SELECT COALESCE({col}, 'none'), COUNT(*) FROM reviews WHERE 1=1"
    );
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    if let Some(project) = project {
        sql.push_str(&format!(" AND project = ?{}", args.len() + 1));
        args.push(Box::new(project.to_string()));
    }
    sql.push_str(&format!(" GROUP BY COALESCE({col}, 'none')"));

    let mut stmt = conn.prepare(&sql)?;
    let params = rusqlite::params_from_iter(args.iter().map(|a| a.as_ref()));
    let rows = stmt.query_map(params, |row| Ok((row.get(0)?, row.get(1)?)))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Grouping dimensions for [`counts_by`]. Closed set: the column name is
/// interpolated into SQL.
#[derive(Debug, Clone, Copy)]
pub enum CountDimension {
    Status,
    Category,
    Priority,
}

impl CountDimension {
    fn column(self) -> &'static str {
        match self {
            CountDimension::Status => "status",
            CountDimension::Category => "category",
            CountDimension::Priority => "priority",
        }
    }
}

/// Priority column only, without materializing the whole row.
pub fn priority_of(conn: &Connection, id: &str) -> StoreResult<Option<Priority>> {
    Ok(conn
        .query_row(
            "SELECT priority FROM reviews WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?)
}
