//! Discussion message queries.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::StoreResult;
use crate::models::{Message, SenderRole};

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        review_id: row.get(1)?,
        sender_role: row.get(2)?,
        round: row.get(3)?,
        body: row.get(4)?,
        metadata: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Role of the most recent message, by insertion rank. Turn alternation is
/// checked against this inside the write transaction.
pub fn last_sender(conn: &Connection, review_id: &str) -> StoreResult<Option<SenderRole>> {
    Ok(conn
        .query_row(
            "SELECT sender_role FROM messages WHERE review_id = ?1 ORDER BY id DESC LIMIT 1",
            params![review_id],
            |row| row.get(0),
        )
        .optional()?)
}

/// Inserts a message and returns its rank (the rowid).
pub fn insert(
    conn: &Connection,
    review_id: &str,
    sender_role: SenderRole,
    round: i64,
    body: &str,
    metadata: Option<&str>,
    now: &str,
) -> StoreResult<i64> {
    conn.execute(
        "INSERT INTO messages (review_id, sender_role, round, body, metadata, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![review_id, sender_role, round, body, metadata, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// All messages of a review in insertion order, optionally one round only.
pub fn list(
    conn: &Connection,
    review_id: &str,
    round: Option<i64>,
) -> StoreResult<Vec<Message>> {
    let mut out = Vec::new();
    match round {
        Some(round) => {
            let mut stmt = conn.prepare(
                "SELECT id, review_id, sender_role, round, body, metadata, created_at \
                 FROM messages WHERE review_id = ?1 AND round = ?2 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![review_id, round], row_to_message)?;
            for r in rows {
                out.push(r?);
            }
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, review_id, sender_role, round, body, metadata, created_at \
                 FROM messages WHERE review_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![review_id], row_to_message)?;
            for r in rows {
                out.push(r?);
            }
        }
    }
    Ok(out)
}
