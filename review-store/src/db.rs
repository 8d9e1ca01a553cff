//! Store lifecycle: open, migrate, checkpoint.
//!
//! Exactly one writable connection exists for the process lifetime. WAL mode
//! keeps readers non-blocking; `synchronous=NORMAL` keeps commits cheap
//! without risking corruption; the busy timeout covers the rare moment the
//! WAL is being checkpointed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rusqlite::Connection;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::StoreResult;
use crate::write::WriteTxn;

/// Ordered, idempotent migration list. Statements that re-add an existing
/// column fail with "duplicate column name" and are skipped, so restarts are
/// harmless.
const MIGRATIONS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS reviews (
        id TEXT PRIMARY KEY,
        status TEXT NOT NULL,
        intent TEXT NOT NULL,
        description TEXT,
        diff TEXT,
        affected_files TEXT NOT NULL DEFAULT '[]',
        agent_type TEXT NOT NULL,
        agent_role TEXT NOT NULL,
        phase TEXT NOT NULL,
        plan TEXT,
        task TEXT,
        project TEXT NOT NULL,
        category TEXT,
        priority TEXT NOT NULL,
        current_round INTEGER NOT NULL DEFAULT 1,
        claimed_by TEXT,
        claim_generation INTEGER NOT NULL DEFAULT 0,
        verdict_reason TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        review_id TEXT NOT NULL REFERENCES reviews(id),
        sender_role TEXT NOT NULL,
        round INTEGER NOT NULL,
        body TEXT NOT NULL,
        metadata TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS audit_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        review_id TEXT NOT NULL,
        event_type TEXT NOT NULL,
        actor TEXT NOT NULL,
        metadata TEXT NOT NULL DEFAULT '{}',
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_reviews_status ON reviews(status)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_category ON reviews(category)",
    "CREATE INDEX IF NOT EXISTS idx_messages_review_rank ON messages(review_id, id)",
    "CREATE INDEX IF NOT EXISTS idx_audit_review_created ON audit_events(review_id, created_at)",
    "ALTER TABLE reviews ADD COLUMN skip_diff_validation INTEGER NOT NULL DEFAULT 0",
    "ALTER TABLE reviews ADD COLUMN counter_patch TEXT",
    "ALTER TABLE reviews ADD COLUMN counter_patch_affected_files TEXT",
    "ALTER TABLE reviews ADD COLUMN counter_patch_status TEXT",
];

/// Handle to the single persistent SQLite file.
///
/// Cloning is cheap; all clones share the one connection.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl Store {
    /// Opens (creating if needed) the store file, applies pragmas and runs
    /// migrations.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // journal_mode returns a row; consume it with query_row.
        conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(Duration::from_secs(5))?;

        apply_migrations(&conn)?;

        info!(path = %path.display(), "review store opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: path.to_path_buf(),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Borrows the connection for a read. No transaction is opened; WAL
    /// readers never block the writer.
    pub async fn read(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().await
    }

    /// Acquires the process-wide write lock and opens `BEGIN IMMEDIATE`.
    ///
    /// Dropping the returned guard without `commit` rolls back.
    pub async fn begin_write(&self) -> StoreResult<WriteTxn<'_>> {
        let guard = self.conn.lock().await;
        WriteTxn::begin(guard)
    }

    /// Checkpoints the WAL and truncates it. Run before process exit so a
    /// later startup never sees phantom advisory locks on the side files.
    pub async fn checkpoint_truncate(&self) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        debug!("wal checkpoint (truncate) complete");
        Ok(())
    }
}

fn apply_migrations(conn: &Connection) -> StoreResult<()> {
    for (i, stmt) in MIGRATIONS.iter().enumerate() {
        match conn.execute_batch(stmt) {
            Ok(()) => {}
            Err(e) if e.to_string().contains("duplicate column name") => {
                debug!(migration = i, "column already present, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
