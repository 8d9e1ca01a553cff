//! Write coordination.
//!
//! All write verbs funnel through one `WriteTxn`: the connection mutex is the
//! process-wide write lock, and the guard wraps an explicit `BEGIN IMMEDIATE`
//! so SQLite takes the reserved lock up front instead of failing at the first
//! UPDATE. Commit consumes the guard; dropping an uncommitted guard rolls
//! back, so an error anywhere in a verb leaves no partial state.

use std::ops::Deref;

use rusqlite::Connection;
use tokio::sync::MutexGuard;
use tracing::warn;

use crate::error::StoreResult;

/// An open immediate-mode write transaction holding the write lock.
pub struct WriteTxn<'a> {
    guard: MutexGuard<'a, Connection>,
    finished: bool,
}

impl<'a> WriteTxn<'a> {
    pub(crate) fn begin(guard: MutexGuard<'a, Connection>) -> StoreResult<Self> {
        guard.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Self {
            guard,
            finished: false,
        })
    }

    /// Commits and releases the write lock.
    pub fn commit(mut self) -> StoreResult<()> {
        self.guard.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }
}

impl Deref for WriteTxn<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.guard
    }
}

impl Drop for WriteTxn<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.guard.execute_batch("ROLLBACK") {
                warn!(error = %e, "rollback failed while dropping write txn");
            }
        }
    }
}
