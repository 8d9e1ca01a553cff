//! Store-layer error hierarchy.
//!
//! Single root `StoreError` for everything that can go wrong below the verb
//! layer; callers translate it into the wire-visible `db_error` shape.

use thiserror::Error;

/// Convenient alias for store-wide results.
pub type StoreResult<T> = Result<T, StoreError>;

/// Root error type for the review-store crate.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Anything SQLite-level: busy timeouts, constraint violations.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem problems around the store file itself.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted value failed to parse back into its typed form.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}
