//! The broker aggregate: store + validator + signals.

use diff_validator::DiffValidator;
use review_store::{reviews, Connection, Review, Store};

use crate::errors::{BrokerError, BrokerResult};
use crate::notify::ReviewSignals;

/// Shared service object behind every verb. Cheap to share via `Arc`.
pub struct Broker {
    store: Store,
    validator: DiffValidator,
    signals: ReviewSignals,
}

impl Broker {
    pub fn new(store: Store, validator: DiffValidator) -> Self {
        Self {
            store,
            validator,
            signals: ReviewSignals::new(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn validator(&self) -> &DiffValidator {
        &self.validator
    }

    pub fn signals(&self) -> &ReviewSignals {
        &self.signals
    }

    /// Fetches a review inside an open transaction or read borrow, mapping
    /// absence to `not_found`.
    pub(crate) fn fetch(conn: &Connection, review_id: &str) -> BrokerResult<Review> {
        reviews::get(conn, review_id)?.ok_or(BrokerError::NotFound)
    }

    /// Flushes the WAL before shutdown.
    pub async fn shutdown(&self) -> BrokerResult<()> {
        self.store.checkpoint_truncate().await?;
        Ok(())
    }
}
