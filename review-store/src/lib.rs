//! Durable state for the review broker (SQLite).
//!
//! Everything the broker must not lose lives here: review rows, discussion
//! messages and the append-only audit trail, all in one WAL-mode SQLite file
//! behind a single long-lived connection.
//!
//! Access discipline:
//! - Reads borrow the connection briefly (`Store::read`).
//! - Writes go through `Store::begin_write`, which holds the process-wide
//!   connection lock and an explicit `BEGIN IMMEDIATE` transaction until the
//!   returned guard is committed or dropped (drop = rollback).
//!
//! The state machine (`state`) and priority inference (`priority`) are pure
//! and never touch the connection.

pub mod audit;
pub mod db;
pub mod error;
pub mod messages;
pub mod models;
pub mod priority;
pub mod reviews;
pub mod state;
pub mod time;
pub mod write;

pub use db::Store;
pub use rusqlite::Connection;
pub use error::{StoreError, StoreResult};
pub use models::{
    AuditEvent, Category, CounterPatchStatus, EventType, Message, Priority, Review, ReviewStatus,
    SenderRole,
};
pub use priority::infer_priority;
pub use state::validate_transition;
pub use write::WriteTxn;
