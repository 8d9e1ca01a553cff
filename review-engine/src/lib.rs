//! Verb semantics for the review broker.
//!
//! The HTTP layer stays thin; everything a verb means lives here:
//!
//! 1) **Lifecycle**: create/revise, claim (with auto-reject on a stale
//!    diff), verdicts, counter-patch accept/reject, close.
//! 2) **Discussion**: strictly alternating proposer/reviewer messages.
//! 3) **Queries**: queue listing and status reads with bounded long-poll,
//!    proposal/discussion reads, activity feed, audit log, stats, timeline.
//!
//! Every write follows one discipline: acquire the store's write lock, open
//! `BEGIN IMMEDIATE`, validate with the pure state machine, mutate, append
//! audit events in the same transaction, commit, then signal waiters. The
//! signal always fires after commit, so an awakened reader observes the
//! committed row.

pub mod broker;
pub mod discussion;
pub mod errors;
pub mod inputs;
pub mod lifecycle;
pub mod notify;
pub mod queries;
pub mod views;

pub use broker::Broker;
pub use errors::{BrokerError, BrokerResult};
pub use inputs::{CreateReviewInput, MessageInput, Verdict, VerdictInput};
pub use notify::{ReviewSignals, WaitOutcome, LONG_POLL};
