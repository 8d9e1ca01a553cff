//! Unified-diff validation for the review broker.
//!
//! Two concerns, both side-effect free with respect to the working tree:
//! - `affected_files`: extract the touched paths from a unified diff, in
//!   order of appearance (parser is header-based and CRLF-tolerant).
//! - `DiffValidator::check_apply`: dry-run the diff against a working tree
//!   via `git apply --check`. The tree is never modified; only the exit
//!   status and stderr of the subprocess are consulted.

pub mod apply;
pub mod error;
pub mod parser;

pub use apply::DiffValidator;
pub use error::{DiffError, DiffResult};
pub use parser::affected_files;
