//! Review state machine.
//!
//! The closed transition table for review lifecycle. `validate_transition`
//! is pure; callers run it inside their write transaction before mutating
//! the row.

use thiserror::Error;

use crate::models::ReviewStatus;

/// Rejected state-machine move.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid transition: {from} -> {to}", from = .from.as_str(), to = .to.as_str())]
pub struct InvalidTransition {
    pub from: ReviewStatus,
    pub to: ReviewStatus,
}

/// Checks `current -> target` against the transition table.
///
/// | from              | allowed targets                                          |
/// |-------------------|----------------------------------------------------------|
/// | pending           | claimed, closed                                          |
/// | claimed           | in_review, approved, changes_requested, pending, closed  |
/// | in_review         | approved, changes_requested, closed                      |
/// | approved          | closed                                                   |
/// | changes_requested | pending, closed                                          |
/// | closed            | (terminal)                                               |
pub fn validate_transition(
    current: ReviewStatus,
    target: ReviewStatus,
) -> Result<(), InvalidTransition> {
    use ReviewStatus::*;

    let allowed = match (current, target) {
        (Pending, Claimed | Closed) => true,
        (Claimed, InReview | Approved | ChangesRequested | Pending | Closed) => true,
        (InReview, Approved | ChangesRequested | Closed) => true,
        (Approved, Closed) => true,
        (ChangesRequested, Pending | Closed) => true,
        (Closed, _) => false,
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(InvalidTransition {
            from: current,
            to: target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReviewStatus::*;

    const ALL: [ReviewStatus; 6] = [Pending, Claimed, InReview, Approved, ChangesRequested, Closed];

    #[test]
    fn allowed_moves_form_a_closed_table() {
        let allowed: &[(ReviewStatus, ReviewStatus)] = &[
            (Pending, Claimed),
            (Pending, Closed),
            (Claimed, InReview),
            (Claimed, Approved),
            (Claimed, ChangesRequested),
            (Claimed, Pending),
            (Claimed, Closed),
            (InReview, Approved),
            (InReview, ChangesRequested),
            (InReview, Closed),
            (Approved, Closed),
            (ChangesRequested, Pending),
            (ChangesRequested, Closed),
        ];

        for from in ALL {
            for to in ALL {
                let expect = allowed.contains(&(from, to));
                assert_eq!(
                    validate_transition(from, to).is_ok(),
                    expect,
                    "{} -> {}",
                    from.as_str(),
                    to.as_str()
                );
            }
        }
    }

    #[test]
    fn closed_is_terminal() {
        for to in ALL {
            assert!(validate_transition(Closed, to).is_err());
        }
    }
}
