//! Priority inference from the submitting agent's identity.
//!
//! Computed once at review creation and frozen for the review's lifetime;
//! revisions never recompute it.

use crate::models::Priority;

/// Maps `(agent_type, phase, task)` to a priority tier.
///
/// Rules, in order:
/// 1. planner agents are critical
/// 2. verification work is low
/// 3. everything else is normal
pub fn infer_priority(agent_type: &str, phase: &str, task: Option<&str>) -> Priority {
    if agent_type.to_ascii_lowercase().contains("planner") {
        return Priority::Critical;
    }
    let verify_phase = phase.to_ascii_lowercase().contains("verify");
    let verify_task = task
        .map(|t| t.to_ascii_lowercase().contains("verification"))
        .unwrap_or(false);
    if verify_phase || verify_task {
        return Priority::Low;
    }
    Priority::Normal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planner_wins_over_verify() {
        assert_eq!(
            infer_priority("gsd-Planner", "verify", Some("verification")),
            Priority::Critical
        );
    }

    #[test]
    fn verify_phase_or_task_is_low() {
        assert_eq!(infer_priority("gsd-executor", "Verify-2", None), Priority::Low);
        assert_eq!(
            infer_priority("gsd-executor", "4", Some("post-verification sweep")),
            Priority::Low
        );
    }

    #[test]
    fn default_is_normal() {
        assert_eq!(infer_priority("gsd-executor", "4", Some("2")), Priority::Normal);
    }
}
