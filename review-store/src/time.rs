//! Timestamp helpers.
//!
//! All persisted timestamps are RFC 3339, UTC, millisecond precision. The
//! text form sorts lexicographically, but nothing in the broker orders by
//! timestamp: messages and audit events order by their insertion rank.

use chrono::{SecondsFormat, Utc};

/// Current instant as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn now_rfc3339_ms() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millisecond_precision_utc() {
        let ts = now_rfc3339_ms();
        assert!(ts.ends_with('Z'));
        // "2026-08-01T12:00:00.123Z" → exactly three fractional digits.
        let frac = ts.rsplit('.').next().unwrap();
        assert_eq!(frac.len(), "123Z".len());
    }
}
