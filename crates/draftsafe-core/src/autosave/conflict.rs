//! Divergence heuristic over a document's version history.
//!
//! Two versions conflict when the newest two were created further apart than
//! the conflict window and their contents differ. A long gap followed by
//! different content is taken as a sign that two edit sessions ran without
//! seeing each other's saves. Nothing here merges or resolves anything.

use chrono::{DateTime, Duration, Utc};

use crate::types::{Conflict, Version};

/// Compare the two newest versions of a newest-first history.
///
/// Returns an empty list for histories shorter than two.
pub fn detect_conflicts(
    versions: &[Version],
    window: Duration,
    now: DateTime<Utc>,
) -> Vec<Conflict> {
    let [newer, older, ..] = versions else {
        return Vec::new();
    };

    let gap = newer.created_at - older.created_at;
    // Histories restored out of order can have a negative gap.
    let gap = gap.abs();

    if gap > window && newer.content_hash != older.content_hash {
        tracing::debug!(
            newer = %newer.id,
            older = %older.id,
            gap_ms = gap.num_milliseconds(),
            "Detected divergent versions"
        );
        vec![Conflict {
            version_a: newer.id.clone(),
            version_b: older.id.clone(),
            detected_at: now,
            gap_ms: gap.num_milliseconds(),
        }]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Snapshot;

    fn at(ms: i64, text: &str) -> Version {
        Version::new(
            Snapshot::from(text),
            DateTime::<Utc>::UNIX_EPOCH + Duration::milliseconds(ms),
        )
    }

    #[test]
    fn test_short_history_has_no_conflicts() {
        let window = Duration::milliseconds(1000);
        assert!(detect_conflicts(&[], window, Utc::now()).is_empty());
        assert!(detect_conflicts(&[at(0, "a")], window, Utc::now()).is_empty());
    }

    #[test]
    fn test_gap_within_window_is_not_a_conflict() {
        let versions = [at(900, "b"), at(0, "a")];
        let window = Duration::milliseconds(1000);
        assert!(detect_conflicts(&versions, window, Utc::now()).is_empty());
    }

    #[test]
    fn test_gap_beyond_window_with_same_content_is_not_a_conflict() {
        let versions = [at(5000, "same"), at(0, "same")];
        let window = Duration::milliseconds(1000);
        assert!(detect_conflicts(&versions, window, Utc::now()).is_empty());
    }

    #[test]
    fn test_gap_beyond_window_with_different_content_conflicts() {
        let versions = [at(5000, "theirs"), at(0, "ours"), at(-10, "older")];
        let now = Utc::now();
        let conflicts = detect_conflicts(&versions, Duration::milliseconds(1000), now);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].version_a, versions[0].id);
        assert_eq!(conflicts[0].version_b, versions[1].id);
        assert_eq!(conflicts[0].gap_ms, 5000);
        assert_eq!(conflicts[0].detected_at, now);
    }

    #[test]
    fn test_gap_equal_to_window_is_not_a_conflict() {
        let versions = [at(1000, "b"), at(0, "a")];
        let window = Duration::milliseconds(1000);
        assert!(detect_conflicts(&versions, window, Utc::now()).is_empty());
    }
}
