//! Rendering snapshots for CLI output.

use chrono::{DateTime, Duration, Utc};
use draftsafe_cli::render::{conflict_line, history_table, state_summary};
use draftsafe_core::{Conflict, SaveState, Snapshot, Version, VersionId};

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

#[test]
fn test_conflict_line() {
    let conflict = Conflict {
        version_a: VersionId::from("aaaaaaaa-1111-4111-8111-111111111111"),
        version_b: VersionId::from("bbbbbbbb-2222-4222-8222-222222222222"),
        detected_at: epoch(),
        gap_ms: 7_500_000,
    };
    insta::assert_snapshot!(
        conflict_line(&conflict),
        @"aaaaaaaa and bbbbbbbb diverge: saved 2h 5m apart, detected 1970-01-01T00:00:00Z"
    );
}

#[test]
fn test_state_summary() {
    let mut state = SaveState::fresh();
    insta::assert_snapshot!(
        state_summary("notes", &state),
        @"notes: 0 version(s), last saved never"
    );

    state.versions.push(Version::new(Snapshot::from("draft"), epoch()));
    state.last_saved = Some(epoch() + Duration::seconds(5));
    state.has_unsaved_changes = true;
    insta::assert_snapshot!(
        state_summary("notes", &state),
        @"notes: 1 version(s), last saved 1970-01-01T00:00:05Z, unsaved changes"
    );
}

#[test]
fn test_history_table_lists_every_version() {
    let mut state = SaveState::fresh();
    let newer = Version::new(Snapshot::from("second"), epoch() + Duration::minutes(1));
    let older = Version::new(Snapshot::from("first"), epoch());
    state.versions = vec![newer.clone(), older.clone()];

    let rendered = history_table(&state).to_string();

    assert!(rendered.contains(newer.id.as_str()));
    assert!(rendered.contains(older.id.as_str()));
    assert!(rendered.contains(&newer.content_hash[..12]));
    assert!(rendered.contains("1970-01-01T00:01:00Z"));
}
