//! Terminal rendering for command output.

use chrono::SecondsFormat;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use draftsafe_core::{Conflict, SaveState, Snapshot};
use serde_json::Value;

const SHORT_HASH_LEN: usize = 12;

/// Version history as a table, newest first.
pub fn history_table(state: &SaveState) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Version"),
        header_cell("Saved"),
        header_cell("Hash"),
        header_cell("Size"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);

    for (index, version) in state.versions.iter().enumerate() {
        let id_cell = if index == 0 {
            Cell::new(version.id.as_str()).add_attribute(Attribute::Bold)
        } else {
            Cell::new(version.id.as_str())
        };
        table.add_row(vec![
            Cell::new(index),
            id_cell,
            Cell::new(format_timestamp(version.created_at)),
            dim_cell(short_hash(&version.content_hash)),
            Cell::new(version.content.as_value().to_string().len()),
        ]);
    }
    table
}

/// One-line summary of the save state.
pub fn state_summary(key: &str, state: &SaveState) -> String {
    let saved = state
        .last_saved
        .map_or_else(|| "never".to_string(), format_timestamp);
    format!(
        "{key}: {} version(s), last saved {saved}{}",
        state.versions.len(),
        if state.has_unsaved_changes {
            ", unsaved changes"
        } else {
            ""
        }
    )
}

/// Human-readable description of a conflict.
pub fn conflict_line(conflict: &Conflict) -> String {
    format!(
        "{} and {} diverge: saved {} apart, detected {}",
        short_id(conflict.version_a.as_str()),
        short_id(conflict.version_b.as_str()),
        format_gap(conflict.gap_ms),
        format_timestamp(conflict.detected_at),
    )
}

/// Compact duration such as `45s`, `3m 12s` or `2h 5m`.
pub fn format_gap(gap_ms: i64) -> String {
    let gap_ms = gap_ms.unsigned_abs();
    if gap_ms < 1_000 {
        return format!("{gap_ms}ms");
    }
    let secs = gap_ms / 1_000;
    let (hours, minutes, seconds) = (secs / 3_600, (secs % 3_600) / 60, secs % 60);
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, _) => format!("{minutes}m {seconds}s"),
        _ => format!("{hours}h {minutes}m"),
    }
}

/// Leading characters of a content hash.
pub fn short_hash(hash: &str) -> &str {
    hash.get(..SHORT_HASH_LEN).unwrap_or(hash)
}

/// Snapshot content as printed by `restore`.
///
/// String snapshots print raw so text files round-trip unchanged.
pub fn snapshot_text(snapshot: &Snapshot) -> String {
    match snapshot.as_value() {
        Value::String(text) => text.clone(),
        value => serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn format_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_formatting() {
        assert_eq!(format_gap(250), "250ms");
        assert_eq!(format_gap(45_000), "45s");
        assert_eq!(format_gap(192_000), "3m 12s");
        assert_eq!(format_gap(7_500_000), "2h 5m");
        assert_eq!(format_gap(-45_000), "45s");
    }

    #[test]
    fn test_short_hash_handles_short_input() {
        assert_eq!(short_hash("abc"), "abc");
        assert_eq!(short_hash("0123456789abcdef"), "0123456789ab");
    }

    #[test]
    fn test_string_snapshots_print_raw() {
        assert_eq!(snapshot_text(&Snapshot::from("plain text")), "plain text");
        let json = Snapshot::new(serde_json::json!({"a": 1}));
        assert_eq!(snapshot_text(&json), "{\n  \"a\": 1\n}");
    }
}
