//! Content providers for timed saves.

use crate::types::Snapshot;

/// Supplies the current document content when a timed save fires.
///
/// Returning `None` skips that tick.
pub trait SnapshotSource: Send + Sync {
    fn snapshot(&self) -> Option<Snapshot>;
}

impl<F> SnapshotSource for F
where
    F: Fn() -> Option<Snapshot> + Send + Sync,
{
    fn snapshot(&self) -> Option<Snapshot> {
        self()
    }
}
