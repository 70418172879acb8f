//! Conflict descriptors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::VersionId;

/// Two versions that look like the product of uncoordinated edit sessions.
///
/// Informational only; the service never resolves conflicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// The newer of the two versions.
    pub version_a: VersionId,
    /// The older of the two versions.
    pub version_b: VersionId,
    pub detected_at: DateTime<Utc>,
    /// Milliseconds between the two versions' creation times.
    pub gap_ms: i64,
}
