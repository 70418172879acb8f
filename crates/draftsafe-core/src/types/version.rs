//! Immutable version records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Snapshot;

/// Identifier of a version, unique within a document's history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    /// A fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for VersionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for VersionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// A snapshot paired with its id and creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: VersionId,
    pub content: Snapshot,
    pub created_at: DateTime<Utc>,
    /// SHA-256 of `content`, computed once at creation.
    pub content_hash: String,
}

impl Version {
    pub fn new(content: Snapshot, created_at: DateTime<Utc>) -> Self {
        let content_hash = content.content_hash();
        Self {
            id: VersionId::generate(),
            content,
            created_at,
            content_hash,
        }
    }
}
