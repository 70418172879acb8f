//! Opaque document content.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Document content at a point in time.
///
/// The service never looks inside a snapshot; it only compares and hashes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Value);

impl Snapshot {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// SHA-256 of the JSON encoding, hex encoded.
    ///
    /// Object keys are sorted by `serde_json`'s default map, so equal
    /// snapshots hash equally.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl From<Value> for Snapshot {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&str> for Snapshot {
    fn from(text: &str) -> Self {
        Self(Value::String(text.to_string()))
    }
}

impl From<String> for Snapshot {
    fn from(text: String) -> Self {
        Self(Value::String(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equal_content_hashes_equally() {
        let a = Snapshot::new(json!({"text": "hello", "cursor": 3}));
        let b = Snapshot::new(json!({"cursor": 3, "text": "hello"}));
        assert_eq!(a, b);
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_different_content_hashes_differently() {
        let a = Snapshot::from("draft one");
        let b = Snapshot::from("draft two");
        assert_ne!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash().len(), 64);
    }
}
