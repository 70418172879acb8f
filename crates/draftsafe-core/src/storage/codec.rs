//! Save state serialization.
//!
//! ```text
//! +------------------+
//! | Magic: "DSV\x01" | 4 bytes - state identification
//! +------------------+
//! | Version: 1       | 4 bytes - u32 little-endian schema version
//! +------------------+
//! | JSON payload     | Variable - serde_json encoded SaveState
//! +------------------+
//! ```

use crate::error::{StorageError, StorageResult};
use crate::types::{CURRENT_SCHEMA_VERSION, MAGIC_BYTES, SaveState};

const HEADER_LEN: usize = 8;

/// Serialize a save state to bytes.
pub fn encode_state(state: &SaveState) -> StorageResult<Vec<u8>> {
    let payload =
        serde_json::to_vec(state).map_err(|source| StorageError::Serialization { source })?;

    let mut output = Vec::with_capacity(HEADER_LEN + payload.len());
    output.extend_from_slice(&MAGIC_BYTES);
    output.extend_from_slice(&CURRENT_SCHEMA_VERSION.to_le_bytes());
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Parse bytes produced by [`encode_state`], validating the header.
pub fn decode_state(bytes: &[u8]) -> StorageResult<SaveState> {
    // Smallest JSON object is "{}"
    if bytes.len() < HEADER_LEN + 2 {
        return Err(StorageError::InvalidFormat {
            reason: "state too small".to_string(),
        });
    }

    if bytes[0..4] != MAGIC_BYTES {
        return Err(StorageError::InvalidFormat {
            reason: "invalid magic bytes".to_string(),
        });
    }

    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version > CURRENT_SCHEMA_VERSION {
        return Err(StorageError::UnsupportedVersion {
            found: version,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    serde_json::from_slice(&bytes[HEADER_LEN..])
        .map_err(|source| StorageError::Deserialization { source })
}
