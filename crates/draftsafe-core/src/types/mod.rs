//! Document state types.
//!
//! These are the values handed to callers and listeners, and the payload
//! written to storage.

mod conflict;
mod snapshot;
mod state;
mod version;

pub use conflict::Conflict;
pub use snapshot::Snapshot;
pub use state::SaveState;
pub use version::{Version, VersionId};

/// Current schema version of serialized save states.
///
/// Increment this when making breaking changes to the stored layout.
/// Decoding rejects states with version > CURRENT_SCHEMA_VERSION.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Magic bytes at the start of every serialized save state.
///
/// Format: "DSV" + format byte (0x01)
pub const MAGIC_BYTES: [u8; 4] = [b'D', b'S', b'V', 0x01];
