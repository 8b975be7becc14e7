//! Store error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading or persisting the OTA state document
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store file exists but cannot be read or parsed. This is a
    /// fatal startup condition; no partial recovery is attempted.
    #[error("Failed to load store from {path:?}: {reason}")]
    LoadFailed {
        /// Store file path
        path: PathBuf,
        /// Failure reason
        reason: String,
    },

    /// The state could not be written to disk. The in-memory state is
    /// unaffected by this failure and remains authoritative.
    #[error("Failed to persist store to {path:?}: {reason}")]
    SaveFailed {
        /// Store file path
        path: PathBuf,
        /// Failure reason
        reason: String,
    },

    /// The state document could not be serialized
    #[error("Failed to serialize store state: {0}")]
    Serialize(#[from] serde_json::Error),
}
