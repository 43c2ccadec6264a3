/// Storage-specific errors
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// The store file exists but cannot be parsed
    #[error("Profile store at {path} is corrupt: {message}")]
    CorruptStore { path: PathBuf, message: String },

    /// A mutation was applied in memory but could not be written to disk
    ///
    /// The in-memory state stays authoritative for this process; the change
    /// will not survive a restart.
    #[error("Failed to persist profile store to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A profile holds a value JSON cannot represent (NaN or infinity)
    #[error("Profile for {asset_id} has non-finite {field}")]
    InvalidProfile {
        asset_id: String,
        field: &'static str,
    },

    /// No platform data directory could be determined
    #[error("No application data directory available on this platform")]
    NoDataDirectory,

    /// Serialization/deserialization error
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Whether the error leaves in-memory state intact and usable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Persist { .. })
    }
}
