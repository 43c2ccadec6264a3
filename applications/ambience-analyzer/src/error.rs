/// Analyzer application error types
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid asset path: {0}")]
    InvalidAsset(String),

    #[error("Asset id {asset_id} already used by {} in this batch", first.display())]
    DuplicateAsset { asset_id: String, first: PathBuf },

    #[error("Analysis failed: {0}")]
    Loudness(#[from] ambience_loudness::LoudnessError),

    #[error("Profile store error: {0}")]
    Storage(#[from] ambience_storage::StorageError),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}
