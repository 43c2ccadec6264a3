//! Error types for loudness analysis

use thiserror::Error;

/// Result type for loudness operations
pub type Result<T> = std::result::Result<T, LoudnessError>;

/// Errors that can occur during loudness analysis
#[derive(Error, Debug)]
pub enum LoudnessError {
    /// Invalid sample rate
    #[error("Invalid sample rate: {0} Hz (must be between 8000 and 384000)")]
    InvalidSampleRate(u32),

    /// Invalid channel count
    #[error("Invalid channel count: {0} (must be 1-8)")]
    InvalidChannelCount(usize),

    /// Channel buffers of a planar source differ in length
    #[error("Channel {channel} has {actual} frames, expected {expected}")]
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },

    /// Interleaved sample count is not a multiple of the channel count
    #[error("Sample count {samples} is not divisible by channel count {channels}")]
    InterleavedLength { samples: usize, channels: usize },

    /// The source has no frames to analyze
    #[error("No audio frames provided for analysis")]
    NoFrames,

    /// A frame range was requested past the end of the source
    #[error("Frame range starting at {start} is out of bounds (source has {total} frames)")]
    FrameOutOfRange { start: u64, total: u64 },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Unsupported file format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Decoder failed mid-stream or could not be created
    #[error("Decode failed: {0}")]
    DecodeError(String),

    /// Worker pool could not be built
    #[error("Failed to start analysis workers: {0}")]
    WorkerPool(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<symphonia::core::errors::Error> for LoudnessError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        match err {
            symphonia::core::errors::Error::IoError(e) => Self::IoError(e),
            symphonia::core::errors::Error::Unsupported(what) => {
                Self::UnsupportedFormat(what.to_string())
            }
            other => Self::DecodeError(other.to_string()),
        }
    }
}
