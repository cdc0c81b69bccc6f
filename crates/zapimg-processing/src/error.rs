//! Processing error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Encode failed: {0}")]
    Encode(String),

    /// Bad transcode parameters (crop rectangle, duration, scale target).
    #[error("Invalid transcode spec: {0}")]
    InvalidSpec(String),

    #[error("Transcode failed: {0}")]
    TranscodeFailed(String),

    #[error("Transcode timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
