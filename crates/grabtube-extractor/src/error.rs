//! Error types for extractor operations.

use thiserror::Error;

/// Result type for extractor operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors that can occur while resolving or relaying a video.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("yt-dlp not found in PATH")]
    YtDlpNotFound,

    #[error("Extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("No playable formats found")]
    EmptyFormats,

    #[error("Extraction timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl ExtractError {
    /// Create an extraction failure from an upstream message.
    pub fn extraction_failed(message: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            message: message.into(),
        }
    }
}
