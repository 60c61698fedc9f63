//! Shared extractor error types
//!
//! Common error enum used by every `MediaExtractor` implementation so the
//! engine can treat upstream failures uniformly.

use thiserror::Error;

/// Error type for metadata extraction against the external source.
#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream rejected {id}: {message}")]
    Upstream { id: String, message: String },

    #[error("Invalid media id: {0}")]
    InvalidId(String),

    #[error("Metadata response malformed: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ExtractorError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
