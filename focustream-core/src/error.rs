use focustream_providers::ExtractorError;
use thiserror::Error;

/// Upstream error text is capped at this length before it reaches callers.
const MAX_UPSTREAM_MESSAGE_LEN: usize = 300;

/// Engine error type.
///
/// `Clone` is required: the single-flight path hands one resolution outcome
/// to every concurrent waiter for the same id.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid stream id: id must be a non-empty string")]
    EmptyStreamId,

    #[error("Invalid category: {category}. Should be one of {known:?}")]
    UnknownCategory { category: String, known: Vec<String> },

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("No audio-only rendition available for {external_id}")]
    NoAudioOnly { external_id: String },

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ExtractorError> for Error {
    fn from(err: ExtractorError) -> Self {
        Self::Extraction(normalize_upstream_message(&err.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Normalize upstream error text into a stable, loggable message.
///
/// Collapses all whitespace runs, strips the extractor's `ERROR:` prefix
/// and caps the length so pathological upstream bodies cannot leak into
/// responses verbatim.
pub(crate) fn normalize_upstream_message(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed
        .strip_prefix("ERROR:")
        .map_or(collapsed.as_str(), str::trim_start);

    let mut message = trimmed.to_string();
    if message.len() > MAX_UPSTREAM_MESSAGE_LEN {
        let mut cut = MAX_UPSTREAM_MESSAGE_LEN;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
        message.push('…');
    }
    message
}
