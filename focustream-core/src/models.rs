//! Resolved stream records
//!
//! A [`StreamRecord`] is the materialized outcome of one successful
//! resolution. Records are immutable: re-resolution produces a new record
//! that replaces the old one in the cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One resolved, playable audio stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamRecord {
    /// Catalog category this stream belongs to
    pub category: String,

    /// Media title as reported by the source
    pub title: String,

    /// Uploader / channel name
    pub author: String,

    /// External media id the record was resolved from
    pub external_id: String,

    /// Total duration in seconds, when the source reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,

    /// Direct playback URL of the selected audio rendition
    pub url: String,

    /// When this record was resolved
    pub resolved_at: DateTime<Utc>,

    /// When the upstream URL itself is believed to stop working.
    ///
    /// Informational only, derived from a fixed source lifespan; independent
    /// of how long the record stays cached.
    pub source_expires_at: DateTime<Utc>,
}

impl StreamRecord {
    /// Duration formatted as `HH:MM:SS`, or `None` when unknown.
    #[must_use]
    pub fn duration_display(&self) -> Option<String> {
        self.duration_seconds.map(format_duration)
    }
}

/// Format a duration in seconds as `HH:MM:SS`.
#[must_use]
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
