//! Shared provider types
//!
//! The rendition list returned by a metadata extractor. A rendition is one
//! specific encoded stream the external source offers for a media item,
//! distinguished by container extension, codecs and bitrate.

use serde::{Deserialize, Serialize};

/// One encoded stream offered by the external source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rendition {
    /// Average bitrate in bits per second
    pub bitrate_bps: u64,

    /// Container extension (e.g., "m4a", "webm", "mp3")
    pub ext: String,

    /// Audio codec name, absent for video-only renditions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,

    /// Video codec name, absent for audio-only renditions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,

    /// Direct playback URL
    pub url: String,
}

impl Rendition {
    /// Whether this rendition carries audio and no video track.
    #[must_use]
    pub fn is_audio_only(&self) -> bool {
        self.audio_codec.is_some() && self.video_codec.is_none()
    }
}

/// Metadata the extractor resolves for one external media id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractedMetadata {
    /// Media title as reported by the source
    pub title: String,

    /// Uploader / channel name
    pub author: String,

    /// Total duration in seconds, when the source reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,

    /// Every rendition the source offers for this item
    pub renditions: Vec<Rendition>,
}
