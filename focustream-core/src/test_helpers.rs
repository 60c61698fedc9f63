//! Counting fakes shared by the engine tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use focustream_providers::{ExtractedMetadata, ExtractorError, MediaExtractor, Rendition, UrlValidator};
use parking_lot::Mutex;

/// In-memory extractor that fabricates metadata and counts everything the
/// engine does to it: total calls, peak concurrency, cache drops.
#[derive(Default)]
pub struct FakeExtractor {
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    cache_drops: AtomicUsize,
    failures: Mutex<HashMap<String, String>>,
    video_only_ids: Mutex<Vec<String>>,
}

impl FakeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `fetch_metadata` call sleeps for `delay`, so tests can overlap
    /// calls deliberately.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Make `fetch_metadata` fail for one id with the given upstream text.
    pub fn fail_with(&self, external_id: &str, message: &str) {
        self.failures
            .lock()
            .insert(external_id.to_string(), message.to_string());
    }

    /// Serve only muxed video renditions for one id.
    pub fn serve_video_only(&self, external_id: &str) {
        self.video_only_ids.lock().push(external_id.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn cache_drops(&self) -> usize {
        self.cache_drops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaExtractor for FakeExtractor {
    async fn fetch_metadata(&self, external_id: &str) -> Result<ExtractedMetadata, ExtractorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(message) = self.failures.lock().get(external_id) {
            return Err(ExtractorError::Upstream {
                id: external_id.to_string(),
                message: message.clone(),
            });
        }

        let renditions = if self.video_only_ids.lock().contains(&external_id.to_string()) {
            vec![Rendition {
                bitrate_bps: 2_000_000,
                ext: "mp4".to_string(),
                audio_codec: Some("aac".to_string()),
                video_codec: Some("h264".to_string()),
                url: format!("https://cdn.example.com/{external_id}.mp4"),
            }]
        } else {
            vec![
                Rendition {
                    bitrate_bps: 128_000,
                    ext: "m4a".to_string(),
                    audio_codec: Some("aac".to_string()),
                    video_codec: None,
                    url: format!("https://cdn.example.com/{external_id}.m4a"),
                },
                Rendition {
                    bitrate_bps: 160_000,
                    ext: "webm".to_string(),
                    audio_codec: Some("opus".to_string()),
                    video_codec: None,
                    url: format!("https://cdn.example.com/{external_id}.webm"),
                },
            ]
        };

        Ok(ExtractedMetadata {
            title: format!("title for {external_id}"),
            author: "fake author".to_string(),
            duration_seconds: Some(3600),
            renditions,
        })
    }

    async fn drop_internal_cache(&self) {
        self.cache_drops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Validator answering every probe the same way, counting probes.
pub struct FakeValidator {
    reachable: bool,
    probes: AtomicUsize,
}

impl FakeValidator {
    pub fn reachable() -> Self {
        Self {
            reachable: true,
            probes: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            probes: AtomicUsize::new(0),
        }
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UrlValidator for FakeValidator {
    async fn probe(&self, _url: &str) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.reachable
    }
}
