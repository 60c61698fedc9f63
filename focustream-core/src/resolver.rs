//! Stream resolution
//!
//! Turns one (category, external id) pair into a playable [`StreamRecord`]:
//! cache lookup, metadata extraction, rendition selection, optional
//! liveness validation, cache write. Extraction and the probe are the only
//! suspension points and both sit under per-call timeouts.
//!
//! Concurrent resolutions for the *same* id coalesce into a single
//! in-flight extraction; every concurrent caller gets that one outcome.
//! Cache writes for a key only ever happen inside its flight, so two
//! racing writers can never get past selection/validation independently.

use std::sync::Arc;

use chrono::Utc;
use focustream_providers::{MediaExtractor, UrlValidator};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::cache::{FlightError, SingleFlight, StreamCache};
use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::models::StreamRecord;
use crate::selector::{self, QualityPolicy};

/// Per-id state walk: absent → resolving → cached (success) or absent
/// (failure, nothing written) → expired → absent again.
pub struct StreamResolver {
    extractor: Arc<dyn MediaExtractor>,
    validator: Arc<dyn UrlValidator>,
    cache: Arc<StreamCache>,
    flight: SingleFlight<String, StreamRecord, Error>,
    config: ResolverConfig,
}

impl StreamResolver {
    #[must_use]
    pub fn new(
        extractor: Arc<dyn MediaExtractor>,
        validator: Arc<dyn UrlValidator>,
        cache: Arc<StreamCache>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            extractor,
            validator,
            cache,
            flight: SingleFlight::new(),
            config,
        }
    }

    /// The cache this resolver writes to.
    #[must_use]
    pub fn cache(&self) -> &Arc<StreamCache> {
        &self.cache
    }

    /// Resolve with the default quality policy (best bitrate, any container).
    pub async fn resolve(&self, category: &str, external_id: &str) -> Result<StreamRecord> {
        self.resolve_with_policy(category, external_id, QualityPolicy::default())
            .await
    }

    /// Resolve one external id to a playable stream record.
    ///
    /// A cache hit short-circuits before any network traffic. On a miss the
    /// extraction runs inside the per-id flight group, so concurrent misses
    /// for one id cost a single extractor call.
    pub async fn resolve_with_policy(
        &self,
        category: &str,
        external_id: &str,
        policy: QualityPolicy,
    ) -> Result<StreamRecord> {
        if external_id.trim().is_empty() {
            return Err(Error::EmptyStreamId);
        }

        if let Some(record) = self.cache.get(external_id) {
            debug!(external_id = %external_id, "stream cache hit");
            return Ok(record);
        }

        let outcome = self
            .flight
            .run(
                external_id.to_string(),
                self.resolve_uncached(category, external_id, policy),
            )
            .await;

        match outcome {
            Ok(record) => Ok(record),
            Err(FlightError::Inner(err)) => Err(err),
            Err(FlightError::LeaderLost) => Err(Error::Internal(format!(
                "resolution for {external_id} was abandoned mid-flight"
            ))),
        }
    }

    async fn resolve_uncached(
        &self,
        category: &str,
        external_id: &str,
        policy: QualityPolicy,
    ) -> Result<StreamRecord> {
        // A caller that missed the fast-path lookup but won the flight only
        // after a previous flight cached this id must not extract again.
        if let Some(record) = self.cache.get(external_id) {
            return Ok(record);
        }

        let metadata = match timeout(
            self.config.extraction_timeout(),
            self.extractor.fetch_metadata(external_id),
        )
        .await
        {
            Ok(Ok(metadata)) => metadata,
            Ok(Err(err)) => {
                debug!(external_id = %external_id, error = %err, "extraction failed");
                return Err(err.into());
            }
            Err(_) => {
                return Err(Error::Extraction(format!(
                    "metadata extraction for {external_id} timed out"
                )))
            }
        };

        let best = selector::best_audio(&metadata.renditions, &policy).ok_or_else(|| {
            Error::NoAudioOnly {
                external_id: external_id.to_string(),
            }
        })?;

        let now = Utc::now();
        let record = StreamRecord {
            category: category.to_string(),
            title: metadata.title.clone(),
            author: metadata.author.clone(),
            external_id: external_id.to_string(),
            duration_seconds: metadata.duration_seconds,
            url: best.url.clone(),
            resolved_at: now,
            source_expires_at: now + self.config.source_lifespan(),
        };

        if self.config.validate_urls && !self.probe(&record.url).await {
            // Hand the record back uncached: the next resolve re-extracts
            // instead of serving a URL we already know is dead.
            warn!(
                external_id = %external_id,
                "resolved URL failed the liveness probe, skipping cache write"
            );
            return Ok(record);
        }

        self.cache.put(record.clone(), self.config.cache_ttl());
        debug!(
            external_id = %external_id,
            bitrate_bps = best.bitrate_bps,
            ext = %best.ext,
            "stream resolved and cached"
        );
        Ok(record)
    }

    async fn probe(&self, url: &str) -> bool {
        timeout(self.config.probe_timeout(), self.validator.probe(url))
            .await
            .unwrap_or(false)
    }
}
