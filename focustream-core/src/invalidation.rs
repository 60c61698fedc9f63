//! Cache invalidation
//!
//! Wipes every resolved record for a catalog and tells the extractor to
//! drop its own internal state, so the next resolution round starts from
//! scratch on both sides. Idempotent; safe against an empty or partially
//! populated cache.

use std::sync::Arc;

use focustream_providers::MediaExtractor;
use tracing::info;

use crate::cache::StreamCache;
use crate::catalog::Catalog;
use crate::populator::BulkPopulator;

/// Clears engine-side and extractor-side caching state together.
#[derive(Clone)]
pub struct CacheInvalidator {
    cache: Arc<StreamCache>,
    extractor: Arc<dyn MediaExtractor>,
    populator: BulkPopulator,
}

impl CacheInvalidator {
    #[must_use]
    pub fn new(
        cache: Arc<StreamCache>,
        extractor: Arc<dyn MediaExtractor>,
        populator: BulkPopulator,
    ) -> Self {
        Self {
            cache,
            extractor,
            populator,
        }
    }

    /// Drop the cache entry of every id in the catalog, sweep whatever
    /// expired in the meantime, and reset the extractor and the
    /// last-populated stamp.
    pub async fn invalidate_all(&self, catalog: &Catalog) {
        let mut removed = 0usize;
        for (_, external_id) in catalog.all_pairs() {
            if self.cache.delete(&external_id) {
                removed += 1;
            }
        }
        let swept = self.cache.sweep();

        self.extractor.drop_internal_cache().await;
        self.populator.reset_last_populated();

        info!(removed, swept, "stream cache invalidated");
    }
}
