//! Engine facade
//!
//! [`StreamService`] wires the catalog, cache, resolver, populator and
//! invalidator together and exposes the operations the request-handling
//! layer consumes. Cheap to clone; clones share all state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tracing::warn;

use focustream_providers::{MediaExtractor, UrlValidator};

use crate::cache::StreamCache;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::invalidation::CacheInvalidator;
use crate::models::StreamRecord;
use crate::populator::{BatchReport, BulkPopulator, PopulateOptions};
use crate::resolver::StreamResolver;

/// The stream resolution and cache engine.
#[derive(Clone)]
pub struct StreamService {
    catalog: Catalog,
    cache: Arc<StreamCache>,
    resolver: Arc<StreamResolver>,
    populator: BulkPopulator,
    invalidator: CacheInvalidator,
    workers: usize,
}

impl StreamService {
    /// Wire the engine from an already-loaded catalog.
    #[must_use]
    pub fn new(
        catalog: Catalog,
        extractor: Arc<dyn MediaExtractor>,
        validator: Arc<dyn UrlValidator>,
        config: &Config,
    ) -> Self {
        let cache = Arc::new(StreamCache::new());
        let resolver = Arc::new(StreamResolver::new(
            extractor.clone(),
            validator,
            cache.clone(),
            config.resolver.clone(),
        ));
        let populator = BulkPopulator::new(resolver.clone());
        let invalidator = CacheInvalidator::new(cache.clone(), extractor, populator.clone());

        Self {
            catalog,
            cache,
            resolver,
            populator,
            invalidator,
            workers: config.populator.workers,
        }
    }

    /// Wire the engine, loading the catalog from the configured file.
    pub fn from_config(
        config: &Config,
        extractor: Arc<dyn MediaExtractor>,
        validator: Arc<dyn UrlValidator>,
    ) -> Result<Self> {
        let catalog = Catalog::from_json_file(&config.catalog.path)?;
        Ok(Self::new(catalog, extractor, validator, config))
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolve a single stream by id.
    pub async fn resolve_one(&self, category: &str, external_id: &str) -> Result<StreamRecord> {
        self.resolver.resolve(category, external_id).await
    }

    /// Resolve every stream of a category, in catalog order.
    ///
    /// Individual failures are dropped from the response; an unknown
    /// category is an error naming the valid ones.
    pub async fn resolve_category(&self, category: &str) -> Result<Vec<StreamRecord>> {
        let Some(ids) = self.catalog.ids(category) else {
            return Err(Error::UnknownCategory {
                category: category.to_string(),
                known: self.catalog.categories(),
            });
        };

        let resolved: Vec<Option<StreamRecord>> = futures::stream::iter(ids.iter().cloned())
            .map(|external_id| {
                let resolver = Arc::clone(&self.resolver);
                let category = category.to_string();
                async move {
                    match resolver.resolve(&category, &external_id).await {
                        Ok(record) => Some(record),
                        Err(err) => {
                            warn!(
                                external_id = %external_id,
                                error = %err,
                                "dropping stream from category response"
                            );
                            None
                        }
                    }
                }
            })
            .buffered(self.workers.max(1))
            .collect()
            .await;

        Ok(resolved.into_iter().flatten().collect())
    }

    /// Run a population pass over the whole catalog.
    pub async fn populate_all(&self, options: PopulateOptions) -> BatchReport {
        self.populator.populate(&self.catalog, options).await
    }

    /// Wipe the cache and the extractor's internal state.
    pub async fn invalidate_all(&self) {
        self.invalidator.invalidate_all(&self.catalog).await;
    }

    /// Number of live cached records.
    #[must_use]
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    /// When the last population pass ran to completion.
    #[must_use]
    pub fn last_populated(&self) -> Option<DateTime<Utc>> {
        self.populator.last_populated()
    }
}
