//! Metadata extractor interface
//!
//! The extractor is the expensive, rate-limited collaborator: one call per
//! external media id, returning the full rendition list. Implementations
//! wrap whatever metadata source the deployment uses; the engine only
//! depends on this trait.

use async_trait::async_trait;

use crate::error::ExtractorError;
use crate::types::ExtractedMetadata;

/// External metadata source for media ids.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Resolve one external id to its metadata and rendition list.
    ///
    /// Fails with [`ExtractorError`] when the source is unavailable or
    /// rejects the id. Implementations should not retry internally; the
    /// engine decides retry policy.
    async fn fetch_metadata(&self, external_id: &str) -> Result<ExtractedMetadata, ExtractorError>;

    /// Drop any caching state the extractor keeps internally.
    ///
    /// Called when the engine invalidates its own cache so both sides
    /// start from scratch.
    async fn drop_internal_cache(&self);
}
