//! Bulk cache population
//!
//! Drives the resolver over a whole catalog under a bounded worker pool.
//! A best-effort sweep, not a transaction: one id failing is recorded in
//! the batch report and never aborts the rest.
//!
//! Two execution modes:
//! - **wait** (default): blocks until every dispatched resolution finished,
//!   returns full counts, cancellable at any point between dispatches;
//! - **fire-and-forget**: enqueues the work on a detached task and returns
//!   immediately, chunking the catalog with a pause between chunks. This
//!   exists for callers that themselves run under a hard execution-time
//!   ceiling and cannot wait out a full sweep; prefer wait mode otherwise.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::PopulatorConfig;
use crate::resolver::StreamResolver;

/// Execution mode for a population pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopulateMode {
    /// Block until all dispatched resolutions finish.
    #[default]
    Wait,
    /// Dispatch on a detached task and return immediately.
    FireAndForget,
}

/// Options for one population pass.
#[derive(Debug, Clone)]
pub struct PopulateOptions {
    /// Worker pool width: at most this many extractions in flight.
    pub width: usize,
    pub mode: PopulateMode,
    /// Fire-and-forget only: ids dispatched per chunk.
    pub chunk_size: usize,
    /// Fire-and-forget only: pause between chunks.
    pub chunk_pause: Duration,
    /// Wait mode only: cancelling stops further dispatch; in-flight work
    /// finishes or times out on its own.
    pub cancel: CancellationToken,
}

impl PopulateOptions {
    #[must_use]
    pub fn from_config(config: &PopulatorConfig) -> Self {
        Self {
            width: config.workers,
            mode: PopulateMode::Wait,
            chunk_size: config.chunk_size,
            chunk_pause: config.chunk_pause(),
            cancel: CancellationToken::new(),
        }
    }
}

impl Default for PopulateOptions {
    fn default() -> Self {
        Self::from_config(&PopulatorConfig::default())
    }
}

/// One id that failed during a population pass.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BatchFailure {
    pub category: String,
    pub external_id: String,
    pub reason: String,
}

/// Outcome of a population pass.
///
/// In fire-and-forget mode only `attempted` is meaningful and `detached`
/// is set; the per-id outcomes happen after the report is returned.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Ids never dispatched because the pass was cancelled first.
    pub skipped: usize,
    pub cancelled: bool,
    pub detached: bool,
    pub failures: Vec<BatchFailure>,
    pub elapsed_ms: u64,
}

/// Catalog-wide cache warmer. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct BulkPopulator {
    resolver: Arc<StreamResolver>,
    last_populated: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl BulkPopulator {
    #[must_use]
    pub fn new(resolver: Arc<StreamResolver>) -> Self {
        Self {
            resolver,
            last_populated: Arc::new(RwLock::new(None)),
        }
    }

    /// When the last population pass ran to completion, if any has.
    #[must_use]
    pub fn last_populated(&self) -> Option<DateTime<Utc>> {
        *self.last_populated.read()
    }

    /// Forget the last-populated stamp (cache was invalidated).
    pub fn reset_last_populated(&self) {
        *self.last_populated.write() = None;
    }

    fn stamp(&self) {
        *self.last_populated.write() = Some(Utc::now());
    }

    /// Run one population pass over the catalog.
    pub async fn populate(&self, catalog: &Catalog, options: PopulateOptions) -> BatchReport {
        match options.mode {
            PopulateMode::Wait => self.populate_wait(catalog, options).await,
            PopulateMode::FireAndForget => self.dispatch_detached(catalog, options),
        }
    }

    async fn populate_wait(&self, catalog: &Catalog, options: PopulateOptions) -> BatchReport {
        let started = Instant::now();
        let pairs: Vec<(String, String)> = catalog.all_pairs().collect();
        let total = pairs.len();
        let semaphore = Arc::new(Semaphore::new(options.width.max(1)));
        let mut tasks = JoinSet::new();

        let mut dispatched = 0usize;
        for (category, external_id) in pairs {
            // A permit gates dispatch, so at most `width` resolutions are
            // in flight; cancellation wins over a free permit.
            let permit = tokio::select! {
                biased;
                () = options.cancel.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            dispatched += 1;
            let resolver = Arc::clone(&self.resolver);
            tasks.spawn(async move {
                let _permit = permit;
                let outcome = resolver.resolve(&category, &external_id).await;
                (category, external_id, outcome)
            });
        }

        let mut report = BatchReport {
            attempted: total,
            skipped: total - dispatched,
            cancelled: options.cancel.is_cancelled(),
            ..BatchReport::default()
        };

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, _, Ok(_))) => report.succeeded += 1,
                Ok((category, external_id, Err(err))) => {
                    debug!(
                        category = %category,
                        external_id = %external_id,
                        error = %err,
                        "stream failed to resolve during population"
                    );
                    report.failed += 1;
                    report.failures.push(BatchFailure {
                        category,
                        external_id,
                        reason: err.to_string(),
                    });
                }
                Err(join_err) => {
                    warn!(error = %join_err, "population worker did not complete");
                    report.failed += 1;
                }
            }
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        if !report.cancelled {
            self.stamp();
        }
        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            cancelled = report.cancelled,
            elapsed_ms = report.elapsed_ms,
            "population pass finished"
        );
        report
    }

    fn dispatch_detached(&self, catalog: &Catalog, options: PopulateOptions) -> BatchReport {
        let pairs: Vec<(String, String)> = catalog.all_pairs().collect();
        let total = pairs.len();
        let populator = self.clone();

        tokio::spawn(async move {
            let semaphore = Arc::new(Semaphore::new(options.width.max(1)));
            let mut tasks = JoinSet::new();
            let chunk_size = options.chunk_size.max(1);
            let chunk_count = pairs.len().div_ceil(chunk_size);

            for (index, chunk) in pairs.chunks(chunk_size).enumerate() {
                for (category, external_id) in chunk.iter().cloned() {
                    let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                        return;
                    };
                    let resolver = Arc::clone(&populator.resolver);
                    tasks.spawn(async move {
                        let _permit = permit;
                        if let Err(err) = resolver.resolve(&category, &external_id).await {
                            debug!(
                                external_id = %external_id,
                                error = %err,
                                "background resolution failed"
                            );
                        }
                    });
                }
                if index + 1 < chunk_count {
                    tokio::time::sleep(options.chunk_pause).await;
                }
            }

            while tasks.join_next().await.is_some() {}
            populator.stamp();
            info!(total, "background population finished");
        });

        info!(total, "population dispatched in the background");
        BatchReport {
            attempted: total,
            detached: true,
            ..BatchReport::default()
        }
    }
}
