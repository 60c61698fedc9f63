//! In-memory stream record cache with per-entry expiry
//!
//! Keyed by external id; at most one live record per id. An expired entry
//! is semantically absent the moment its deadline passes, even while still
//! physically stored: `get` never returns it and `len` never counts it.
//! Eviction is lazy (a read of an expired entry removes it) with an
//! explicit [`StreamCache::sweep`] for bulk cleanup.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::models::StreamRecord;

#[derive(Debug, Clone)]
struct CacheEntry {
    record: StreamRecord,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Concurrent record store; reads on distinct keys never contend.
#[derive(Debug, Default)]
pub struct StreamCache {
    entries: DashMap<String, CacheEntry>,
}

impl StreamCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the live record for an id, if any.
    ///
    /// Reading an expired entry evicts it and reports a miss.
    pub fn get(&self, external_id: &str) -> Option<StreamRecord> {
        let expired = match self.entries.get(external_id) {
            Some(entry) if !entry.is_expired() => return Some(entry.record.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            // Re-check under the removal lock: a fresh put may have raced in.
            self.entries
                .remove_if(external_id, |_, entry| entry.is_expired());
        }
        None
    }

    /// Store a record for `ttl`, replacing any previous entry for the id.
    pub fn put(&self, record: StreamRecord, ttl: Duration) {
        let entry = CacheEntry {
            expires_at: Instant::now() + ttl,
            record,
        };
        self.entries.insert(entry.record.external_id.clone(), entry);
    }

    /// Remove the entry for an id. Returns whether a live entry was removed.
    pub fn delete(&self, external_id: &str) -> bool {
        self.entries
            .remove(external_id)
            .is_some_and(|(_, entry)| !entry.is_expired())
    }

    /// Drop every entry, live or expired.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of live (non-expired) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.is_expired())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Physically remove every expired entry. Returns how many were swept.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before - self.entries.len()
    }
}
