//! Request coalescing for cache misses
//!
//! Extraction is the expensive, rate-limited operation, and bulk population
//! races with on-demand lookups for the same ids. Wrapping resolution in a
//! per-key flight group guarantees that concurrent misses for one id share
//! a single underlying extraction instead of each going to the network.

use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

/// Outcome of waiting on a coalesced flight.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FlightError<E> {
    /// The leader task was dropped or panicked before producing a result.
    #[error("flight leader dropped before completing")]
    LeaderLost,
    /// The underlying operation failed; every waiter sees the same error.
    #[error("{0}")]
    Inner(E),
}

/// Per-key single-flight group.
///
/// Backed by the `async_singleflight` crate, which handles leader failure
/// and retry; this wrapper just fixes the error shape.
pub struct SingleFlight<K, V, E>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    group: Arc<async_singleflight::Group<K, V, E>>,
}

impl<K, V, E> Clone for SingleFlight<K, V, E>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            group: Arc::clone(&self.group),
        }
    }
}

impl<K, V, E> SingleFlight<K, V, E>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            group: Arc::new(async_singleflight::Group::new()),
        }
    }

    /// Run `fut` for `key`, unless a flight for that key is already in
    /// progress, in which case wait for and share its result.
    pub async fn run<Fut>(&self, key: K, fut: Fut) -> Result<V, FlightError<E>>
    where
        Fut: Future<Output = Result<V, E>> + Send,
    {
        // Group::work returns Err(Some(e)) for an inner failure and
        // Err(None) when the leader vanished despite retries.
        self.group.work(&key, fut).await.map_err(|err| match err {
            Some(inner) => FlightError::Inner(inner),
            None => FlightError::LeaderLost,
        })
    }
}

impl<K, V, E> Default for SingleFlight<K, V, E>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn concurrent_flights_for_one_key_run_once() {
        let flight: SingleFlight<String, u32, String> = SingleFlight::new();
        let executions = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let flight = flight.clone();
            let executions = executions.clone();
            handles.push(tokio::spawn(async move {
                flight
                    .run("stream-1".to_string(), async move {
                        sleep(Duration::from_millis(40)).await;
                        executions.fetch_add(1, Ordering::SeqCst);
                        Ok(7)
                    })
                    .await
            }));
        }

        for handle in handles {
            let result = handle.await.expect("task completed");
            assert_eq!(result.expect("flight succeeded"), 7);
        }
        assert_eq!(executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_fly_independently() {
        let flight: SingleFlight<String, u32, String> = SingleFlight::new();
        let executions = Arc::new(AtomicU32::new(0));

        let a = {
            let flight = flight.clone();
            let executions = executions.clone();
            tokio::spawn(async move {
                flight
                    .run("stream-a".to_string(), async move {
                        executions.fetch_add(1, Ordering::SeqCst);
                        Ok(1)
                    })
                    .await
            })
        };
        let b = {
            let flight = flight.clone();
            let executions = executions.clone();
            tokio::spawn(async move {
                flight
                    .run("stream-b".to_string(), async move {
                        executions.fetch_add(1, Ordering::SeqCst);
                        Ok(2)
                    })
                    .await
            })
        };

        assert_eq!(a.await.expect("joined").expect("ok"), 1);
        assert_eq!(b.await.expect("joined").expect("ok"), 2);
        assert_eq!(executions.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn a_failed_flight_does_not_poison_the_key() {
        let flight: SingleFlight<String, u32, String> = SingleFlight::new();

        let first = flight
            .run("stream-1".to_string(), async { Err("boom".to_string()) })
            .await;
        match first {
            Err(FlightError::Inner(message)) => assert_eq!(message, "boom"),
            other => panic!("expected inner error, got {other:?}"),
        }

        let second = flight.run("stream-1".to_string(), async { Ok(9) }).await;
        assert_eq!(second.expect("second flight succeeds"), 9);
    }
}
