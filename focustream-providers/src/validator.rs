//! Stream URL liveness probe
//!
//! Resolved stream URLs are signed and expire upstream; a URL that looked
//! fine at extraction time can already be dead. The validator answers one
//! question: is this URL worth caching right now?

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

const USER_AGENT: &str = "focustream/0.1";

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared HTTP client for all probe requests (connection pooling).
static SHARED_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(10)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .expect("failed to build shared probe HTTP client")
});

/// Reachability check for a resolved stream URL.
#[async_trait]
pub trait UrlValidator: Send + Sync {
    /// Probe a URL. `true` means the URL currently serves content.
    async fn probe(&self, url: &str) -> bool;
}

/// HEAD-based probe against the real URL.
///
/// A 2xx/3xx answer counts as reachable. CDN edges that reject HEAD
/// (405/501) get a second chance with a one-byte ranged GET before the
/// URL is declared dead. Network errors and timeouts are unreachable,
/// never propagated.
pub struct HttpUrlValidator {
    client: Client,
    timeout: Duration,
}

impl HttpUrlValidator {
    /// Create a validator using the shared connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_PROBE_TIMEOUT)
    }

    /// Create a validator with a per-probe timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: SHARED_CLIENT.clone(),
            timeout,
        }
    }

    async fn head(&self, url: &str) -> Result<StatusCode, reqwest::Error> {
        let resp = self
            .client
            .head(url)
            .timeout(self.timeout)
            .send()
            .await?;
        Ok(resp.status())
    }

    async fn ranged_get(&self, url: &str) -> Result<StatusCode, reqwest::Error> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::RANGE, "bytes=0-0")
            .timeout(self.timeout)
            .send()
            .await?;
        Ok(resp.status())
    }
}

impl Default for HttpUrlValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlValidator for HttpUrlValidator {
    async fn probe(&self, url: &str) -> bool {
        let status = match self.head(url).await {
            Ok(status) => status,
            Err(err) => {
                tracing::debug!(url = %url, error = %err, "HEAD probe failed");
                return false;
            }
        };

        if status.is_success() || status.is_redirection() {
            return true;
        }

        // Some CDN edges refuse HEAD outright; retry with a ranged GET.
        if status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED {
            return match self.ranged_get(url).await {
                Ok(status) => status.is_success(),
                Err(err) => {
                    tracing::debug!(url = %url, error = %err, "ranged GET probe failed");
                    false
                }
            };
        }

        tracing::debug!(url = %url, status = %status, "probe rejected");
        false
    }
}
