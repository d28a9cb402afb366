//! HTTP fetching with a short, fixed timeout
//!
//! The engine runs inside a cooperative tick loop, so every request is
//! bounded by one configured timeout and there is no retry here: retrying
//! is the tick scheduler's job, on its own cadence. Non-success statuses
//! and connection failures map to typed [`FetchError`] variants that the
//! engine treats identically (skip, retry next eligible tick).

use std::time::Duration;

use crate::cache::ResourceCache;
use crate::error::FetchError;

/// Thin HTTP client wrapper with a per-request timeout bound.
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    /// Create a fetcher whose requests all time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the client cannot be created.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    /// GET a URL and return the response body as text.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Err(FetchError::Timeout),
            Err(e) if e.is_connect() => return Err(FetchError::Unavailable(e.to_string())),
            Err(e) => return Err(FetchError::Http(e)),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Http(e)
            }
        })
    }

    /// Fetch a URL through the cache.
    ///
    /// Order of preference: a cache entry within `ttl`; the network (the
    /// body is cached on success); any stale cache entry as a last resort.
    /// A failed cache access behaves exactly like a miss.
    pub async fn get_cached(
        &self,
        cache: &mut ResourceCache,
        url: &str,
        ttl: Duration,
    ) -> Result<String, FetchError> {
        if let Some(body) = cache.read_fresh(url, ttl) {
            return Ok(body);
        }
        match self.get_text(url).await {
            Ok(body) => {
                cache.write(url, &body);
                Ok(body)
            }
            Err(net_err) => cache.read_any(url).ok_or(net_err),
        }
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher").finish_non_exhaustive()
    }
}
