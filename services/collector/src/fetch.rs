//! Resource fetching with a read-through cache.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::error::FetchError;

/// Raw response body as returned by a [`Transport`].
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// A downloaded resource plus capture metadata.
#[derive(Debug, Clone, Serialize)]
pub struct FetchedResource {
    pub url: String,
    #[serde(skip)]
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub content_hash: String,
    pub size_bytes: usize,
    pub fetched_at: DateTime<Utc>,
}

impl FetchedResource {
    pub fn new(url: &str, bytes: Bytes, content_type: Option<String>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let content_hash = format!("sha256:{:x}", hasher.finalize());

        Self {
            url: url.to_string(),
            size_bytes: bytes.len(),
            bytes,
            content_type,
            content_hash,
            fetched_at: Utc::now(),
        }
    }
}

/// Something that can GET a URL. The HTTP implementation is
/// [`HttpTransport`]; tests plug in an in-memory one.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> impl Future<Output = Result<Download, FetchError>> + Send;
}

/// `reqwest`-backed transport. Uses the client's own timeout; no retries.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Download, FetchError> {
        let http_err = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(http_err)?;

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = resp.bytes().await.map_err(http_err)?;

        Ok(Download {
            bytes,
            content_type,
        })
    }
}

/// Fetches resources through a [`Transport`], consulting the cache first.
pub struct Fetcher<T = HttpTransport> {
    transport: T,
    cache: Arc<ResponseCache>,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T) -> Self {
        Self::with_cache(transport, Arc::new(ResponseCache::new()))
    }

    pub fn with_cache(transport: T, cache: Arc<ResponseCache>) -> Self {
        Self { transport, cache }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Return the cached resource for `url`, or download and cache it.
    /// Failures are returned as-is and never cached.
    pub async fn fetch(&self, url: &str) -> Result<Arc<FetchedResource>, FetchError> {
        if let Some(hit) = self.cache.get(url) {
            debug!(url, "cache hit");
            return Ok(hit);
        }

        info!(url, "fetching");
        let download = self.transport.get(url).await?;
        let resource = FetchedResource::new(url, download.bytes, download.content_type);

        info!(
            url,
            size_bytes = resource.size_bytes,
            content_hash = %resource.content_hash,
            content_type = resource.content_type.as_deref().unwrap_or("unknown"),
            "downloaded"
        );

        Ok(self.cache.insert(resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory transport that counts calls.
    #[derive(Default)]
    struct StaticTransport {
        bodies: HashMap<String, &'static [u8]>,
        calls: AtomicUsize,
    }

    impl StaticTransport {
        fn with(url: &str, body: &'static [u8]) -> Self {
            let mut t = Self::default();
            t.bodies.insert(url.to_string(), body);
            t
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Transport for StaticTransport {
        async fn get(&self, url: &str) -> Result<Download, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.bodies.get(url) {
                Some(body) => Ok(Download {
                    bytes: Bytes::from_static(body),
                    content_type: Some("text/csv".to_string()),
                }),
                None => Err(FetchError::Transport {
                    url: url.to_string(),
                    message: "404 Not Found".to_string(),
                }),
            }
        }
    }

    const URL: &str = "https://example.org/data.csv";

    // -------------------------------------------------------------------------
    // CACHE BEHAVIOUR
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_fetch_populates_cache() {
        let fetcher = Fetcher::new(StaticTransport::with(URL, b"country,year\n"));

        let resource = fetcher.fetch(URL).await.unwrap();

        assert_eq!(resource.bytes.as_ref(), b"country,year\n");
        assert_eq!(resource.size_bytes, 13);
        assert_eq!(resource.content_type.as_deref(), Some("text/csv"));
        assert!(fetcher.cache().contains(URL));
    }

    #[tokio::test]
    async fn test_repeated_fetch_uses_cache() {
        let fetcher = Fetcher::new(StaticTransport::with(URL, b"a\n1\n"));

        let first = fetcher.fetch(URL).await.unwrap();
        let second = fetcher.fetch(URL).await.unwrap();

        assert_eq!(fetcher.transport.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let fetcher = Fetcher::new(StaticTransport::with(URL, b"a\n1\n"));

        fetcher.fetch(URL).await.unwrap();
        assert!(fetcher.cache().invalidate(URL));
        fetcher.fetch(URL).await.unwrap();

        assert_eq!(fetcher.transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_shared_cache_across_fetchers() {
        let cache = Arc::new(ResponseCache::new());
        let a = Fetcher::with_cache(StaticTransport::with(URL, b"x\n"), cache.clone());
        let b = Fetcher::with_cache(StaticTransport::with(URL, b"x\n"), cache.clone());

        a.fetch(URL).await.unwrap();
        b.fetch(URL).await.unwrap();

        assert_eq!(a.transport.calls(), 1);
        assert_eq!(b.transport.calls(), 0);
    }

    // -------------------------------------------------------------------------
    // FAILURES
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_failure_carries_url_and_is_not_cached() {
        let fetcher = Fetcher::new(StaticTransport::default());

        let err = fetcher.fetch(URL).await.unwrap_err();
        assert_eq!(err.url(), URL);
        assert!(err.to_string().contains("404"));
        assert!(!fetcher.cache().contains(URL));

        fetcher.fetch(URL).await.unwrap_err();
        assert_eq!(fetcher.transport.calls(), 2);
    }

    // -------------------------------------------------------------------------
    // METADATA
    // -------------------------------------------------------------------------

    #[test]
    fn test_content_hash_is_sha256() {
        let resource = FetchedResource::new(URL, Bytes::from_static(b"abc"), None);
        assert_eq!(
            resource.content_hash,
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
