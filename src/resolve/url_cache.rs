//! TTL-gated artifact cache for remote URL fetches
//!
//! Fetched bodies are ordinary content-addressed objects; the cache itself is
//! only a pointer table keyed by URL string, persisted as the named document
//! `url-cache.json`. A pointer past its TTL is disqualified from a cache hit
//! but never evicted, and the object it points at stays addressable.

use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::store::{content_id, Metadata, ObjectStore};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;

/// Fixed name of the cache pointer document in the store root
pub const CACHE_DOCUMENT: &str = "url-cache.json";

/// Cache pointer for one URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedArtifact {
    /// The fetched URL
    pub url: String,
    /// Object holding the fetched body
    pub object_id: String,
    /// When the body was fetched
    pub fetched_at: DateTime<Utc>,
}

/// A fetched response body
#[derive(Debug, Clone)]
pub struct FetchedPayload {
    /// Response body, possibly truncated to the configured cap
    pub body: String,
    /// Content-Type header value, empty if absent
    pub content_type: String,
}

/// Network seam for URL fetching.
///
/// The production implementation is [`HttpFetcher`]; tests substitute a
/// scripted fetcher.
#[async_trait]
pub trait UrlFetcher: Send + Sync {
    /// Fetch a URL, failing on transport errors and HTTP error statuses
    async fn fetch(&self, url: &str) -> Result<FetchedPayload>;
}

/// reqwest-backed fetcher with timeout and body size cap
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpFetcher {
    /// Build a fetcher from cache configuration
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.fetch_timeout_secs))
            .user_agent("tidepool-resolver/0.1")
            .build()?;

        Ok(Self {
            client,
            max_bytes: config.max_fetch_bytes,
        })
    }
}

#[async_trait]
impl UrlFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPayload> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let bytes = response.bytes().await?;
        let capped = &bytes[..bytes.len().min(self.max_bytes)];

        Ok(FetchedPayload {
            body: String::from_utf8_lossy(capped).into_owned(),
            content_type,
        })
    }
}

/// Result of resolving a URL through the cache
#[derive(Debug, Clone)]
pub struct UrlArtifact {
    /// Object holding the body
    pub object_id: String,
    /// The body text
    pub content: String,
    /// When the body was originally fetched
    pub fetched_at: DateTime<Utc>,
    /// Whether this came from a valid cache pointer
    pub cache_hit: bool,
}

/// TTL-gated pointer layer over the object store for URL fetches
pub struct UrlArtifactCache {
    objects: Arc<ObjectStore>,
    fetcher: Box<dyn UrlFetcher>,
    ttl: Duration,
    pointers: RwLock<HashMap<String, CachedArtifact>>,
}

impl UrlArtifactCache {
    /// Open the cache, loading persisted pointers if present
    pub async fn new(
        objects: Arc<ObjectStore>,
        fetcher: Box<dyn UrlFetcher>,
        config: &CacheConfig,
    ) -> Self {
        let pointers = match Self::load_pointers(&objects).await {
            Ok(pointers) => pointers,
            Err(e) => {
                tracing::info!("Creating new URL cache: {e}");
                HashMap::new()
            }
        };

        Self {
            objects,
            fetcher,
            ttl: Duration::seconds(config.url_ttl_secs as i64),
            pointers: RwLock::new(pointers),
        }
    }

    /// Resolve a URL, serving from cache within the TTL window.
    ///
    /// A miss or stale pointer triggers a fresh fetch; the body is stored as
    /// a new content-addressed object and the pointer for this URL is
    /// replaced. The previous object is never deleted.
    pub async fn resolve(&self, url: &str) -> Result<UrlArtifact> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| Error::InvalidReference(format!("unparseable URL '{url}': {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::InvalidReference(format!(
                "unsupported URL scheme '{}' in '{url}'",
                parsed.scheme()
            )));
        }

        if let Some(pointer) = self.valid_pointer(url).await {
            match self.objects.read(&pointer.object_id).await {
                Ok(content) => {
                    tracing::debug!("URL cache hit: {url}");
                    return Ok(UrlArtifact {
                        object_id: pointer.object_id,
                        content: String::from_utf8_lossy(&content).into_owned(),
                        fetched_at: pointer.fetched_at,
                        cache_hit: true,
                    });
                }
                Err(e) => {
                    tracing::warn!("Cached object for {url} unreadable, refetching: {e}");
                }
            }
        }

        tracing::debug!("URL cache miss: {url}, fetching");
        let payload = self.fetcher.fetch(url).await?;

        let content = if payload.content_type.to_lowercase().contains("html") {
            extract_text_from_html(&payload.body)
        } else {
            payload.body
        };

        let mut meta = Metadata::new("url");
        meta.title = url.to_string();
        meta.description = format!("Fetched artifact from {url}");
        meta.tags = vec!["url".to_string(), "fetched-artifact".to_string()];
        meta.paths = vec![format!("/urls/{}", content_id(url.as_bytes()))];

        let object_id = self
            .objects
            .store_with_metadata(content.as_bytes(), meta)
            .await?;

        let fetched_at = Utc::now();
        {
            let mut pointers = self.pointers.write().await;
            pointers.insert(
                url.to_string(),
                CachedArtifact {
                    url: url.to_string(),
                    object_id: object_id.clone(),
                    fetched_at,
                },
            );
            if let Err(e) = Self::persist_pointers(&self.objects, &pointers).await {
                tracing::warn!("Failed to persist URL cache: {e}");
            }
        }

        Ok(UrlArtifact {
            object_id,
            content,
            fetched_at,
            cache_hit: false,
        })
    }

    /// The pointer for a URL, if present and within the TTL window
    async fn valid_pointer(&self, url: &str) -> Option<CachedArtifact> {
        let pointers = self.pointers.read().await;
        let pointer = pointers.get(url)?;
        if Utc::now().signed_duration_since(pointer.fetched_at) < self.ttl {
            Some(pointer.clone())
        } else {
            None
        }
    }

    async fn load_pointers(objects: &ObjectStore) -> Result<HashMap<String, CachedArtifact>> {
        let data = objects.read_named(CACHE_DOCUMENT).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    async fn persist_pointers(
        objects: &ObjectStore,
        pointers: &HashMap<String, CachedArtifact>,
    ) -> Result<()> {
        let data = serde_json::to_vec_pretty(pointers)?;
        objects.write_named(CACHE_DOCUMENT, &data).await
    }
}

/// Strip scripts, styles, and tags from HTML, collapsing whitespace
pub fn extract_text_from_html(html: &str) -> String {
    static SCRIPT: OnceLock<Regex> = OnceLock::new();
    static STYLE: OnceLock<Regex> = OnceLock::new();
    static TAG: OnceLock<Regex> = OnceLock::new();
    static SPACE: OnceLock<Regex> = OnceLock::new();

    let script = SCRIPT.get_or_init(|| Regex::new(r"(?s)<script[^>]*>.*?</script>").unwrap());
    let style = STYLE.get_or_init(|| Regex::new(r"(?s)<style[^>]*>.*?</style>").unwrap());
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());
    let space = SPACE.get_or_init(|| Regex::new(r"\s+").unwrap());

    let text = script.replace_all(html, "");
    let text = style.replace_all(&text, "");
    let text = tag.replace_all(&text, " ");
    let text = space.replace_all(&text, " ");
    text.trim().to_string()
}
