//! Link metadata
//!
//! Best effort scraping of the title and descriptions of a link target. Nothing in here surfaces
//! an error: whatever can not be fetched or found is left empty.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use encoding_rs::Encoding;
use encoding_rs::UTF_8;
use moka::future::Cache;
use serde::Serialize;
use url::Url;

pub use client::FetchError;
pub use client::HttpPageClient;
pub use client::PageClient;
pub use client::PageHead;
pub use extract::extract_metadata;

mod client;
mod extract;

/// Hard cap on the downloaded part of a page
pub const MAX_BODY_BYTES: usize = 128 * 1024;

/// How long fetched metadata is reused for the same URL
const CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// How many URLs are kept in the cache
const CACHE_CAPACITY: u64 = 1_024;

/// Scraped metadata of a link target
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkMetadata {
    /// Text of the first `<title>`
    pub title: Option<String>,

    /// `<meta name="description">` content
    pub description: Option<String>,

    /// `<meta property="og:description">` content
    pub og_description: Option<String>,
}

/// Fetches link metadata
pub struct MetadataFetcher<C = HttpPageClient> {
    /// HTTP client, no client means fetching is disabled
    client: Option<Arc<C>>,

    /// Recently fetched metadata by URL
    cache: Cache<String, LinkMetadata>,
}

impl<C> Clone for MetadataFetcher<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<C: PageClient> MetadataFetcher<C> {
    /// Create a fetcher using the given client
    pub fn new(client: C) -> Self {
        Self {
            client: Some(Arc::new(client)),
            cache: new_cache(),
        }
    }

    /// Create a fetcher that never goes out to the network
    pub fn disabled() -> Self {
        Self {
            client: None,
            cache: new_cache(),
        }
    }

    /// Fetch metadata for a target, recently fetched targets come from the cache
    pub async fn fetch_metadata(&self, target: &str, user_agent: &str) -> LinkMetadata {
        if let Some(metadata) = self.cache.get(target).await {
            tracing::debug!("Using cached metadata for {target}");
            return metadata;
        }

        self.fetch_fresh(target, user_agent).await
    }

    /// Fetch metadata for a target, bypassing the cache
    pub async fn fetch_fresh(&self, target: &str, user_agent: &str) -> LinkMetadata {
        let Some(client) = &self.client else {
            return LinkMetadata::default();
        };

        let url = match Url::parse(target) {
            Ok(url) => url,
            Err(err) => {
                tracing::debug!("Not fetching metadata for unparsable URL {target}: {err}");
                return LinkMetadata::default();
            }
        };

        if !matches!(url.scheme(), "http" | "https") {
            tracing::debug!("Not fetching metadata for {} URL", url.scheme());
            return LinkMetadata::default();
        }

        match fetch(client.as_ref(), &url, user_agent).await {
            Ok(metadata) => {
                self.cache.insert(target.to_string(), metadata.clone()).await;
                metadata
            }
            Err(err) => {
                tracing::debug!("Could not fetch metadata for {url}: {err}");
                LinkMetadata::default()
            }
        }
    }
}

fn new_cache() -> Cache<String, LinkMetadata> {
    Cache::builder()
        .max_capacity(CACHE_CAPACITY)
        .time_to_live(CACHE_TTL)
        .build()
}

/// Check the headers, then download and scrape the page
async fn fetch<C: PageClient>(
    client: &C,
    url: &Url,
    user_agent: &str,
) -> Result<LinkMetadata, FetchError> {
    let head = client.head(url, user_agent).await?;

    if !head.is_success() {
        return Err(FetchError::Status(head.status));
    }

    if !head.is_html() {
        tracing::debug!(
            "Skipping metadata for {url}, content type: {}",
            head.content_type.as_deref().unwrap_or_default()
        );
        return Ok(LinkMetadata::default());
    }

    let body = client.get_capped(url, MAX_BODY_BYTES, user_agent).await?;

    Ok(extract_metadata(&decode_body(&body, head.charset())))
}

/// Decode a page with its declared charset, UTF-8 when missing or unknown
///
/// A byte order mark wins over the declared charset
fn decode_body<'a>(body: &'a [u8], charset: Option<&str>) -> Cow<'a, str> {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (text, used_encoding, had_errors) = encoding.decode(body);

    if had_errors {
        tracing::debug!("Page body is not valid {}", used_encoding.name());
    }

    text
}
