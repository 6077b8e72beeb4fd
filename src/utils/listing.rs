use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::from_str;
use tracing::{debug, warn};

use crate::models::{error::FetchError, listing::Listing};

pub const LISTING_LIMIT: u32 = 100;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const BROWSER_ACCEPT: &str = "application/json,text/html;q=0.9,*/*;q=0.8";
const BROWSER_REFERER: &str = "https://www.reddit.com/";
pub const SERVICE_USER_AGENT: &str = "random-image/1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSet {
    Browser,
    Default,
}

#[derive(Debug, Clone)]
pub struct RequestVariant {
    pub url: String,
    pub headers: HeaderSet,
}

impl RequestVariant {
    pub fn new(url: impl Into<String>, headers: HeaderSet) -> Self {
        Self {
            url: url.into(),
            headers,
        }
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self.headers {
            HeaderSet::Browser => request
                .header("User-Agent", BROWSER_USER_AGENT)
                .header("Accept", BROWSER_ACCEPT)
                .header("Referer", BROWSER_REFERER),
            HeaderSet::Default => request.header("User-Agent", SERVICE_USER_AGENT),
        }
    }
}

/// Host aliases and header sets tried in order against the hot listing.
pub fn default_variants(subreddit: &str) -> Vec<RequestVariant> {
    vec![
        RequestVariant::new(
            format!("https://www.reddit.com/r/{subreddit}/hot.json?limit={LISTING_LIMIT}"),
            HeaderSet::Browser,
        ),
        RequestVariant::new(
            format!("https://old.reddit.com/r/{subreddit}/hot.json?limit={LISTING_LIMIT}"),
            HeaderSet::Browser,
        ),
        RequestVariant::new(
            format!("https://api.reddit.com/r/{subreddit}/hot?limit={LISTING_LIMIT}"),
            HeaderSet::Default,
        ),
        RequestVariant::new(
            format!("https://www.reddit.com/r/{subreddit}/hot.json?limit={LISTING_LIMIT}"),
            HeaderSet::Default,
        ),
    ]
}

#[derive(Clone)]
pub struct ListingFetcher {
    client: Client,
    variants: Vec<RequestVariant>,
}

impl ListingFetcher {
    pub fn new(client: Client, variants: Vec<RequestVariant>) -> Self {
        Self { client, variants }
    }

    pub async fn fetch(&self) -> Result<Listing, FetchError> {
        let mut last_error: Option<String> = None;

        for variant in &self.variants {
            match self.try_variant(variant).await {
                Ok(listing) => {
                    debug!("Listing fetched from {}", variant.url);
                    return Ok(listing);
                }
                Err(None) => {
                    warn!("Listing request to {} was forbidden, trying next", variant.url);
                }
                Err(Some(reason)) => {
                    warn!("Listing request to {} failed: {}", variant.url, reason);
                    last_error = Some(reason);
                }
            }
        }

        Err(FetchError::UpstreamListing(
            last_error.unwrap_or_else(|| "all listing variants failed".to_string()),
        ))
    }

    /// `Err(None)` marks a 403, which is skipped without replacing the last error.
    async fn try_variant(&self, variant: &RequestVariant) -> Result<Listing, Option<String>> {
        let res = variant
            .apply(self.client.get(&variant.url))
            .send()
            .await
            .map_err(|e| Some(e.to_string()))?;

        let status = res.status();
        if status == StatusCode::FORBIDDEN {
            return Err(None);
        }
        if !status.is_success() {
            return Err(Some(format!("HTTP {} from {}", status.as_u16(), variant.url)));
        }

        let body = res.text().await.map_err(|e| Some(e.to_string()))?;
        from_str::<Listing>(&body).map_err(|e| Some(format!("invalid listing JSON: {e}")))
    }
}
