use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use crate::{
    models::{cache::CachedImage, error::FetchError},
    utils::{
        candidates::{filter_candidates, pick_random},
        image_fetch::fetch_image,
        listing::ListingFetcher,
    },
};

/// Produces a freshly fetched image, bypassing every cache tier.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_live(&self) -> Result<CachedImage, FetchError>;
}

pub struct FeedImageSource {
    client: Client,
    listing: ListingFetcher,
    min_score: f64,
}

impl FeedImageSource {
    pub fn new(client: Client, listing: ListingFetcher, min_score: f64) -> Self {
        Self {
            client,
            listing,
            min_score,
        }
    }
}

#[async_trait]
impl ImageSource for FeedImageSource {
    async fn fetch_live(&self) -> Result<CachedImage, FetchError> {
        let listing = self.listing.fetch().await?;
        let candidates = filter_candidates(&listing, self.min_score)?;
        let url = pick_random(&candidates).ok_or(FetchError::EmptyCandidateSet)?;

        let image = fetch_image(&self.client, url).await?;
        info!(
            "Fetched {} ({} bytes, {}) from {} candidates",
            url,
            image.data.len(),
            image.content_type,
            candidates.len()
        );
        Ok(CachedImage::new(image.data, image.content_type))
    }
}
