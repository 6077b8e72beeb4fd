use std::sync::{Arc, RwLock};

use axum::body::Bytes;
use chrono::{DateTime, Duration, Utc};

#[derive(Clone, Debug, PartialEq)]
pub struct CachedImage {
    pub fetched_at: DateTime<Utc>,
    pub data: Bytes,
    pub content_type: String,
}

impl CachedImage {
    pub fn new(data: Bytes, content_type: String) -> Self {
        Self {
            fetched_at: Utc::now(),
            data,
            content_type,
        }
    }

    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.fetched_at < ttl
    }
}

/// Local single-slot tier. Writers swap the whole `Arc`, readers clone it out.
pub struct ImageCache {
    ttl: Duration,
    slot: RwLock<Option<Arc<CachedImage>>>,
}

impl ImageCache {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_seconds),
            slot: RwLock::new(None),
        }
    }

    pub fn current(&self) -> Option<Arc<CachedImage>> {
        self.slot
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }

    pub fn fresh(&self) -> Option<Arc<CachedImage>> {
        let now = Utc::now();
        self.current().filter(|image| image.is_fresh(self.ttl, now))
    }

    pub fn replace(&self, image: CachedImage) -> Arc<CachedImage> {
        let image = Arc::new(image);
        *self.slot.write().unwrap_or_else(|err| err.into_inner()) = Some(image.clone());
        image
    }
}
