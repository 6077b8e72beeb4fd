//! Optional cross-instance tier backed by Redis, so replicas converge on one image per TTL window.

use std::fmt;

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{cache::CachedImage, error::FetchError};

pub const DATA_KEY: &str = "random-image:data";
pub const META_KEY: &str = "random-image:meta";

#[async_trait]
pub trait SharedStore: Send + Sync {
    /// `Ok(None)` when either key is missing or the metadata is unusable.
    async fn load(&self) -> Result<Option<CachedImage>, FetchError>;
    async fn store(&self, image: &CachedImage) -> Result<(), FetchError>;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SharedMeta {
    pub content_type: String,
    /// Epoch milliseconds.
    pub fetched_at: i64,
}

impl SharedMeta {
    pub fn from_image(image: &CachedImage) -> Self {
        Self {
            content_type: image.content_type.clone(),
            fetched_at: image.fetched_at.timestamp_millis(),
        }
    }

    pub fn into_image(self, data: Bytes) -> Option<CachedImage> {
        let fetched_at = DateTime::<Utc>::from_timestamp_millis(self.fetched_at)?;
        if self.content_type.is_empty() {
            return None;
        }
        Some(CachedImage {
            fetched_at,
            data,
            content_type: self.content_type,
        })
    }
}

/// Either key missing counts as a miss.
pub fn image_from_parts(
    data: Option<Vec<u8>>,
    meta: Option<String>,
) -> Result<Option<CachedImage>, FetchError> {
    let (Some(data), Some(meta)) = (data, meta) else {
        debug!("Shared cache MISS");
        return Ok(None);
    };
    if data.is_empty() {
        return Ok(None);
    }

    let meta: SharedMeta = serde_json::from_str(&meta)
        .map_err(|e| FetchError::SharedCache(format!("bad metadata: {e}")))?;
    Ok(meta.into_image(Bytes::from(data)))
}

#[derive(Clone)]
pub struct RedisStore {
    conn_manager: ConnectionManager,
    ttl_secs: u64,
    redis_url: String,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("redis_url", &self.redis_url)
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl RedisStore {
    pub async fn connect(redis_url: &str, ttl_secs: u64) -> Result<Self, FetchError> {
        info!("Connecting shared cache at {}", redis_url);
        let client = redis::Client::open(redis_url)?;
        let conn_manager = ConnectionManager::new(client).await?;
        Ok(Self {
            conn_manager,
            ttl_secs,
            redis_url: redis_url.to_string(),
        })
    }
}

#[async_trait]
impl SharedStore for RedisStore {
    async fn load(&self) -> Result<Option<CachedImage>, FetchError> {
        let mut conn = self.conn_manager.clone();
        let (data, meta): (Option<Vec<u8>>, Option<String>) =
            conn.mget(&[DATA_KEY, META_KEY][..]).await?;
        image_from_parts(data, meta)
    }

    async fn store(&self, image: &CachedImage) -> Result<(), FetchError> {
        let meta = serde_json::to_string(&SharedMeta::from_image(image))
            .map_err(|e| FetchError::SharedCache(e.to_string()))?;
        let mut conn = self.conn_manager.clone();
        conn.set_ex::<_, _, ()>(DATA_KEY, image.data.to_vec(), self.ttl_secs)
            .await?;
        conn.set_ex::<_, _, ()>(META_KEY, meta, self.ttl_secs).await?;
        debug!("Shared cache SETEX with TTL {}s", self.ttl_secs);
        Ok(())
    }
}
