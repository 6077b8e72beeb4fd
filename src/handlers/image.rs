use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use http::{header, HeaderMap, HeaderValue, StatusCode};
use tracing::{debug, warn};

use crate::{
    models::{cache::CachedImage, error::Error},
    utils::{image_fetch::FALLBACK_CONTENT_TYPE, state::AppState},
};

pub const CACHE_CONTROL_VALUE: &str = "public, s-maxage=600, stale-while-revalidate=60";
pub const SOURCE_HEADER: &str = "x-cache-source";
pub const STALE_HEADER: &str = "x-cache-stale";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    Shared,
    Local,
    Live,
    Stale,
}

fn image_response(image: &CachedImage, origin: ImageOrigin) -> Response {
    let mut headers = HeaderMap::new();
    let content_type = HeaderValue::from_str(&image.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
    headers.insert(header::CONTENT_TYPE, content_type);

    match origin {
        ImageOrigin::Stale => {
            headers.insert(STALE_HEADER, HeaderValue::from_static("true"));
        }
        ImageOrigin::Shared => {
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_VALUE));
            headers.insert(SOURCE_HEADER, HeaderValue::from_static("shared"));
        }
        ImageOrigin::Local | ImageOrigin::Live => {
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_VALUE));
        }
    }

    (StatusCode::OK, headers, image.data.clone()).into_response()
}

/// Falls back to the last cached image when a live fetch fails.
pub async fn get_random_image(State(state): State<Arc<AppState>>) -> Result<Response, Error> {
    if let Some(shared) = &state.shared {
        match shared.load().await {
            Ok(Some(image)) => {
                debug!("Serving image from shared cache");
                let image = state.cache.replace(image);
                return Ok(image_response(&image, ImageOrigin::Shared));
            }
            Ok(None) => {}
            Err(e) => warn!("Shared cache read failed: {}", e),
        }
    }

    if let Some(image) = state.cache.fresh() {
        debug!("Serving image from local cache");
        return Ok(image_response(&image, ImageOrigin::Local));
    }

    match state.source.fetch_live().await {
        Ok(image) => {
            let image = state.cache.replace(image);
            if let Some(shared) = &state.shared {
                if let Err(e) = shared.store(&image).await {
                    warn!("Shared cache write failed: {}", e);
                }
            }
            Ok(image_response(&image, ImageOrigin::Live))
        }
        Err(e) => match state.cache.current() {
            Some(image) => {
                warn!("Live fetch failed, serving stale image: {}", e);
                Ok(image_response(&image, ImageOrigin::Stale))
            }
            None => {
                warn!("Live fetch failed with nothing cached: {}", e);
                Err(e.into())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::error::FetchError,
        routes::build_router,
        utils::{config::Config, shared_cache::SharedStore, source::ImageSource},
    };
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body, Bytes};
    use axum::http::Request;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct StubSource {
        body: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(body: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                body,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageSource for StubSource {
        async fn fetch_live(&self) -> Result<CachedImage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.body {
                Some(body) => Ok(CachedImage::new(
                    Bytes::from_static(body.as_bytes()),
                    "image/png".to_string(),
                )),
                None => Err(FetchError::UpstreamListing("HTTP 503".to_string())),
            }
        }
    }

    #[derive(Default)]
    struct StubShared {
        held: Mutex<Option<CachedImage>>,
        broken: bool,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl SharedStore for StubShared {
        async fn load(&self) -> Result<Option<CachedImage>, FetchError> {
            if self.broken {
                return Err(FetchError::SharedCache("connection refused".to_string()));
            }
            Ok(self.held.lock().unwrap().clone())
        }

        async fn store(&self, image: &CachedImage) -> Result<(), FetchError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(FetchError::SharedCache("connection refused".to_string()));
            }
            *self.held.lock().unwrap() = Some(image.clone());
            Ok(())
        }
    }

    fn test_config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            subreddit: "pics".to_string(),
            min_score: 50.0,
            cache_ttl_secs: 600,
            redis_url: None,
            log_level: "info".to_string(),
        }
    }

    fn state_with(
        source: Arc<StubSource>,
        shared: Option<Arc<StubShared>>,
    ) -> Arc<AppState> {
        let shared = shared.map(|s| s as Arc<dyn SharedStore>);
        Arc::new(AppState::new(test_config(), shared, source))
    }

    fn aged_image(body: &'static str, seconds: i64) -> CachedImage {
        CachedImage {
            fetched_at: Utc::now() - Duration::seconds(seconds),
            data: Bytes::from_static(body.as_bytes()),
            content_type: "image/jpeg".to_string(),
        }
    }

    async fn get(state: &Arc<AppState>) -> Response {
        build_router(state.clone())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_of(response: Response) -> Bytes {
        to_bytes(response.into_body(), usize::MAX).await.unwrap()
    }

    #[tokio::test]
    async fn live_fetch_then_fresh_hit_without_upstream() {
        let source = StubSource::new(Some("live-bytes"));
        let state = state_with(source.clone(), None);

        let response = get(&state).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(response.headers()[header::CACHE_CONTROL], CACHE_CONTROL_VALUE);
        assert!(response.headers().get(STALE_HEADER).is_none());
        let first = body_of(response).await;
        assert_eq!(first, "live-bytes");
        assert_eq!(source.calls(), 1);

        let response = get(&state).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await, first);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn expired_cache_is_refreshed() {
        let source = StubSource::new(Some("new-bytes"));
        let state = state_with(source.clone(), None);
        state.cache.replace(aged_image("old-bytes", 700));

        let response = get(&state).await;
        assert_eq!(body_of(response).await, "new-bytes");
        assert_eq!(source.calls(), 1);
        assert_eq!(state.cache.fresh().unwrap().data, "new-bytes");
    }

    #[tokio::test]
    async fn stale_fallback_when_upstream_fails() {
        let source = StubSource::new(None);
        let state = state_with(source.clone(), None);
        state.cache.replace(aged_image("old-bytes", 700));

        let response = get(&state).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[STALE_HEADER], "true");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
        assert_eq!(body_of(response).await, "old-bytes");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn bad_gateway_without_any_cache() {
        let state = state_with(StubSource::new(None), None);

        let response = get(&state).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_of(response).await,
            "Failed to fetch image from upstream"
        );
    }

    #[tokio::test]
    async fn shared_hit_skips_upstream_and_fills_local() {
        let source = StubSource::new(Some("live-bytes"));
        let shared = Arc::new(StubShared::default());
        *shared.held.lock().unwrap() = Some(aged_image("shared-bytes", 30));
        let state = state_with(source.clone(), Some(shared));

        let response = get(&state).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[SOURCE_HEADER], "shared");
        assert_eq!(response.headers()[header::CACHE_CONTROL], CACHE_CONTROL_VALUE);
        assert_eq!(body_of(response).await, "shared-bytes");
        assert_eq!(source.calls(), 0);
        assert_eq!(state.cache.current().unwrap().data, "shared-bytes");
    }

    #[tokio::test]
    async fn live_fetch_is_written_to_shared_tier() {
        let source = StubSource::new(Some("live-bytes"));
        let shared = Arc::new(StubShared::default());
        let state = state_with(source.clone(), Some(shared.clone()));

        let response = get(&state).await;
        assert!(response.headers().get(SOURCE_HEADER).is_none());
        assert_eq!(body_of(response).await, "live-bytes");
        assert_eq!(shared.writes.load(Ordering::SeqCst), 1);
        assert_eq!(
            shared.held.lock().unwrap().as_ref().unwrap().data,
            "live-bytes"
        );
    }

    #[tokio::test]
    async fn broken_shared_tier_is_not_fatal() {
        let source = StubSource::new(Some("live-bytes"));
        let shared = Arc::new(StubShared {
            broken: true,
            ..StubShared::default()
        });
        let state = state_with(source.clone(), Some(shared.clone()));

        let response = get(&state).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await, "live-bytes");
        assert_eq!(shared.writes.load(Ordering::SeqCst), 1);

        let response = get(&state).await;
        assert_eq!(body_of(response).await, "live-bytes");
        assert_eq!(source.calls(), 1);
    }
}
