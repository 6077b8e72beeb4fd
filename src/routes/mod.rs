use std::{error::Error, sync::Arc};

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt, Registry};

use crate::{
    handlers::image::get_random_image,
    utils::{
        config::Config,
        listing::{default_variants, ListingFetcher},
        shared_cache::{RedisStore, SharedStore},
        source::{FeedImageSource, ImageSource},
        state::AppState,
    },
};

fn init_tracing(log_level: &str) {
    let level = match log_level {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let filter = filter::Targets::new()
        .with_target("tower_http::trace::on_response", Level::TRACE)
        .with_target("tower_http::trace::on_request", Level::TRACE)
        .with_target("tower_http::trace::make_span", Level::DEBUG)
        .with_target("axum::rejection", Level::TRACE)
        .with_target(env!("CARGO_CRATE_NAME"), level)
        .with_default(Level::INFO);

    let tracing_layer = tracing_subscriber::fmt::layer();

    Registry::default().with(tracing_layer).with(filter).init();
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(get_random_image))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn connect_shared(config: &Config) -> Option<Arc<dyn SharedStore>> {
    let url = config.redis_url.as_deref()?;
    match RedisStore::connect(url, config.cache_ttl_secs as u64).await {
        Ok(store) => {
            info!("Shared cache enabled");
            Some(Arc::new(store))
        }
        Err(e) => {
            warn!("Shared cache unavailable, continuing without it: {}", e);
            None
        }
    }
}

pub async fn make_app(config: Config) -> Result<Router, Box<dyn Error>> {
    init_tracing(&config.log_level);

    info!("Initializing application...");
    let http_client = reqwest::Client::builder().build()?;

    let listing = ListingFetcher::new(http_client.clone(), default_variants(&config.subreddit));
    let source: Arc<dyn ImageSource> =
        Arc::new(FeedImageSource::new(http_client, listing, config.min_score));
    let shared = connect_shared(&config).await;

    let state = Arc::new(AppState::new(config, shared, source));
    info!(
        "Serving r/{} with min score {} and TTL {}s",
        state.config.subreddit, state.config.min_score, state.config.cache_ttl_secs
    );
    info!("Application initialized successfully");

    Ok(build_router(state))
}
