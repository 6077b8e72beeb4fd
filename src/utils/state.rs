use std::sync::Arc;

use crate::models::cache::ImageCache;
use crate::utils::config::Config;
use crate::utils::shared_cache::SharedStore;
use crate::utils::source::ImageSource;

pub struct AppState {
    pub config: Config,
    pub cache: ImageCache,
    /// `None` when no shared store is configured or reachable.
    pub shared: Option<Arc<dyn SharedStore>>,
    pub source: Arc<dyn ImageSource>,
}

impl AppState {
    pub fn new(
        config: Config,
        shared: Option<Arc<dyn SharedStore>>,
        source: Arc<dyn ImageSource>,
    ) -> Self {
        let cache = ImageCache::new(config.cache_ttl_secs);
        Self {
            config,
            cache,
            shared,
            source,
        }
    }
}
