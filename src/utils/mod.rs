pub mod candidates;
pub mod config;
pub mod image_fetch;
pub mod listing;
pub mod shared_cache;
pub mod source;
pub mod state;
