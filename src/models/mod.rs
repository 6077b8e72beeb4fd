pub mod cache;
pub mod error;
pub mod listing;
