use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Listing fetch failed: {0}")]
    UpstreamListing(String),

    #[error("No candidate images in listing")]
    EmptyCandidateSet,

    #[error("Image fetch failed: {0}")]
    UpstreamImage(String),

    #[error("Shared cache error: {0}")]
    SharedCache(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        FetchError::UpstreamImage(error.to_string())
    }
}

impl From<redis::RedisError> for FetchError {
    fn from(error: redis::RedisError) -> Self {
        FetchError::SharedCache(error.to_string())
    }
}

#[derive(Debug)]
pub struct Error {
    pub code: StatusCode,
    pub message: String,
}

impl Error {
    pub fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.code, self.message).into_response()
    }
}

impl From<FetchError> for Error {
    fn from(_: FetchError) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "Failed to fetch image from upstream")
    }
}
