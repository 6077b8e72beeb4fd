use axum::body::Bytes;
use reqwest::{header::CONTENT_TYPE, Client};

use crate::{models::error::FetchError, utils::listing::SERVICE_USER_AGENT};

pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub data: Bytes,
    pub content_type: String,
}

pub fn content_type_for_url(url: &str) -> &'static str {
    let path = url.split('?').next().unwrap_or("");
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => FALLBACK_CONTENT_TYPE,
    }
}

pub async fn fetch_image(client: &Client, url: &str) -> Result<FetchedImage, FetchError> {
    let res = client
        .get(url)
        .header("User-Agent", SERVICE_USER_AGENT)
        .send()
        .await?;

    if !res.status().is_success() {
        return Err(FetchError::UpstreamImage(format!(
            "HTTP {} from {}",
            res.status().as_u16(),
            url
        )));
    }

    let content_type = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| content_type_for_url(url).to_string());

    let data = res.bytes().await?;
    Ok(FetchedImage { data, content_type })
}
