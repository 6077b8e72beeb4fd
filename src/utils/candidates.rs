use rand::Rng;

use crate::models::{error::FetchError, listing::Listing, listing::Post};

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// True when the path ends in a known image extension, optionally followed by a query string.
pub fn is_image_url(url: &str) -> bool {
    let path = url.split('?').next().unwrap_or("");
    let Some((_, ext)) = path.rsplit_once('.') else {
        return false;
    };
    IMAGE_EXTENSIONS
        .iter()
        .any(|known| ext.eq_ignore_ascii_case(known))
}

pub fn decode_amp(url: &str) -> String {
    url.replace("&amp;", "&")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn link_url(post: &Post) -> Option<&str> {
    non_empty(post.url_overridden_by_dest.as_deref()).or_else(|| non_empty(post.url.as_deref()))
}

pub fn resolve_url(post: &Post) -> Option<String> {
    link_url(post)
        .or_else(|| non_empty(post.preview_url()))
        .map(decode_amp)
        .filter(|url| !url.is_empty())
}

fn looks_like_image(post: &Post) -> bool {
    link_url(post).is_some_and(is_image_url)
        || post.post_hint.as_deref() == Some("image")
        || non_empty(post.preview_url()).is_some()
}

pub fn filter_candidates(listing: &Listing, min_score: f64) -> Result<Vec<String>, FetchError> {
    let images: Vec<&Post> = listing.posts().filter(|post| looks_like_image(post)).collect();

    let (popular, quiet): (Vec<&Post>, Vec<&Post>) = images
        .into_iter()
        .partition(|post| post.score.is_some_and(|score| score >= min_score));

    let pool = if popular.is_empty() { quiet } else { popular };

    let candidates: Vec<String> = pool.into_iter().filter_map(resolve_url).collect();
    if candidates.is_empty() {
        return Err(FetchError::EmptyCandidateSet);
    }
    Ok(candidates)
}

pub fn pick_with<'a, R: Rng>(candidates: &'a [String], rng: &mut R) -> Option<&'a str> {
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.gen_range(0..candidates.len())].as_str())
}

pub fn pick_random(candidates: &[String]) -> Option<&str> {
    pick_with(candidates, &mut rand::thread_rng())
}
