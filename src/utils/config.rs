use std::env;

pub const DEFAULT_MIN_SCORE: f64 = 50.0;
pub const DEFAULT_CACHE_TTL_SECS: i64 = 600;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub subreddit: String,
    pub min_score: f64,
    pub cache_ttl_secs: i64,
    pub redis_url: Option<String>,
    pub log_level: String,
}

impl Config {
    pub fn init() -> Self {
        Config {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(3000),
            subreddit: env::var("SUBREDDIT")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "EarthPorn".to_string()),
            min_score: parse_min_score(env::var("MIN_SCORE").ok().as_deref()),
            cache_ttl_secs: env::var("CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|ttl| *ttl > 0)
                .unwrap_or(DEFAULT_CACHE_TTL_SECS),
            redis_url: env::var("REDIS_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "info".to_string())
                .to_lowercase(),
        }
    }
}

/// Anything that is not a finite, non-negative number means "use the default".
pub fn parse_min_score(raw: Option<&str>) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|score| score.is_finite() && *score >= 0.0)
        .unwrap_or(DEFAULT_MIN_SCORE)
}
