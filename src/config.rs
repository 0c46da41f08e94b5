//! Service configuration
//!
//! Credentials and listing URLs come from the environment; quota limits,
//! cache TTL, and per-source timeouts are fixed constants with test-friendly
//! overrides on [`Config`].

use chrono::Duration as ChronoDuration;
use std::env;
use std::time::Duration;

/// Permitted live fetches per calendar day
pub const DAILY_FETCH_LIMIT: u32 = 10;

/// Permitted live fetches per calendar month
pub const MONTHLY_FETCH_LIMIT: u32 = 300;

/// How long a cached review batch is considered fresh, in hours
pub const CACHE_TTL_HOURS: i64 = 24;

/// Bounded timeout applied to each retrieval source, in seconds
pub const SOURCE_TIMEOUT_SECS: u64 = 15;

/// Minimum trimmed body length for a review to be kept
pub const MIN_BODY_LEN: usize = 1;

/// Environment variable holding the official API key
pub const ENV_API_KEY: &str = "REVIEWRELAY_API_KEY";

/// Environment variable holding the place identifier for the official API
pub const ENV_PLACE_ID: &str = "REVIEWRELAY_PLACE_ID";

/// Environment variable holding the public listing page URL
pub const ENV_LISTING_URL: &str = "REVIEWRELAY_LISTING_URL";

/// Environment variable holding the alternate listing page URL
pub const ENV_ALT_LISTING_URL: &str = "REVIEWRELAY_ALT_LISTING_URL";

/// Runtime configuration for the review service
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the official place-details provider, if configured
    pub api_key: Option<String>,
    /// Place identifier for the official provider
    pub place_id: Option<String>,
    /// Public listing page URL to scrape when the API is unavailable
    pub listing_url: Option<String>,
    /// Alternate listing URL, tried last
    pub alternate_listing_url: Option<String>,
    /// Daily live-fetch budget
    pub daily_limit: u32,
    /// Monthly live-fetch budget
    pub monthly_limit: u32,
    /// Cache freshness window
    pub cache_ttl: ChronoDuration,
    /// Per-source fetch timeout
    pub source_timeout: Duration,
    /// Minimum trimmed body length for a review to be kept
    pub min_body_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            place_id: None,
            listing_url: None,
            alternate_listing_url: None,
            daily_limit: DAILY_FETCH_LIMIT,
            monthly_limit: MONTHLY_FETCH_LIMIT,
            cache_ttl: ChronoDuration::hours(CACHE_TTL_HOURS),
            source_timeout: Duration::from_secs(SOURCE_TIMEOUT_SECS),
            min_body_len: MIN_BODY_LEN,
        }
    }
}

impl Config {
    /// Builds a configuration from the process environment
    ///
    /// Unset or empty variables leave the corresponding field `None`, which
    /// disables the source that needs it.
    pub fn from_env() -> Self {
        Self {
            api_key: env_nonempty(ENV_API_KEY),
            place_id: env_nonempty(ENV_PLACE_ID),
            listing_url: env_nonempty(ENV_LISTING_URL),
            alternate_listing_url: env_nonempty(ENV_ALT_LISTING_URL),
            ..Self::default()
        }
    }
}

/// Reads an environment variable, mapping empty values to `None`
fn env_nonempty(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}
