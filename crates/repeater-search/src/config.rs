//! Search configuration from environment.

use std::env;
use std::time::Duration;

use repeater_core::MAX_SAMPLE_POINTS;

use crate::retry::RetryPolicy;

pub const DEFAULT_DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";
pub const DEFAULT_REPEATERBOOK_URL: &str = "https://www.repeaterbook.com/api/export.php";
/// RepeaterBook asks automated clients to identify themselves with contact info.
/// Deployments should override this with their own contact details.
pub const DEFAULT_USER_AGENT: &str =
    "repeater-finder/0.2 (route repeater search; contact via REPEATERBOOK_USER_AGENT)";
/// Upstream band codes for 2 m and 70 cm.
pub const DEFAULT_BAND_CODES: &str = "14,4";

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub google_maps_api_key: String,
    pub directions_url: String,
    pub directions_timeout: Duration,
    pub repeaterbook_url: String,
    pub repeaterbook_user_agent: String,
    pub repeaterbook_band_codes: String,
    pub repeaterbook_timeout: Duration,
    /// Courtesy wait between consecutive sample queries.
    pub inter_request_delay: Duration,
    pub retry: RetryPolicy,
    pub max_sample_points: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            google_maps_api_key: String::new(),
            directions_url: DEFAULT_DIRECTIONS_URL.to_string(),
            directions_timeout: Duration::from_secs(10),
            repeaterbook_url: DEFAULT_REPEATERBOOK_URL.to_string(),
            repeaterbook_user_agent: DEFAULT_USER_AGENT.to_string(),
            repeaterbook_band_codes: DEFAULT_BAND_CODES.to_string(),
            repeaterbook_timeout: Duration::from_secs(15),
            inter_request_delay: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            max_sample_points: MAX_SAMPLE_POINTS,
        }
    }
}

impl SearchConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY").unwrap_or_default(),
            directions_url: env::var("DIRECTIONS_URL").unwrap_or(defaults.directions_url),
            directions_timeout: env_secs("DIRECTIONS_TIMEOUT_S", defaults.directions_timeout),
            repeaterbook_url: env::var("REPEATERBOOK_URL").unwrap_or(defaults.repeaterbook_url),
            repeaterbook_user_agent: env::var("REPEATERBOOK_USER_AGENT")
                .unwrap_or(defaults.repeaterbook_user_agent),
            repeaterbook_band_codes: env::var("REPEATERBOOK_BANDS")
                .unwrap_or(defaults.repeaterbook_band_codes),
            repeaterbook_timeout: env_secs("REPEATERBOOK_TIMEOUT_S", defaults.repeaterbook_timeout),
            inter_request_delay: env_secs("REPEATERBOOK_DELAY_S", defaults.inter_request_delay),
            retry: RetryPolicy {
                max_retries: env::var("REPEATERBOOK_MAX_RETRIES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.retry.max_retries),
                retry_delay: env_secs("REPEATERBOOK_RETRY_DELAY_S", defaults.retry.retry_delay),
                rate_limit_delay: env_secs("REPEATERBOOK_BACKOFF_S", defaults.retry.rate_limit_delay),
            },
            max_sample_points: env::var("MAX_SAMPLE_POINTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_sample_points),
        };

        if config.google_maps_api_key.trim().is_empty() {
            tracing::warn!("GOOGLE_MAPS_API_KEY is not set; route lookups will be rejected upstream");
        }
        config
    }
}

/// Read a duration in (possibly fractional) seconds; bad or negative values fall back.
fn env_secs(name: &str, default: Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(default)
}
