//! Error types for provider calls and the search pipeline.

use repeater_core::PolylineError;
use thiserror::Error;

/// The directions service could not produce a usable route.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("Directions API request failed: {0}")]
    Request(String),
    #[error("Directions API returned HTTP {status}")]
    Http { status: u16 },
    #[error("Google Maps API Error ({status}): {message}")]
    Api { status: String, message: String },
    #[error("Could not find a driving route between {origin} and {destination}.")]
    NoRoute { origin: String, destination: String },
    #[error("Directions API response was malformed: {0}")]
    Malformed(String),
}

/// A single proximity query failed. Handled inside the client.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProximityError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("rate limited (HTTP 429)")]
    RateLimited,
    #[error("HTTP {status}")]
    Http { status: u16 },
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ProximityError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProximityError::RateLimited)
    }
}

/// Route-level failure that aborts a search.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("{0}")]
    InvalidParameters(String),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("Route polyline could not be decoded: {0}")]
    Polyline(#[from] PolylineError),
    #[error("Route returned an empty polyline.")]
    EmptyPolyline,
}

/// Transport error text without the request URL, which carries credentials.
pub(crate) fn redact(err: reqwest::Error) -> String {
    err.without_url().to_string()
}
