//! End-to-end route search: directions, sampling, proximity queries and
//! the final filter/dedup/sort pass.
//!
//! The pipeline runs strictly sequentially. It reports progress through an
//! injected [`ProgressSink`] and knows nothing about how the caller stores
//! task state or schedules work.

use async_trait::async_trait;
use repeater_core::{
    decode_polyline, filter_and_deduplicate, normalize_repeater, sample_route, Band,
    RawRepeaterRecord, RouteInfo, SearchResult, DEFAULT_SAMPLE_INTERVAL_MI, MAX_SAMPLE_POINTS,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::directions::DirectionsClient;
use crate::error::SearchError;
use crate::repeaterbook::RepeaterBookClient;

pub const DEFAULT_SEARCH_RADIUS_MI: f64 = 30.0;
pub const MAX_SEARCH_RADIUS_MI: f64 = 100.0;
pub const MIN_SAMPLE_INTERVAL_MI: f64 = 1.0;
pub const MAX_SAMPLE_INTERVAL_MI: f64 = 500.0;

/// Source of driving routes.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn get_route(&self, origin: &str, destination: &str) -> Result<RouteInfo, crate::RouteError>;
}

/// Source of repeaters near a point. Failures degrade to an empty list.
#[async_trait]
pub trait ProximitySource: Send + Sync {
    async fn query_nearby(&self, lat: f64, lon: f64, radius_mi: f64) -> Vec<RawRepeaterRecord>;
}

/// One progress report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub message: String,
    /// Completion of the sampling phase, non-decreasing within a search.
    pub percent: Option<u8>,
}

impl ProgressUpdate {
    pub fn new(message: impl Into<String>, percent: Option<u8>) -> Self {
        Self {
            message: message.into(),
            percent,
        }
    }
}

/// Fire-and-forget receiver of progress reports.
pub trait ProgressSink: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        self(update)
    }
}

/// Sink that drops every report.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _update: ProgressUpdate) {}
}

/// Parameters of one route search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub origin: String,
    pub destination: String,
    #[serde(default = "default_radius")]
    pub search_radius_mi: f64,
    #[serde(default = "default_interval")]
    pub sample_interval_mi: f64,
    /// `None` selects [`Band::DEFAULT`].
    #[serde(default)]
    pub bands: Option<Vec<Band>>,
}

fn default_radius() -> f64 {
    DEFAULT_SEARCH_RADIUS_MI
}

fn default_interval() -> f64 {
    DEFAULT_SAMPLE_INTERVAL_MI
}

impl SearchRequest {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            search_radius_mi: DEFAULT_SEARCH_RADIUS_MI,
            sample_interval_mi: DEFAULT_SAMPLE_INTERVAL_MI,
            bands: None,
        }
    }

    pub fn with_radius(mut self, radius_mi: f64) -> Self {
        self.search_radius_mi = radius_mi;
        self
    }

    pub fn with_interval(mut self, interval_mi: f64) -> Self {
        self.sample_interval_mi = interval_mi;
        self
    }

    pub fn with_bands(mut self, bands: Vec<Band>) -> Self {
        self.bands = Some(bands);
        self
    }

    /// Bands the final result is restricted to.
    pub fn effective_bands(&self) -> Vec<Band> {
        self.bands.clone().unwrap_or_else(|| Band::DEFAULT.to_vec())
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.origin.trim().is_empty() {
            return Err(SearchError::InvalidParameters("origin is required".to_string()));
        }
        if self.destination.trim().is_empty() {
            return Err(SearchError::InvalidParameters(
                "destination is required".to_string(),
            ));
        }
        let radius = self.search_radius_mi;
        if !radius.is_finite() || radius <= 0.0 || radius > MAX_SEARCH_RADIUS_MI {
            return Err(SearchError::InvalidParameters(format!(
                "search radius must be greater than 0 and at most {MAX_SEARCH_RADIUS_MI} miles"
            )));
        }
        let interval = self.sample_interval_mi;
        if !interval.is_finite() || !(MIN_SAMPLE_INTERVAL_MI..=MAX_SAMPLE_INTERVAL_MI).contains(&interval) {
            return Err(SearchError::InvalidParameters(format!(
                "sample interval must be between {MIN_SAMPLE_INTERVAL_MI} and {MAX_SAMPLE_INTERVAL_MI} miles"
            )));
        }
        if matches!(&self.bands, Some(bands) if bands.is_empty()) {
            return Err(SearchError::InvalidParameters(
                "at least one band must be selected".to_string(),
            ));
        }
        Ok(())
    }
}

/// The search pipeline wired to its providers.
#[derive(Clone)]
pub struct SearchPipeline {
    routes: Arc<dyn RouteProvider>,
    repeaters: Arc<dyn ProximitySource>,
    inter_request_delay: Duration,
    max_sample_points: usize,
}

impl SearchPipeline {
    pub fn new(routes: Arc<dyn RouteProvider>, repeaters: Arc<dyn ProximitySource>) -> Self {
        Self {
            routes,
            repeaters,
            inter_request_delay: Duration::ZERO,
            max_sample_points: MAX_SAMPLE_POINTS,
        }
    }

    /// Pipeline backed by the real directions and RepeaterBook clients.
    pub fn from_config(config: &SearchConfig) -> Result<Self, reqwest::Error> {
        let directions = DirectionsClient::new(
            config.directions_url.clone(),
            config.google_maps_api_key.clone(),
            config.directions_timeout,
        )?;
        let repeaterbook = RepeaterBookClient::new(
            config.repeaterbook_url.clone(),
            &config.repeaterbook_user_agent,
            config.repeaterbook_timeout,
        )?
        .with_retry(config.retry)
        .with_band_codes(config.repeaterbook_band_codes.clone());

        Ok(Self::new(Arc::new(directions), Arc::new(repeaterbook))
            .with_inter_request_delay(config.inter_request_delay)
            .with_max_sample_points(config.max_sample_points))
    }

    pub fn with_inter_request_delay(mut self, delay: Duration) -> Self {
        self.inter_request_delay = delay;
        self
    }

    pub fn with_max_sample_points(mut self, max_points: usize) -> Self {
        self.max_sample_points = max_points.max(1);
        self
    }

    /// Run one search to completion.
    ///
    /// Always returns a well-formed result: route-level failures land in
    /// `SearchResult::error`, per-sample failures just yield fewer repeaters.
    pub async fn find_repeaters_along_route(
        &self,
        request: &SearchRequest,
        progress: &dyn ProgressSink,
    ) -> SearchResult {
        if let Err(err) = request.validate() {
            return SearchResult::failed(None, err.to_string());
        }

        progress.report(ProgressUpdate::new("Calculating driving route...", None));
        let route = match self.routes.get_route(&request.origin, &request.destination).await {
            Ok(route) => route,
            Err(err) => {
                tracing::info!(
                    "No route from '{}' to '{}': {}",
                    request.origin,
                    request.destination,
                    err
                );
                return SearchResult::failed(None, SearchError::from(err).to_string());
            }
        };

        let points = match decode_polyline(&route.polyline) {
            Ok(points) if !points.is_empty() => points,
            Ok(_) => return SearchResult::failed(Some(route), SearchError::EmptyPolyline.to_string()),
            Err(err) => {
                tracing::warn!("Route polyline failed to decode: {}", err);
                return SearchResult::failed(Some(route), SearchError::from(err).to_string());
            }
        };

        let samples = sample_route(&points, request.sample_interval_mi, self.max_sample_points);
        let sample_count = samples.len();
        tracing::info!(
            "Route {} -> {}: {} mi, {} polyline points, {} samples",
            route.origin_address,
            route.destination_address,
            route.distance_miles,
            points.len(),
            sample_count
        );
        progress.report(ProgressUpdate::new(
            format!(
                "Route found ({:.1} mi). Scanning {} zones...",
                route.distance_miles, sample_count
            ),
            Some(0),
        ));

        let mut found = Vec::new();
        for (i, sample) in samples.iter().enumerate() {
            let percent = (i * 100 / sample_count) as u8;
            progress.report(ProgressUpdate::new(
                format!(
                    "Scanning mile {}... ({}%)",
                    sample.cumulative_miles.trunc() as i64,
                    percent
                ),
                Some(percent),
            ));

            let raw = self
                .repeaters
                .query_nearby(sample.latitude, sample.longitude, request.search_radius_mi)
                .await;
            let before = found.len();
            found.extend(raw.iter().filter_map(|record| normalize_repeater(record, sample)));
            tracing::debug!(
                "Sample {}/{} at mile {}: {} records, {} usable",
                i + 1,
                sample_count,
                sample.cumulative_miles,
                raw.len(),
                found.len() - before
            );

            if i + 1 < sample_count && !self.inter_request_delay.is_zero() {
                tokio::time::sleep(self.inter_request_delay).await;
            }
        }

        progress.report(ProgressUpdate::new("Finalizing results...", Some(100)));
        let repeaters = filter_and_deduplicate(found, &request.effective_bands());
        tracing::info!("Search complete: {} repeaters along route", repeaters.len());

        SearchResult {
            route: Some(route),
            repeaters,
            sample_count,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RouteError;
    use repeater_core::spatial::EARTH_RADIUS_MI;
    use repeater_core::{encode_polyline, RoutePoint};
    use serde_json::json;
    use std::sync::Mutex;

    fn lat_for_miles(miles: f64) -> f64 {
        (miles / EARTH_RADIUS_MI).to_degrees()
    }

    /// Straight route north along -105, one vertex per mile.
    fn straight_route(total_miles: usize) -> RouteInfo {
        let points: Vec<RoutePoint> = (0..=total_miles)
            .map(|mile| RoutePoint::new(39.0 + lat_for_miles(mile as f64), -105.0))
            .collect();
        RouteInfo {
            polyline: encode_polyline(&points),
            distance_miles: total_miles as f64,
            duration_text: "2 hours".to_string(),
            summary: "US-85".to_string(),
            origin_address: "Start".to_string(),
            destination_address: "End".to_string(),
        }
    }

    struct FixedRoute(Result<RouteInfo, RouteError>);

    #[async_trait]
    impl RouteProvider for FixedRoute {
        async fn get_route(&self, _origin: &str, _destination: &str) -> Result<RouteInfo, RouteError> {
            self.0.clone()
        }
    }

    /// Returns one canned batch per call, in order, and records query points.
    #[derive(Default)]
    struct ScriptedSource {
        batches: Mutex<Vec<Vec<RawRepeaterRecord>>>,
        calls: Mutex<Vec<(f64, f64, f64)>>,
    }

    impl ScriptedSource {
        fn new(batches: Vec<serde_json::Value>) -> Self {
            let batches = batches
                .into_iter()
                .map(|batch| match batch {
                    serde_json::Value::Array(items) => {
                        items.into_iter().map(RawRepeaterRecord::from).collect()
                    }
                    _ => Vec::new(),
                })
                .rev()
                .collect();
            Self {
                batches: Mutex::new(batches),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ProximitySource for ScriptedSource {
        async fn query_nearby(&self, lat: f64, lon: f64, radius_mi: f64) -> Vec<RawRepeaterRecord> {
            self.calls.lock().unwrap().push((lat, lon, radius_mi));
            self.batches.lock().unwrap().pop().unwrap_or_default()
        }
    }

    fn pipeline(route: Result<RouteInfo, RouteError>, source: Arc<ScriptedSource>) -> SearchPipeline {
        SearchPipeline::new(Arc::new(FixedRoute(route)), source)
    }

    #[tokio::test]
    async fn route_failure_becomes_result_error() {
        let source = Arc::new(ScriptedSource::default());
        let err = RouteError::Api {
            status: "NOT_FOUND".to_string(),
            message: "Origin not geocoded".to_string(),
        };
        let result = pipeline(Err(err), source.clone())
            .find_repeaters_along_route(&SearchRequest::new("00000", "99999"), &NoProgress)
            .await;

        assert_eq!(
            result.error.as_deref(),
            Some("Google Maps API Error (NOT_FOUND): Origin not geocoded")
        );
        assert!(result.route.is_none());
        assert!(result.repeaters.is_empty());
        assert!(source.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_polyline_is_reported() {
        let mut route = straight_route(10);
        route.polyline.clear();
        let result = pipeline(Ok(route), Arc::new(ScriptedSource::default()))
            .find_repeaters_along_route(&SearchRequest::new("a", "b"), &NoProgress)
            .await;
        assert_eq!(result.error.as_deref(), Some("Route returned an empty polyline."));
        assert!(result.route.is_some());
    }

    #[tokio::test]
    async fn corrupt_polyline_is_reported() {
        let mut route = straight_route(10);
        route.polyline = "_p~iF".to_string();
        let result = pipeline(Ok(route), Arc::new(ScriptedSource::default()))
            .find_repeaters_along_route(&SearchRequest::new("a", "b"), &NoProgress)
            .await;
        let error = result.error.unwrap();
        assert!(error.starts_with("Route polyline could not be decoded"), "{error}");
    }

    #[tokio::test]
    async fn invalid_request_never_calls_providers() {
        let source = Arc::new(ScriptedSource::default());
        let result = pipeline(Ok(straight_route(10)), source.clone())
            .find_repeaters_along_route(
                &SearchRequest::new("80401", "  ").with_radius(30.0),
                &NoProgress,
            )
            .await;
        assert_eq!(result.error.as_deref(), Some("destination is required"));
        assert!(source.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn queries_every_sample_and_merges_results() {
        let source = Arc::new(ScriptedSource::new(vec![
            json!([
                { "Callsign": "w0aaa", "Frequency": "146.940", "Input Freq": "146.340" },
                { "Callsign": "W0BBB", "Frequency": "447.100", "Use": "CLOSED" },
                { "Callsign": "W0SIX", "Frequency": "53.010" },
                { "Callsign": "W0BAD", "Frequency": "n/a" }
            ]),
            json!([
                { "Callsign": "W0AAA", "Frequency": "146.940" },
                { "Callsign": "W0CCC", "Frequency": "145.310" }
            ]),
            json!([]),
            json!([{ "Callsign": "W0DDD", "Frequency": "444.000", "Use": "OPEN" }]),
        ]));
        let request = SearchRequest::new("Start", "End").with_radius(25.0).with_interval(54.5);
        let result = pipeline(Ok(straight_route(120)), source.clone())
            .find_repeaters_along_route(&request, &NoProgress)
            .await;

        assert!(result.is_ok());
        assert_eq!(result.sample_count, 4);

        let calls = source.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|(_, lon, radius)| *lon == -105.0 && *radius == 25.0));
        assert!(calls.windows(2).all(|w| w[0].0 < w[1].0));

        let found: Vec<(&str, f64)> = result
            .repeaters
            .iter()
            .map(|r| (r.callsign.as_str(), r.approx_route_mile))
            .collect();
        assert_eq!(
            found,
            vec![("W0AAA", 0.0), ("W0CCC", 55.0), ("W0DDD", 120.0)]
        );
        assert_eq!(result.repeaters[0].offset_display, "\u{2212}0.600 MHz");
    }

    #[tokio::test]
    async fn requested_bands_replace_the_default() {
        let source = Arc::new(ScriptedSource::new(vec![json!([
            { "Callsign": "W0SIX", "Frequency": "53.010" },
            { "Callsign": "W0TWO", "Frequency": "146.520" }
        ])]));
        let request = SearchRequest::new("a", "b").with_bands(vec![Band::SixMeters]);
        let result = pipeline(Ok(straight_route(1)), source)
            .find_repeaters_along_route(&request, &NoProgress)
            .await;
        let calls: Vec<&str> = result.repeaters.iter().map(|r| r.callsign.as_str()).collect();
        assert_eq!(calls, vec!["W0SIX"]);
    }

    #[tokio::test]
    async fn reports_progress_in_order() {
        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let updates = updates.clone();
            move |update: ProgressUpdate| updates.lock().unwrap().push(update)
        };
        let request = SearchRequest::new("a", "b").with_interval(54.5);
        pipeline(Ok(straight_route(120)), Arc::new(ScriptedSource::default()))
            .find_repeaters_along_route(&request, &sink)
            .await;

        let updates = updates.lock().unwrap();
        let messages: Vec<&str> = updates.iter().map(|u| u.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Calculating driving route...",
                "Route found (120.0 mi). Scanning 4 zones...",
                "Scanning mile 0... (0%)",
                "Scanning mile 55... (25%)",
                "Scanning mile 110... (50%)",
                "Scanning mile 120... (75%)",
                "Finalizing results...",
            ]
        );
        let percents: Vec<u8> = updates.iter().filter_map(|u| u.percent).collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_between_samples_but_not_after_the_last() {
        let request = SearchRequest::new("a", "b").with_interval(54.5);
        let started = tokio::time::Instant::now();
        let result = pipeline(Ok(straight_route(120)), Arc::new(ScriptedSource::default()))
            .with_inter_request_delay(Duration::from_secs(5))
            .find_repeaters_along_route(&request, &NoProgress)
            .await;

        assert_eq!(result.sample_count, 4);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(15), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(16), "{elapsed:?}");
    }

    #[tokio::test]
    async fn sample_cap_limits_queries() {
        let source = Arc::new(ScriptedSource::default());
        let request = SearchRequest::new("a", "b").with_interval(1.0);
        let result = pipeline(Ok(straight_route(100)), source.clone())
            .with_max_sample_points(6)
            .find_repeaters_along_route(&request, &NoProgress)
            .await;
        assert_eq!(result.sample_count, 6);
        assert_eq!(source.calls.lock().unwrap().len(), 6);
    }

    #[test]
    fn validation_rules() {
        assert!(SearchRequest::new("80401", "81657").validate().is_ok());
        assert!(SearchRequest::new("", "81657").validate().is_err());
        assert!(SearchRequest::new("a", "b").with_radius(0.0).validate().is_err());
        assert!(SearchRequest::new("a", "b").with_radius(f64::NAN).validate().is_err());
        assert!(SearchRequest::new("a", "b").with_radius(150.0).validate().is_err());
        assert!(SearchRequest::new("a", "b").with_interval(0.5).validate().is_err());
        assert!(SearchRequest::new("a", "b").with_bands(vec![]).validate().is_err());
    }

    #[test]
    fn request_defaults_from_json() {
        let request: SearchRequest =
            serde_json::from_value(json!({ "origin": "80401", "destination": "81657" })).unwrap();
        assert_eq!(request.search_radius_mi, 30.0);
        assert_eq!(request.sample_interval_mi, 55.0);
        assert_eq!(request.effective_bands(), Band::DEFAULT.to_vec());
    }
}
