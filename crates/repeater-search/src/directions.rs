//! Google Directions API client.

use async_trait::async_trait;
use repeater_core::spatial::round_tenth;
use repeater_core::RouteInfo;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{redact, RouteError};
use crate::pipeline::RouteProvider;

const METERS_PER_MILE: f64 = 1609.344;

/// HTTP client for the directions service.
pub struct DirectionsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    overview_polyline: Option<OverviewPolyline>,
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
struct OverviewPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: Option<TextValue>,
    duration: Option<TextValue>,
    start_address: Option<String>,
    end_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    #[serde(default)]
    text: String,
    #[serde(default)]
    value: f64,
}

impl DirectionsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Fetch the driving route between two addresses or ZIP codes.
    pub async fn fetch_route(&self, origin: &str, destination: &str) -> Result<RouteInfo, RouteError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("origin", origin),
                ("destination", destination),
                ("mode", "driving"),
                ("units", "imperial"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|err| RouteError::Request(redact(err)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RouteError::Http {
                status: status.as_u16(),
            });
        }

        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|err| RouteError::Malformed(redact(err)))?;

        route_from_response(body, origin, destination)
    }
}

#[async_trait]
impl RouteProvider for DirectionsClient {
    async fn get_route(&self, origin: &str, destination: &str) -> Result<RouteInfo, RouteError> {
        self.fetch_route(origin, destination).await
    }
}

fn route_from_response(
    body: DirectionsResponse,
    origin: &str,
    destination: &str,
) -> Result<RouteInfo, RouteError> {
    let status = body.status.unwrap_or_else(|| "UNKNOWN".to_string());
    if status != "OK" {
        return Err(RouteError::Api {
            status,
            message: body
                .error_message
                .unwrap_or_else(|| "No details provided.".to_string()),
        });
    }

    let route = body.routes.into_iter().next().ok_or_else(|| RouteError::NoRoute {
        origin: origin.to_string(),
        destination: destination.to_string(),
    })?;
    let polyline = route
        .overview_polyline
        .map(|p| p.points)
        .ok_or_else(|| RouteError::Malformed("route has no overview polyline".to_string()))?;
    let leg = route
        .legs
        .into_iter()
        .next()
        .ok_or_else(|| RouteError::Malformed("route has no legs".to_string()))?;

    Ok(RouteInfo {
        polyline,
        distance_miles: round_tenth(leg.distance.map_or(0.0, |d| d.value) / METERS_PER_MILE),
        duration_text: leg.duration.map(|d| d.text).unwrap_or_default(),
        summary: route.summary,
        origin_address: leg.start_address.unwrap_or_else(|| origin.to_string()),
        destination_address: leg.end_address.unwrap_or_else(|| destination.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<RouteInfo, RouteError> {
        let body: DirectionsResponse = serde_json::from_value(value).unwrap();
        route_from_response(body, "80401", "81657")
    }

    #[test]
    fn extracts_route_fields() {
        let route = parse(json!({
            "status": "OK",
            "routes": [{
                "summary": "I-70 W",
                "overview_polyline": { "points": "_p~iF~ps|U" },
                "legs": [{
                    "distance": { "text": "93.4 mi", "value": 150_312 },
                    "duration": { "text": "1 hour 32 mins", "value": 5520 },
                    "start_address": "Golden, CO 80401, USA",
                    "end_address": "Vail, CO 81657, USA"
                }]
            }]
        }))
        .unwrap();

        assert_eq!(route.polyline, "_p~iF~ps|U");
        assert_eq!(route.distance_miles, 93.4);
        assert_eq!(route.duration_text, "1 hour 32 mins");
        assert_eq!(route.summary, "I-70 W");
        assert_eq!(route.origin_address, "Golden, CO 80401, USA");
        assert_eq!(route.destination_address, "Vail, CO 81657, USA");
    }

    #[test]
    fn missing_addresses_fall_back_to_inputs() {
        let route = parse(json!({
            "status": "OK",
            "routes": [{
                "overview_polyline": { "points": "" },
                "legs": [{ "distance": { "value": 1609.344 } }]
            }]
        }))
        .unwrap();
        assert_eq!(route.origin_address, "80401");
        assert_eq!(route.destination_address, "81657");
        assert_eq!(route.distance_miles, 1.0);
        assert_eq!(route.duration_text, "");
    }

    #[test]
    fn non_ok_status_carries_upstream_message() {
        let err = parse(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "routes": []
        }))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Google Maps API Error (REQUEST_DENIED): The provided API key is invalid."
        );
    }

    #[test]
    fn missing_status_is_unknown() {
        let err = parse(json!({})).unwrap_err();
        assert_eq!(
            err,
            RouteError::Api {
                status: "UNKNOWN".to_string(),
                message: "No details provided.".to_string(),
            }
        );
    }

    #[test]
    fn empty_routes_is_no_route() {
        let err = parse(json!({ "status": "OK", "routes": [] })).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not find a driving route between 80401 and 81657."
        );
    }

    #[test]
    fn route_without_legs_is_malformed() {
        let err = parse(json!({
            "status": "OK",
            "routes": [{ "overview_polyline": { "points": "abc" }, "legs": [] }]
        }))
        .unwrap_err();
        assert!(matches!(err, RouteError::Malformed(_)));
    }
}
