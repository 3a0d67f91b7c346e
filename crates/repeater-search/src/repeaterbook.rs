//! RepeaterBook proximity search client.

use async_trait::async_trait;
use repeater_core::RawRepeaterRecord;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::error::{redact, ProximityError};
use crate::pipeline::ProximitySource;
use crate::retry::RetryPolicy;

/// HTTP client for the RepeaterBook `qtype=prox` endpoint.
pub struct RepeaterBookClient {
    client: Client,
    base_url: String,
    band_codes: String,
    retry: RetryPolicy,
}

impl RepeaterBookClient {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder()
                .user_agent(user_agent)
                .timeout(timeout)
                .build()?,
            base_url: base_url.into(),
            band_codes: crate::config::DEFAULT_BAND_CODES.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the upstream band code list sent with every query.
    pub fn with_band_codes(mut self, band_codes: impl Into<String>) -> Self {
        self.band_codes = band_codes.into();
        self
    }

    /// Repeaters within `radius_mi` of a point.
    ///
    /// Never fails: once the retry budget is spent the point contributes no
    /// results, so one bad sample cannot sink a whole route search.
    pub async fn fetch_nearby(&self, lat: f64, lon: f64, radius_mi: f64) -> Vec<RawRepeaterRecord> {
        let mut attempt = 0u32;
        loop {
            let err = match self.query_once(lat, lon, radius_mi).await {
                Ok(records) => return records,
                Err(err) => err,
            };

            match self.retry.delay_after(attempt, &err) {
                Some(delay) => {
                    if err.is_rate_limited() {
                        tracing::warn!(
                            "RepeaterBook 429 rate limit at attempt {}, sleeping {:?}",
                            attempt + 1,
                            delay
                        );
                    } else {
                        tracing::debug!(
                            "RepeaterBook attempt {} failed ({}), retrying in {:?}",
                            attempt + 1,
                            err,
                            delay
                        );
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    tracing::warn!(
                        "RepeaterBook query failed at ({:.4}, {:.4}) after {} attempts: {}",
                        lat,
                        lon,
                        attempt + 1,
                        err
                    );
                    return Vec::new();
                }
            }
        }
    }

    async fn query_once(
        &self,
        lat: f64,
        lon: f64,
        radius_mi: f64,
    ) -> Result<Vec<RawRepeaterRecord>, ProximityError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("qtype", "prox".to_string()),
                ("lat", lat.to_string()),
                ("lng", lon.to_string()),
                ("dist", radius_mi.to_string()),
                ("dunit", "m".to_string()),
                ("band", self.band_codes.clone()),
            ])
            .send()
            .await
            .map_err(|err| ProximityError::Request(redact(err)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProximityError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProximityError::Http {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| ProximityError::Request(redact(err)))?;
        parse_records(&body)
    }
}

#[async_trait]
impl ProximitySource for RepeaterBookClient {
    async fn query_nearby(&self, lat: f64, lon: f64, radius_mi: f64) -> Vec<RawRepeaterRecord> {
        self.fetch_nearby(lat, lon, radius_mi).await
    }
}

/// Records from a response body.
///
/// The endpoint normally answers with a JSON list, occasionally with an
/// object wrapping a `results` list. Blank bodies and any other shape are
/// zero results; only unparsable JSON is an error.
pub fn parse_records(body: &str) -> Result<Vec<RawRepeaterRecord>, ProximityError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value =
        serde_json::from_str(body).map_err(|err| ProximityError::Decode(err.to_string()))?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .map(RawRepeaterRecord::from)
        .collect())
}
