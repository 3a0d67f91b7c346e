//! Core data models for the repeater route search.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Amateur band the repeater output falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    #[serde(rename = "6m")]
    SixMeters,
    #[serde(rename = "2m")]
    TwoMeters,
    #[serde(rename = "1.25m")]
    OneTwentyFiveCentimeters,
    #[serde(rename = "70cm")]
    SeventyCentimeters,
}

impl Band {
    pub const ALL: [Band; 4] = [
        Band::SixMeters,
        Band::TwoMeters,
        Band::OneTwentyFiveCentimeters,
        Band::SeventyCentimeters,
    ];

    /// Bands searched when the caller does not ask for specific ones.
    pub const DEFAULT: [Band; 2] = [Band::TwoMeters, Band::SeventyCentimeters];

    /// Inclusive band edges in MHz.
    pub fn range_mhz(self) -> (f64, f64) {
        match self {
            Band::SixMeters => (50.0, 54.0),
            Band::TwoMeters => (144.0, 148.0),
            Band::OneTwentyFiveCentimeters => (222.0, 225.0),
            Band::SeventyCentimeters => (420.0, 450.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Band::SixMeters => "6m",
            Band::TwoMeters => "2m",
            Band::OneTwentyFiveCentimeters => "1.25m",
            Band::SeventyCentimeters => "70cm",
        }
    }

    /// Classify a frequency; `None` when it sits outside every band.
    pub fn classify(frequency_mhz: f64) -> Option<Band> {
        Band::ALL.into_iter().find(|band| {
            let (low, high) = band.range_mhz();
            (low..=high).contains(&frequency_mhz)
        })
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBand(pub String);

impl fmt::Display for UnknownBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown band '{}' (expected one of 6m, 2m, 1.25m, 70cm)", self.0)
    }
}

impl std::error::Error for UnknownBand {}

impl FromStr for Band {
    type Err = UnknownBand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Band::ALL
            .into_iter()
            .find(|band| band.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownBand(s.to_string()))
    }
}

/// A route point annotated with the distance driven to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteSample {
    pub latitude: f64,
    pub longitude: f64,
    pub cumulative_miles: f64,
}

/// Unprocessed repeater object as returned by the proximity provider.
///
/// Field names and value types are provider-controlled, so values are read
/// through lenient accessors rather than a fixed schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRepeaterRecord(pub Map<String, Value>);

impl RawRepeaterRecord {
    /// Text value of a field; numbers are rendered, other types are ignored.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// First present field among `keys`, in order.
    pub fn text_or(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.text(key))
    }

    /// Numeric value of a field, accepting JSON numbers or numeric strings.
    pub fn number(&self, key: &str) -> Option<f64> {
        let value = match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        value.is_finite().then_some(value)
    }
}

impl From<Value> for RawRepeaterRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => RawRepeaterRecord(map),
            _ => RawRepeaterRecord::default(),
        }
    }
}

/// Canonical repeater entry reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRepeater {
    pub frequency: f64,
    pub frequency_display: String,
    pub input_freq: Option<f64>,
    pub offset_display: String,
    pub band: Option<Band>,
    pub band_display: String,
    pub pl_tone: String,
    pub callsign: String,
    pub city: String,
    pub state: String,
    #[serde(rename = "use")]
    pub use_status: String,
    pub latitude: f64,
    pub longitude: f64,
    pub dist_from_route_mi: Option<f64>,
    pub approx_route_mile: f64,
}

/// Driving route returned by the directions provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub polyline: String,
    pub distance_miles: f64,
    pub duration_text: String,
    pub summary: String,
    pub origin_address: String,
    pub destination_address: String,
}

/// Outcome of one route search.
///
/// `error` is set only for route-level failures; in that case `repeaters`
/// is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub route: Option<RouteInfo>,
    pub repeaters: Vec<NormalizedRepeater>,
    pub sample_count: usize,
    pub error: Option<String>,
}

impl SearchResult {
    pub fn failed(route: Option<RouteInfo>, error: impl Into<String>) -> Self {
        Self {
            route,
            repeaters: Vec::new(),
            sample_count: 0,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
