//! Google encoded-polyline format.
//!
//! Each coordinate is stored as a zig-zag encoded delta from the previous
//! vertex, scaled by 1e5 and split into 5-bit chunks offset by 63.

use thiserror::Error;

use crate::spatial::RoutePoint;

const PRECISION: f64 = 1e5;
const CHAR_OFFSET: u8 = 63;
const CONTINUATION_BIT: i64 = 0x20;
const CHUNK_MASK: i64 = 0x1f;
const MAX_SHIFT: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    #[error("polyline ends mid-value at byte {offset}")]
    Truncated { offset: usize },
    #[error("invalid polyline character {ch:?} at byte {offset}")]
    InvalidCharacter { offset: usize, ch: char },
    #[error("polyline value starting near byte {offset} overflows")]
    Overflow { offset: usize },
}

/// Decode an encoded polyline into route points.
///
/// Empty input yields an empty list. Any malformed input is an error; a
/// partially decoded prefix is never returned.
pub fn decode_polyline(encoded: &str) -> Result<Vec<RoutePoint>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0usize;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        lat = accumulate(lat, encoded, &mut index)?;
        if index >= bytes.len() {
            return Err(PolylineError::Truncated { offset: index });
        }
        lng = accumulate(lng, encoded, &mut index)?;
        points.push(RoutePoint::new(lat as f64 / PRECISION, lng as f64 / PRECISION));
    }

    Ok(points)
}

/// Add the next delta to a running coordinate.
fn accumulate(total: i64, encoded: &str, index: &mut usize) -> Result<i64, PolylineError> {
    let start = *index;
    let delta = next_value(encoded, index)?;
    total
        .checked_add(delta)
        .ok_or(PolylineError::Overflow { offset: start })
}

fn next_value(encoded: &str, index: &mut usize) -> Result<i64, PolylineError> {
    let bytes = encoded.as_bytes();
    let start = *index;
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *bytes
            .get(*index)
            .ok_or(PolylineError::Truncated { offset: *index })?;
        if !(CHAR_OFFSET..=CHAR_OFFSET + 63).contains(&byte) {
            let ch = encoded[*index..].chars().next().unwrap_or('\u{fffd}');
            return Err(PolylineError::InvalidCharacter { offset: *index, ch });
        }
        *index += 1;

        let chunk = i64::from(byte - CHAR_OFFSET);
        if shift > MAX_SHIFT {
            return Err(PolylineError::Overflow { offset: start });
        }
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;

        if chunk < CONTINUATION_BIT {
            break;
        }
    }

    Ok(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}

/// Encode route points into a polyline string at 1e-5 degree precision.
pub fn encode_polyline(points: &[RoutePoint]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        let lat = (point.latitude * PRECISION).round() as i64;
        let lng = (point.longitude * PRECISION).round() as i64;
        push_value(&mut out, lat - prev_lat);
        push_value(&mut out, lng - prev_lng);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

fn push_value(out: &mut String, delta: i64) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while value >= CONTINUATION_BIT {
        let chunk = (CONTINUATION_BIT | (value & CHUNK_MASK)) as u8;
        out.push(char::from(chunk + CHAR_OFFSET));
        value >>= 5;
    }
    out.push(char::from(value as u8 + CHAR_OFFSET));
}
