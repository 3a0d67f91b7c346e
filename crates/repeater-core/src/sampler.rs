//! Interval sampling of a decoded route.

use crate::models::RouteSample;
use crate::spatial::{round_tenth, RoutePoint};

/// Default spacing between search points, in miles.
pub const DEFAULT_SAMPLE_INTERVAL_MI: f64 = 55.0;
/// Hard cap on search points per route.
pub const MAX_SAMPLE_POINTS: usize = 30;
/// The destination gets its own sample when the last one is farther than this.
pub const ENDPOINT_COVERAGE_MI: f64 = 2.0;

/// Reduce a route to search points spaced roughly `interval_mi` apart.
///
/// The first point is always sample zero. A sample is emitted at the first
/// vertex whose cumulative distance reaches the next threshold, and the next
/// threshold is measured from that vertex, so sparse routes can space
/// samples wider than `interval_mi`. At most `max_points` samples are
/// returned. When the last sample is more than [`ENDPOINT_COVERAGE_MI`] from
/// the final vertex, the final vertex is added, labeled with the full route
/// length; if the cap is already reached it replaces the last interval
/// sample instead (the origin is never replaced).
pub fn sample_route(points: &[RoutePoint], interval_mi: f64, max_points: usize) -> Vec<RouteSample> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Vec::new(),
    };
    let max_points = max_points.max(1);

    let mut samples = vec![RouteSample {
        latitude: first.latitude,
        longitude: first.longitude,
        cumulative_miles: 0.0,
    }];
    let mut cumulative = 0.0;
    let mut next_sample_at = interval_mi;

    for pair in points.windows(2) {
        let (prev, point) = (pair[0], pair[1]);
        cumulative += prev.distance_mi(&point);

        if samples.len() < max_points && cumulative >= next_sample_at {
            samples.push(RouteSample {
                latitude: point.latitude,
                longitude: point.longitude,
                cumulative_miles: round_tenth(cumulative),
            });
            next_sample_at = cumulative + interval_mi;
        }
    }

    let tail = RouteSample {
        latitude: last.latitude,
        longitude: last.longitude,
        cumulative_miles: round_tenth(cumulative),
    };
    let last_sample = samples[samples.len() - 1];
    let gap = RoutePoint::new(last_sample.latitude, last_sample.longitude).distance_mi(&last);
    if gap > ENDPOINT_COVERAGE_MI {
        if samples.len() < max_points {
            samples.push(tail);
        } else if samples.len() > 1 {
            let idx = samples.len() - 1;
            samples[idx] = tail;
        }
    }

    samples
}
