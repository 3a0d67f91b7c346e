//! Repeater normalization, filtering and ordering.

use std::collections::HashSet;

use crate::models::{Band, NormalizedRepeater, RawRepeaterRecord, RouteSample};
use crate::spatial::{haversine_miles, round_tenth};

const MINUS_SIGN: char = '\u{2212}';
const EXCLUDED_USES: [&str; 2] = ["CLOSED", "PRIVATE"];

/// Convert one provider record into a [`NormalizedRepeater`].
///
/// `sample` is the search point that returned the record. Records without a
/// usable output frequency are dropped (`None`).
pub fn normalize_repeater(raw: &RawRepeaterRecord, sample: &RouteSample) -> Option<NormalizedRepeater> {
    let frequency = raw.number("Frequency").filter(|f| *f > 0.0)?;
    let band = Band::classify(frequency);

    // Zero or missing coordinates mean the provider doesn't know the site.
    let (latitude, longitude) = match (raw.number("Lat"), raw.number("Long")) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => (0.0, 0.0),
    };
    let dist_from_route_mi = (latitude != 0.0 && longitude != 0.0).then(|| {
        round_tenth(haversine_miles(
            sample.latitude,
            sample.longitude,
            latitude,
            longitude,
        ))
    });

    let input_freq = raw.number("Input Freq").filter(|f| *f > 0.0);
    let provider_offset = raw.text("Offset");
    let offset_display = format_offset(frequency, input_freq, provider_offset.as_deref());

    let pl_tone = raw
        .text_or(&["PL", "Encode"])
        .map(|tone| tone.trim().to_string())
        .filter(|tone| !tone.is_empty())
        .unwrap_or_else(|| "None".to_string());

    Some(NormalizedRepeater {
        frequency,
        frequency_display: format!("{frequency:.4}"),
        input_freq,
        offset_display,
        band,
        band_display: band.map_or("Other", Band::label).to_string(),
        pl_tone,
        callsign: trimmed(raw.text("Callsign")).to_uppercase(),
        city: trimmed(raw.text_or(&["Nearest City", "City"])),
        state: trimmed(raw.text_or(&["State", "Operational Status"])),
        use_status: raw
            .text("Use")
            .unwrap_or_else(|| "OPEN".to_string())
            .trim()
            .to_uppercase(),
        latitude,
        longitude,
        dist_from_route_mi,
        approx_route_mile: sample.cumulative_miles,
    })
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Human-readable transmit offset.
///
/// With both frequencies known the signed input/output split is shown, e.g.
/// `"+0.600 MHz"` or `"−5.000 MHz"` (U+2212 minus). A zero split is
/// `"Simplex"`. Otherwise the provider's own offset text is used, or
/// `"Unknown"`.
pub fn format_offset(frequency: f64, input_freq: Option<f64>, provider_offset: Option<&str>) -> String {
    match input_freq {
        Some(input) => {
            let offset = ((input - frequency) * 10_000.0).round() / 10_000.0;
            if offset > 0.0 {
                format!("+{:.3} MHz", offset.abs())
            } else if offset < 0.0 {
                format!("{MINUS_SIGN}{:.3} MHz", offset.abs())
            } else {
                "Simplex".to_string()
            }
        }
        None => provider_offset
            .map(str::to_string)
            .unwrap_or_else(|| "Unknown".to_string()),
    }
}

/// Whether the repeater's use field marks it closed or private.
pub fn is_restricted(repeater: &NormalizedRepeater) -> bool {
    let use_status = repeater.use_status.to_uppercase();
    EXCLUDED_USES.iter().any(|tag| use_status.contains(tag))
}

/// Band filter, closed/private exclusion, dedup and route ordering.
///
/// An empty `bands` slice applies no band restriction. Duplicates share
/// `(callsign, frequency)`; the first occurrence wins. The result is sorted by
/// `(approx_route_mile, frequency)`.
pub fn filter_and_deduplicate(repeaters: Vec<NormalizedRepeater>, bands: &[Band]) -> Vec<NormalizedRepeater> {
    let mut seen: HashSet<(String, u64)> = HashSet::new();

    let mut unique: Vec<NormalizedRepeater> = repeaters
        .into_iter()
        .filter(|r| bands.is_empty() || r.band.is_some_and(|band| bands.contains(&band)))
        .filter(|r| !is_restricted(r))
        .filter(|r| seen.insert((r.callsign.clone(), r.frequency.to_bits())))
        .collect();

    unique.sort_by(|a, b| {
        a.approx_route_mile
            .total_cmp(&b.approx_route_mile)
            .then(a.frequency.total_cmp(&b.frequency))
    });
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_at(mile: f64) -> RouteSample {
        RouteSample {
            latitude: 39.7392,
            longitude: -104.9903,
            cumulative_miles: mile,
        }
    }

    fn repeater(callsign: &str, frequency: f64, mile: f64) -> NormalizedRepeater {
        let raw = RawRepeaterRecord::from(json!({
            "Callsign": callsign,
            "Frequency": frequency.to_string(),
        }));
        normalize_repeater(&raw, &sample_at(mile)).unwrap()
    }

    #[test]
    fn normalizes_a_complete_record() {
        let raw = RawRepeaterRecord::from(json!({
            "Frequency": "146.9400",
            "Input Freq": "146.3400",
            "PL": " 100.0 ",
            "Callsign": " w0abc ",
            "Nearest City": "Golden ",
            "State": "Colorado",
            "Use": "open",
            "Lat": "39.7555",
            "Long": "-105.2211",
        }));

        let r = normalize_repeater(&raw, &sample_at(12.3)).unwrap();
        assert_eq!(r.frequency, 146.94);
        assert_eq!(r.frequency_display, "146.9400");
        assert_eq!(r.input_freq, Some(146.34));
        assert_eq!(r.offset_display, "\u{2212}0.600 MHz");
        assert_eq!(r.band, Some(Band::TwoMeters));
        assert_eq!(r.band_display, "2m");
        assert_eq!(r.pl_tone, "100.0");
        assert_eq!(r.callsign, "W0ABC");
        assert_eq!(r.city, "Golden");
        assert_eq!(r.state, "Colorado");
        assert_eq!(r.use_status, "OPEN");
        assert_eq!(r.approx_route_mile, 12.3);
        let dist = r.dist_from_route_mi.unwrap();
        assert!((dist - 12.4).abs() < 0.3, "got {dist}");
    }

    #[test]
    fn unparsable_frequency_drops_the_record() {
        for freq in [json!("TBD"), json!(null), json!(""), json!(0)] {
            let raw = RawRepeaterRecord::from(json!({ "Frequency": freq, "Callsign": "K0XYZ" }));
            assert!(normalize_repeater(&raw, &sample_at(0.0)).is_none());
        }
        let raw = RawRepeaterRecord::from(json!({ "Callsign": "K0XYZ" }));
        assert!(normalize_repeater(&raw, &sample_at(0.0)).is_none());
    }

    #[test]
    fn sparse_record_gets_defaults() {
        let raw = RawRepeaterRecord::from(json!({ "Frequency": 29.62 }));
        let r = normalize_repeater(&raw, &sample_at(0.0)).unwrap();
        assert_eq!(r.band, None);
        assert_eq!(r.band_display, "Other");
        assert_eq!(r.offset_display, "Unknown");
        assert_eq!(r.pl_tone, "None");
        assert_eq!(r.use_status, "OPEN");
        assert_eq!(r.dist_from_route_mi, None);
        assert_eq!((r.latitude, r.longitude), (0.0, 0.0));
    }

    #[test]
    fn falls_back_to_secondary_fields() {
        let raw = RawRepeaterRecord::from(json!({
            "Frequency": "443.5",
            "Offset": "+5 MHz",
            "Encode": "88.5",
            "City": "Vail",
            "Operational Status": "On-air",
            "Lat": "39.64",
            "Long": "bad",
        }));
        let r = normalize_repeater(&raw, &sample_at(90.0)).unwrap();
        assert_eq!(r.offset_display, "+5 MHz");
        assert_eq!(r.pl_tone, "88.5");
        assert_eq!(r.city, "Vail");
        assert_eq!(r.state, "On-air");
        assert_eq!(r.band_display, "70cm");
        assert_eq!(r.dist_from_route_mi, None);
    }

    #[test]
    fn offset_formatting() {
        assert_eq!(format_offset(146.52, Some(146.52), None), "Simplex");
        assert_eq!(format_offset(146.94, Some(146.34), None), "\u{2212}0.600 MHz");
        assert_eq!(format_offset(146.34, Some(146.94), None), "+0.600 MHz");
        assert_eq!(format_offset(447.1, Some(442.1), None), "\u{2212}5.000 MHz");
        assert_eq!(format_offset(146.34, None, Some("-0.6 MHz")), "-0.6 MHz");
        assert_eq!(format_offset(146.34, None, None), "Unknown");
    }

    #[test]
    fn duplicates_collapse_to_first_occurrence() {
        let input = vec![
            repeater("W0ABC", 146.94, 0.0),
            repeater("W0ABC", 146.94, 55.0),
            repeater("w0abc", 146.94, 110.0),
            repeater("W0ABC", 447.1, 55.0),
            repeater("K0XYZ", 146.94, 55.0),
        ];
        let out = filter_and_deduplicate(input, &Band::DEFAULT);
        assert_eq!(out.len(), 3);
        let keys: Vec<(&str, f64, f64)> = out
            .iter()
            .map(|r| (r.callsign.as_str(), r.frequency, r.approx_route_mile))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("W0ABC", 146.94, 0.0),
                ("K0XYZ", 146.94, 55.0),
                ("W0ABC", 447.1, 55.0),
            ]
        );
    }

    #[test]
    fn closed_and_private_systems_are_excluded() {
        let mut closed = repeater("N0CLO", 145.11, 10.0);
        closed.use_status = "Closed".to_string();
        let mut private = repeater("N0PRV", 145.13, 10.0);
        private.use_status = "PRIVATE - members only".to_string();
        let open = repeater("N0OPN", 145.15, 10.0);

        let out = filter_and_deduplicate(vec![closed, private, open], &[]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].callsign, "N0OPN");
    }

    #[test]
    fn sorts_by_route_mile_then_frequency() {
        let input = vec![
            repeater("A", 448.0, 55.0),
            repeater("B", 147.0, 110.0),
            repeater("C", 146.0, 55.0),
            repeater("D", 449.0, 0.0),
        ];
        let out = filter_and_deduplicate(input, &Band::DEFAULT);
        let order: Vec<&str> = out.iter().map(|r| r.callsign.as_str()).collect();
        assert_eq!(order, vec!["D", "C", "A", "B"]);
    }

    #[test]
    fn band_filter_keeps_only_requested_bands() {
        let input = vec![
            repeater("SIX", 53.05, 0.0),
            repeater("TWO", 146.52, 0.0),
            repeater("ONE", 224.5, 0.0),
            repeater("UHF", 446.0, 0.0),
            repeater("HF", 29.6, 0.0),
        ];

        let out = filter_and_deduplicate(input.clone(), &[Band::SixMeters, Band::OneTwentyFiveCentimeters]);
        let calls: Vec<&str> = out.iter().map(|r| r.callsign.as_str()).collect();
        assert_eq!(calls, vec!["SIX", "ONE"]);

        let everything = filter_and_deduplicate(input, &[]);
        assert_eq!(everything.len(), 5);
    }
}
