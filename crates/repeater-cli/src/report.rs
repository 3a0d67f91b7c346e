//! Plain-text rendering of search results.

use std::fmt::Write;

use repeater_core::{NormalizedRepeater, SearchResult};

const HEADERS: [&str; 9] = [
    "Mile", "Freq", "Offset", "Tone", "Call", "Location", "Band", "Use", "Dist",
];

/// Route summary followed by the repeater table, or the error message.
pub fn render_report(result: &SearchResult) -> String {
    let mut out = String::new();
    if let Some(route) = &result.route {
        let _ = writeln!(
            out,
            "{} -> {}",
            route.origin_address, route.destination_address
        );
        let _ = writeln!(
            out,
            "{} mi, {} via {} ({} sample points)",
            route.distance_miles, route.duration_text, route.summary, result.sample_count
        );
        out.push('\n');
    }

    if let Some(error) = &result.error {
        let _ = writeln!(out, "Error: {error}");
        return out;
    }

    if result.repeaters.is_empty() {
        out.push_str("No repeaters found along this route.\n");
    } else {
        out.push_str(&render_table(&result.repeaters));
        let _ = writeln!(out, "\n{} repeaters", result.repeaters.len());
    }
    out
}

/// Column-aligned table, one repeater per row in route order.
pub fn render_table(repeaters: &[NormalizedRepeater]) -> String {
    let rows: Vec<[String; 9]> = repeaters.iter().map(row).collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn row(r: &NormalizedRepeater) -> [String; 9] {
    [
        format!("{:.1}", r.approx_route_mile),
        r.frequency_display.clone(),
        r.offset_display.clone(),
        r.pl_tone.clone(),
        r.callsign.clone(),
        format!("{}, {}", r.city, r.state),
        r.band_display.clone(),
        r.use_status.clone(),
        r.dist_from_route_mi
            .map(|d| format!("{d:.1} mi"))
            .unwrap_or_else(|| "-".to_string()),
    ]
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
