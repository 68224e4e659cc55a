//! Plain-text table of ranked relays

use crate::models::{ProbeResult, RankedMeasuredEntry};
use std::time::Duration;

const HEADERS: [&str; 7] = ["Country", "City", "Type", "Address", "Hostname", "Distance", "Latency"];

/// Columns holding numbers are right-aligned
const NUMERIC: [bool; 7] = [false, false, false, false, false, true, true];

/// Render relays as an aligned table with a dashed rule under the header
pub fn render(entries: &[RankedMeasuredEntry]) -> String {
    let rows: Vec<[String; 7]> = entries.iter().map(row).collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(String::from), &widths);
    push_line(&mut out, &widths.map(|w| "-".repeat(w)), &widths);
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn row(entry: &RankedMeasuredEntry) -> [String; 7] {
    let relay = entry.relay();
    [
        relay.country.clone(),
        relay.city.clone(),
        relay.protocol.to_string(),
        relay.address.to_string(),
        relay.hostname.clone(),
        format_number(entry.distance_km()),
        format_latency(&entry.probe),
    ]
}

fn push_line(out: &mut String, cells: &[String; 7], widths: &[usize; 7]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .zip(NUMERIC)
        .map(|((cell, &width), numeric)| {
            if numeric {
                format!("{:>width$}", cell)
            } else {
                format!("{:<width$}", cell)
            }
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

/// Latency cell: milliseconds, or the reason there is none
pub fn format_latency(probe: &ProbeResult) -> String {
    match probe {
        ProbeResult::Measured(rtt) => format_number(millis(*rtt)),
        ProbeResult::TimedOut => "timeout".to_string(),
        ProbeResult::Unreachable => "unresolvable".to_string(),
    }
}

fn millis(rtt: Duration) -> f64 {
    rtt.as_secs_f64() * 1000.0
}

/// Two decimals at most, trailing zeros dropped (`20`, `20.5`, `20.25`)
pub fn format_number(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{}", rounded)
}
