use std::io::{self, Write};

use crossterm::style::Stylize;

use crate::config::MonitorConfig;
use crate::stats::Snapshot;

/// Minimum status width, so a redraw fully covers the previous line.
pub const STATUS_WIDTH: usize = 120;

/// One-line summary of the session so far.
pub fn status_line(snapshot: &Snapshot, paused: bool, config: &MonitorConfig) -> String {
    let ping_info = match config.max_pings {
        Some(max) => format!("Pings: {}/{}", snapshot.ping_count, max),
        None => format!("Pings: {}", snapshot.ping_count),
    };
    let rtt_bounds = match (snapshot.min_rtt, snapshot.max_rtt) {
        (Some(min), Some(max)) => format!(" (min {min}, max {max})"),
        _ => String::new(),
    };
    let pause_status = if paused { " (paused)" } else { "" };

    format!(
        "{ping_info} | Logged: {} ({:.1}%) | RTT avg: {:.1} ms, med: {:.1}{rtt_bounds} | TTL avg: {:.1}{pause_status}",
        snapshot.logged_count,
        snapshot.percent_logged,
        snapshot.mean_rtt,
        snapshot.median_rtt,
        snapshot.mean_ttl,
    )
}

/// Overwrite the current terminal line with `line`, in red while paused.
pub fn draw_status<W: Write>(out: &mut W, line: &str, paused: bool) -> io::Result<()> {
    let padded = format!("{line:<width$}", width = STATUS_WIDTH);
    if paused {
        write!(out, "\r{}", padded.red())?;
    } else {
        write!(out, "\r{padded}")?;
    }
    out.flush()
}

fn optional(value: Option<u64>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}

/// Console summary printed once when monitoring stops.
pub fn final_summary(snapshot: &Snapshot) -> String {
    format!(
        "Final summary -> Pings: {}, Logged: {} ({:.1}%), Avg RTT: {:.1} ms, Median RTT: {:.1}, Min RTT: {}, Max RTT: {}, Avg TTL: {:.1}",
        snapshot.ping_count,
        snapshot.logged_count,
        snapshot.percent_logged,
        snapshot.mean_rtt,
        snapshot.median_rtt,
        optional(snapshot.min_rtt),
        optional(snapshot.max_rtt),
        snapshot.mean_ttl,
    )
}

/// Event-log line written once when monitoring stops.
pub fn stopped_log_line(snapshot: &Snapshot) -> String {
    format!(
        "Monitor stopped. Total pings: {}, Logged: {} ({:.1}%), Avg RTT: {:.1}, Median RTT: {:.1}, Min RTT: {}, Max RTT: {}, Avg TTL: {:.1}",
        snapshot.ping_count,
        snapshot.logged_count,
        snapshot.percent_logged,
        snapshot.mean_rtt,
        snapshot.median_rtt,
        optional(snapshot.min_rtt),
        optional(snapshot.max_rtt),
        snapshot.mean_ttl,
    )
}
