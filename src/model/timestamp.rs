//! Parsing of the timestamp formats found in bot output.
//!
//! The bot writes `new Date().toISOString()` almost everywhere, but older files and hand-edited
//! rows contain naive timestamps, bare dates or epoch numbers.

use crate::Result;
use anyhow::{anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// The single output format used for normalized dates.
pub const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Epoch values with at least this many digits are treated as milliseconds.
const EPOCH_MILLIS_DIGITS: usize = 13;

/// Parses `s` into a UTC instant. Offsets are applied, naive values are taken as UTC.
pub fn parse(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        bail!("The timestamp is empty");
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }

    if s.chars().all(|c| c.is_ascii_digit()) {
        let n: i64 = s
            .parse()
            .map_err(|_| anyhow!("The epoch timestamp '{s}' is out of range"))?;
        let dt = if s.len() >= EPOCH_MILLIS_DIGITS {
            DateTime::from_timestamp_millis(n)
        } else {
            DateTime::from_timestamp(n, 0)
        };
        return dt
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| anyhow!("The epoch timestamp '{s}' is out of range"));
    }

    bail!("Unable to parse '{s}' as a timestamp")
}

/// Formats an instant with `OUTPUT_FORMAT`.
pub fn format(dt: &NaiveDateTime) -> String {
    dt.format(OUTPUT_FORMAT).to_string()
}

/// Parses and re-formats `s` with `OUTPUT_FORMAT`.
pub fn normalize(s: &str) -> Result<String> {
    parse(s).map(|dt| format(&dt))
}
