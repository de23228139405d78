//! Time handling utilities for gridded climate data.
//!
//! All timestamps are naive (no timezone), matching how the datasets encode
//! their time axis. Offsets in RFC 3339 input are folded into UTC first.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike};

/// Formats accepted for query timestamps, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a query timestamp.
///
/// Supports:
/// - Date only: "2024-05-31" (midnight)
/// - Date and hour: "2024-05-31T06"
/// - Naive datetime: "2024-05-31T06:00:00", "2024-05-31 06:00"
/// - RFC 3339: "2024-05-31T06:00:00Z", "2024-05-31T08:00:00+02:00"
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, TimeParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(TimeParseError::InvalidFormat(s.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(ndt);
        }
    }

    // Hour-only precision ("2024-05-31T06")
    if let Some((date, hour)) = s.split_once('T') {
        if let (Ok(date), Ok(hour)) = (NaiveDate::parse_from_str(date, "%Y-%m-%d"), hour.parse::<u32>()) {
            if let Some(ndt) = date.and_hms_opt(hour, 0, 0) {
                return Ok(ndt);
            }
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(ndt);
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Render a timestamp as ISO-8601 without a timezone designator.
///
/// Sub-second precision is only emitted when present.
pub fn format_iso8601(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Parsed CF-convention time units ("hours since 2024-05-31 00:00:00").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfTimeUnits {
    /// Milliseconds per unit step.
    pub step_ms: i64,
    /// Reference epoch.
    pub reference: NaiveDateTime,
}

impl CfTimeUnits {
    /// Parse a CF `units` attribute.
    pub fn parse(units: &str) -> Result<Self, TimeParseError> {
        let lower = units.trim().to_ascii_lowercase();
        let (unit, reference) = lower
            .split_once(" since ")
            .ok_or_else(|| TimeParseError::InvalidUnits(units.to_string()))?;

        let step_ms = match unit.trim() {
            "milliseconds" | "millisecond" | "msec" | "ms" => 1,
            "seconds" | "second" | "secs" | "sec" | "s" => 1_000,
            "minutes" | "minute" | "mins" | "min" => 60_000,
            "hours" | "hour" | "hrs" | "hr" | "h" => 3_600_000,
            "days" | "day" | "d" => 86_400_000,
            _ => return Err(TimeParseError::InvalidUnits(units.to_string())),
        };

        let reference = reference
            .trim()
            .trim_end_matches(" utc")
            .trim_end_matches(" gmt")
            .trim_end_matches('z')
            .trim();
        let reference = parse_timestamp(&reference.to_uppercase())
            .map_err(|_| TimeParseError::InvalidUnits(units.to_string()))?;

        Ok(Self { step_ms, reference })
    }

    /// Convert an encoded offset into a timestamp.
    ///
    /// Returns `None` for non-finite values or values outside chrono's range.
    pub fn decode(&self, value: f64) -> Option<NaiveDateTime> {
        if !value.is_finite() {
            return None;
        }
        let offset_ms = (value * self.step_ms as f64).round();
        if offset_ms.abs() > i64::MAX as f64 {
            return None;
        }
        self.reference
            .checked_add_signed(Duration::milliseconds(offset_ms as i64))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Invalid CF time units: {0}")]
    InvalidUnits(String),
}
