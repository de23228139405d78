//! Subset query parsing and window resolution.
//!
//! A [`SubsetQuery`] is expressed in coordinate values (dates, degrees, a
//! height level). [`resolve_window`] turns it into index ranges against a
//! dataset's axes, treating every bound as inclusive regardless of whether
//! the axis is stored ascending or descending.

use std::ops::Range;

use chrono::NaiveDateTime;
use climate_common::{parse_timestamp, BoundingBox};
use netcdf_store::{GridAxes, GridWindow};
use serde::{Deserialize, Serialize};

use crate::error::{GridProcessorError, Result};

/// Height level of near-surface (2 m) air temperature.
pub const SURFACE_HEIGHT: f64 = 2.0;

/// A bounded spatial/temporal subset request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetQuery {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub bbox: BoundingBox,
    /// Height level selected by exact match.
    pub height: f64,
}

impl SubsetQuery {
    /// Surface-level query over `bbox` between `start` and `end` inclusive.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, bbox: BoundingBox) -> Self {
        Self {
            start,
            end,
            bbox,
            height: SURFACE_HEIGHT,
        }
    }

    /// Build a query from date strings and an already-parsed box.
    pub fn from_dates(start_date: &str, end_date: &str, bbox: BoundingBox) -> Result<Self> {
        let start = parse_date("start_date", start_date)?;
        let end = parse_date("end_date", end_date)?;
        Ok(Self::new(start, end, bbox))
    }
}

/// Raw query-string parameters of a data request.
///
/// Every field is required; they are kept optional here so a missing
/// parameter is reported by name instead of as a generic decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubsetParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub min_lat: Option<String>,
    pub max_lat: Option<String>,
    pub min_lon: Option<String>,
    pub max_lon: Option<String>,
}

impl SubsetParams {
    /// Validate and convert into a [`SubsetQuery`].
    pub fn parse(&self) -> Result<SubsetQuery> {
        let min_lat = parse_coord("min_lat", self.min_lat.as_deref())?;
        let max_lat = parse_coord("max_lat", self.max_lat.as_deref())?;
        let min_lon = parse_coord("min_lon", self.min_lon.as_deref())?;
        let max_lon = parse_coord("max_lon", self.max_lon.as_deref())?;

        let start_date = required("start_date", self.start_date.as_deref())?;
        let end_date = required("end_date", self.end_date.as_deref())?;

        SubsetQuery::from_dates(
            start_date,
            end_date,
            BoundingBox::new(min_lat, max_lat, min_lon, max_lon),
        )
    }
}

fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str> {
    value.ok_or_else(|| {
        GridProcessorError::invalid_query(format!("Missing required parameter: {}", name))
    })
}

fn parse_coord(name: &str, value: Option<&str>) -> Result<f64> {
    let raw = required(name, value)?;
    raw.trim().parse::<f64>().map_err(|_| {
        GridProcessorError::invalid_query(format!(
            "could not convert string to float for {}: '{}'",
            name, raw
        ))
    })
}

fn parse_date(name: &str, value: &str) -> Result<NaiveDateTime> {
    parse_timestamp(value)
        .map_err(|e| GridProcessorError::invalid_query(format!("Invalid {}: {}", name, e)))
}

/// Resolve a query against dataset axes.
///
/// Returns `None` when the window holds no grid points: an inverted or
/// non-finite box, an inverted date range, no coordinate inside a bound, or
/// a height axis without the requested level. Datasets without a height
/// axis ignore the level selector.
pub fn resolve_window(axes: &GridAxes, query: &SubsetQuery) -> Option<GridWindow> {
    if query.bbox.is_empty() || query.start > query.end {
        return None;
    }

    let height = match &axes.height {
        Some(levels) => Some(levels.iter().position(|&h| h == query.height)?),
        None => None,
    };

    let window = GridWindow {
        time: inclusive_range(&axes.time, query.start, query.end),
        lat: inclusive_range(&axes.lat, query.bbox.min_lat, query.bbox.max_lat),
        lon: inclusive_range(&axes.lon, query.bbox.min_lon, query.bbox.max_lon),
        height,
    };

    if window.is_empty() {
        None
    } else {
        Some(window)
    }
}

/// Index range of a monotonic axis whose values lie in `[lo, hi]`.
///
/// Works on ascending and descending axes; `lo > hi` yields an empty range.
pub fn inclusive_range<T: PartialOrd + Copy>(axis: &[T], lo: T, hi: T) -> Range<usize> {
    if axis.is_empty() || lo > hi {
        return 0..0;
    }
    let descending = axis.len() > 1 && axis[0] > axis[axis.len() - 1];
    let (start, end) = if descending {
        (
            axis.partition_point(|&v| v > hi),
            axis.partition_point(|&v| v >= lo),
        )
    } else {
        (
            axis.partition_point(|&v| v < lo),
            axis.partition_point(|&v| v <= hi),
        )
    };
    if start >= end {
        0..0
    } else {
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn params() -> SubsetParams {
        SubsetParams {
            start_date: Some("2024-05-31".into()),
            end_date: Some("2024-05-31T06:00".into()),
            min_lat: Some("30".into()),
            max_lat: Some("31".into()),
            min_lon: Some("-100".into()),
            max_lon: Some(" -99 ".into()),
        }
    }

    fn axes(lat: Vec<f64>) -> GridAxes {
        GridAxes {
            time: (0..24).map(|h| ts(31, h)).collect(),
            lat,
            lon: vec![-100.5, -100.0, -99.5, -99.0, -98.5],
            height: Some(vec![2.0, 10.0]),
        }
    }

    #[test]
    fn test_parse_params() {
        let query = params().parse().unwrap();
        assert_eq!(query.start, ts(31, 0));
        assert_eq!(query.end, ts(31, 6));
        assert_eq!(query.bbox, BoundingBox::new(30.0, 31.0, -100.0, -99.0));
        assert_eq!(query.height, SURFACE_HEIGHT);
    }

    #[test]
    fn test_parse_missing_param_names_it() {
        let mut p = params();
        p.max_lon = None;
        let err = p.parse().unwrap_err();
        assert!(err.to_string().contains("max_lon"));
    }

    #[test]
    fn test_parse_bad_values() {
        let mut p = params();
        p.min_lat = Some("north".into());
        assert!(matches!(p.parse(), Err(GridProcessorError::InvalidQuery(_))));

        let mut p = params();
        p.start_date = Some("yesterday".into());
        let err = p.parse().unwrap_err();
        assert!(err.to_string().contains("start_date"));
    }

    #[test]
    fn test_inclusive_range_ascending() {
        let axis = [29.5, 30.0, 30.5, 31.0, 31.5];
        assert_eq!(inclusive_range(&axis, 30.0, 31.0), 1..4);
        assert_eq!(inclusive_range(&axis, 30.2, 30.4), 0..0);
        assert_eq!(inclusive_range(&axis, 20.0, 40.0), 0..5);
        assert_eq!(inclusive_range(&axis, 31.0, 30.0), 0..0);
    }

    #[test]
    fn test_inclusive_range_descending() {
        let axis = [31.5, 31.0, 30.5, 30.0, 29.5];
        assert_eq!(inclusive_range(&axis, 30.0, 31.0), 1..4);
        assert_eq!(inclusive_range(&axis, 29.5, 29.5), 4..5);
        assert_eq!(inclusive_range(&axis, 32.0, 33.0), 0..0);
    }

    #[test]
    fn test_resolve_window_same_for_both_directions() {
        let query = params().parse().unwrap();
        let asc = resolve_window(&axes(vec![29.5, 30.0, 30.5, 31.0, 31.5]), &query).unwrap();
        let desc = resolve_window(&axes(vec![31.5, 31.0, 30.5, 30.0, 29.5]), &query).unwrap();
        assert_eq!(asc.shape(), (7, 3, 3));
        assert_eq!(desc.shape(), asc.shape());
        assert_eq!(asc.height, Some(0));
    }

    #[test]
    fn test_resolve_window_empty_cases() {
        let axes = axes(vec![29.5, 30.0, 30.5, 31.0, 31.5]);
        let query = params().parse().unwrap();

        let mut inverted = query.clone();
        inverted.bbox = BoundingBox::new(31.0, 30.0, -100.0, -99.0);
        assert!(resolve_window(&axes, &inverted).is_none());

        let mut missing_level = query.clone();
        missing_level.height = 5.0;
        assert!(resolve_window(&axes, &missing_level).is_none());

        let mut backwards = query.clone();
        backwards.start = ts(31, 12);
        assert!(resolve_window(&axes, &backwards).is_none());

        let mut outside = query;
        outside.bbox = BoundingBox::new(40.0, 41.0, -100.0, -99.0);
        assert!(resolve_window(&axes, &outside).is_none());
    }

    #[test]
    fn test_resolve_window_without_height_axis() {
        let mut axes = axes(vec![30.0, 31.0]);
        axes.height = None;
        let mut query = params().parse().unwrap();
        query.height = 10.0;
        let window = resolve_window(&axes, &query).unwrap();
        assert_eq!(window.height, None);
    }

    #[test]
    fn test_single_timestamp_range() {
        let axes = axes(vec![30.0, 31.0]);
        let query = SubsetQuery::from_dates(
            "2024-05-31T03:00:00",
            "2024-05-31T03:00:00",
            BoundingBox::new(30.0, 31.0, -100.0, -99.0),
        )
        .unwrap();
        let window = resolve_window(&axes, &query).unwrap();
        assert_eq!(window.time, 3..4);
    }
}
