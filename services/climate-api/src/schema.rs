//! Request and response bodies of the export endpoints.

use climate_common::BoundingBox;
use grid_processor::SubsetQuery;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Attachment name used when the request has no usable filename.
pub const DEFAULT_EXPORT_NAME: &str = "temperature_data";

/// Attachment name of the PDF report.
pub const REPORT_FILENAME: &str = "temperature_report.pdf";

const MAX_FILENAME_LEN: usize = 100;

/// Map selection corners as sent by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub sw_lat: f64,
    pub sw_lon: f64,
    pub ne_lat: f64,
    pub ne_lon: f64,
}

impl Bounds {
    pub fn to_bbox(&self) -> BoundingBox {
        BoundingBox::from_corners(self.sw_lat, self.sw_lon, self.ne_lat, self.ne_lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

/// Body of `POST /api/download-geotiff`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterExportRequest {
    pub bounds: Bounds,
    pub dates: DateRange,
    #[serde(default)]
    pub filename: Option<String>,
}

impl RasterExportRequest {
    pub fn query(&self) -> Result<SubsetQuery, ApiError> {
        build_query(&self.bounds, &self.dates)
    }

    /// Sanitized attachment stem.
    pub fn export_name(&self) -> String {
        sanitize_filename(self.filename.as_deref().unwrap_or_default())
    }
}

/// Body of `POST /api/download-pdf`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub bounds: Bounds,
    pub dates: DateRange,
}

impl ReportRequest {
    pub fn query(&self) -> Result<SubsetQuery, ApiError> {
        build_query(&self.bounds, &self.dates)
    }
}

/// `{"message": ...}` acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

fn build_query(bounds: &Bounds, dates: &DateRange) -> Result<SubsetQuery, ApiError> {
    Ok(SubsetQuery::from_dates(
        &dates.start_date,
        &dates.end_date,
        bounds.to_bbox(),
    )?)
}

/// Decode a JSON body, reporting failures as `InvalidQuery`.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::invalid_query(format!("Invalid request body: {}", e)))
}

/// Restrict a client-supplied name to `[A-Za-z0-9._-]` so it is safe in a
/// `Content-Disposition` header and on disk.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILENAME_LEN)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.trim_matches('_').is_empty() {
        DEFAULT_EXPORT_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raster_request_camel_case() {
        let body = json!({
            "bounds": {"swLat": 30.0, "swLon": -100.0, "neLat": 31.0, "neLon": -99.0},
            "dates": {"startDate": "2024-05-31", "endDate": "2024-05-31"},
            "filename": "texas"
        });
        let request: RasterExportRequest = parse_body(body.to_string().as_bytes()).unwrap();
        let query = request.query().unwrap();
        assert_eq!(query.bbox, BoundingBox::new(30.0, 31.0, -100.0, -99.0));
        assert_eq!(request.export_name(), "texas");
    }

    #[test]
    fn test_missing_filename_uses_default() {
        let body = json!({
            "bounds": {"swLat": 30.0, "swLon": -100.0, "neLat": 31.0, "neLon": -99.0},
            "dates": {"startDate": "2024-05-31", "endDate": "2024-05-31"}
        });
        let request: RasterExportRequest = parse_body(body.to_string().as_bytes()).unwrap();
        assert_eq!(request.export_name(), DEFAULT_EXPORT_NAME);
    }

    #[test]
    fn test_malformed_body_is_invalid_query() {
        let err = parse_body::<ReportRequest>(b"{\"bounds\": ").unwrap_err();
        assert_eq!(err.kind(), "InvalidQuery");

        let err = parse_body::<ReportRequest>(b"{\"dates\": {}}").unwrap_err();
        assert!(err.to_string().starts_with("Invalid request body"));
    }

    #[test]
    fn test_bad_date_is_invalid_query() {
        let request = ReportRequest {
            bounds: Bounds {
                sw_lat: 30.0,
                sw_lon: -100.0,
                ne_lat: 31.0,
                ne_lon: -99.0,
            },
            dates: DateRange {
                start_date: "yesterday".into(),
                end_date: "2024-05-31".into(),
            },
        };
        assert_eq!(request.query().unwrap_err().kind(), "InvalidQuery");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("texas_may"), "texas_may");
        assert_eq!(sanitize_filename("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_filename("a b\"c"), "a_b_c");
        assert_eq!(sanitize_filename("   "), DEFAULT_EXPORT_NAME);
        assert_eq!(sanitize_filename("///"), DEFAULT_EXPORT_NAME);
        assert_eq!(sanitize_filename(&"x".repeat(300)).len(), 100);
    }
}
