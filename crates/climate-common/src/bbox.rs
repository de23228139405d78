//! Geographic bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in WGS84 degrees.
///
/// The box is stored exactly as requested. `min_lat > max_lat` is a valid
/// (empty) box; callers that need an ordered box use [`BoundingBox::is_empty`]
/// to detect it rather than silently swapping the edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its edges.
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Build a box from south-west and north-east corners, as sent by the
    /// map front end.
    pub fn from_corners(sw_lat: f64, sw_lon: f64, ne_lat: f64, ne_lon: f64) -> Self {
        Self::new(sw_lat, ne_lat, sw_lon, ne_lon)
    }

    /// True when either interval is inverted or any edge is not finite.
    pub fn is_empty(&self) -> bool {
        !self.is_finite() || self.min_lat > self.max_lat || self.min_lon > self.max_lon
    }

    pub fn is_finite(&self) -> bool {
        self.min_lat.is_finite()
            && self.max_lat.is_finite()
            && self.min_lon.is_finite()
            && self.max_lon.is_finite()
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Area in square degrees (zero for an empty box).
    pub fn area_sq_degrees(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.width() * self.height()
        }
    }

    /// Inclusive containment check on both axes.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}
