//! Common test fixtures for the climate subset tests.
//!
//! The reference grid mimics an hourly 0.125° reanalysis tile over central
//! Texas with two height levels, so windows like "lat 30..31, lon -100..-99
//! on 2024-05-31" select real grid points.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use netcdf_store::{GridAxes, InMemoryDataset, MemoryOpener};

use crate::generators::create_temperature_cube;

/// Common bounding box definitions as `(min_lat, max_lat, min_lon, max_lon)`.
pub mod bbox {
    /// Inside the reference grid (9 x 9 points).
    pub const CENTRAL_TEXAS: (f64, f64, f64, f64) = (30.0, 31.0, -100.0, -99.0);

    /// The whole reference grid.
    pub const FULL_GRID: (f64, f64, f64, f64) = (29.5, 31.5, -100.5, -98.5);

    /// Exactly one grid point.
    pub const SINGLE_POINT: (f64, f64, f64, f64) = (30.0, 30.0, -100.0, -100.0);

    /// Between grid rows, selects nothing.
    pub const BETWEEN_POINTS: (f64, f64, f64, f64) = (30.01, 30.1, -100.0, -99.0);

    /// North of the reference grid.
    pub const OUTSIDE: (f64, f64, f64, f64) = (45.0, 46.0, -100.0, -99.0);

    /// Inverted latitude interval.
    pub const INVERTED: (f64, f64, f64, f64) = (31.0, 30.0, -100.0, -99.0);
}

/// Reference grid specification.
pub mod grid {
    /// Grid specification for testing.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub times: usize,
        pub width: usize,
        pub height: usize,
        pub min_lon: f64,
        pub min_lat: f64,
        pub resolution: f64,
    }

    /// 48 hours of a 17 x 17 grid at 0.125°, 29.5..31.5N, 100.5..98.5W.
    pub const CENTRAL_TEXAS: GridSpec = GridSpec {
        times: 48,
        width: 17,
        height: 17,
        min_lon: -100.5,
        min_lat: 29.5,
        resolution: 0.125,
    };

    /// Height levels of the reference grid.
    pub const LEVELS: [f64; 2] = [2.0, 10.0];

    impl GridSpec {
        /// Returns the total number of grid cells per level.
        pub fn size(&self) -> usize {
            self.times * self.width * self.height
        }

        /// Ascending latitude coordinates.
        pub fn lats(&self) -> Vec<f64> {
            (0..self.height)
                .map(|i| self.min_lat + i as f64 * self.resolution)
                .collect()
        }

        /// Ascending longitude coordinates.
        pub fn lons(&self) -> Vec<f64> {
            (0..self.width)
                .map(|j| self.min_lon + j as f64 * self.resolution)
                .collect()
        }
    }
}

/// Common time values for testing.
pub mod time {
    /// First time step of the reference grid.
    pub const FIRST_STEP: &str = "2024-05-30T00:00:00";

    /// A day fully inside the reference grid.
    pub const QUERY_DAY: &str = "2024-05-31";

    /// Last time step of the reference grid.
    pub const LAST_STEP: &str = "2024-05-31T23:00:00";

    /// After the reference grid.
    pub const AFTER_GRID: &str = "2024-07-01";
}

/// Hourly time axis starting at [`time::FIRST_STEP`].
pub fn hourly_times(count: usize) -> Vec<NaiveDateTime> {
    let start = NaiveDate::from_ymd_opt(2024, 5, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    (0..count)
        .map(|h| start + Duration::hours(h as i64))
        .collect()
}

/// Reference dataset with ascending latitude.
pub fn central_texas_dataset() -> InMemoryDataset {
    let spec = grid::CENTRAL_TEXAS;
    let axes = GridAxes {
        time: hourly_times(spec.times),
        lat: spec.lats(),
        lon: spec.lons(),
        height: Some(grid::LEVELS.to_vec()),
    };
    let values = create_temperature_cube(spec.times, grid::LEVELS.len(), spec.height, spec.width);
    InMemoryDataset::new("TMP", axes, values).expect("reference grid is consistent")
}

/// Reference dataset stored north to south, same physical values.
pub fn central_texas_dataset_descending() -> InMemoryDataset {
    reordered_reference(true, false)
}

/// Reference dataset stored east to west, same physical values.
pub fn central_texas_dataset_descending_lon() -> InMemoryDataset {
    reordered_reference(false, true)
}

fn reordered_reference(reverse_lat: bool, reverse_lon: bool) -> InMemoryDataset {
    let spec = grid::CENTRAL_TEXAS;
    let ascending = create_temperature_cube(spec.times, grid::LEVELS.len(), spec.height, spec.width);

    let plane = spec.height * spec.width;
    let mut values: Vec<f32> = Vec::with_capacity(ascending.len());
    for slab in ascending.chunks(plane) {
        let rows: Vec<&[f32]> = if reverse_lat {
            slab.chunks(spec.width).rev().collect()
        } else {
            slab.chunks(spec.width).collect()
        };
        for row in rows {
            if reverse_lon {
                values.extend(row.iter().rev());
            } else {
                values.extend_from_slice(row);
            }
        }
    }

    let mut lat = spec.lats();
    if reverse_lat {
        lat.reverse();
    }
    let mut lon = spec.lons();
    if reverse_lon {
        lon.reverse();
    }
    let axes = GridAxes {
        time: hourly_times(spec.times),
        lat,
        lon,
        height: Some(grid::LEVELS.to_vec()),
    };
    InMemoryDataset::new("TMP", axes, values).expect("reference grid is consistent")
}

/// One grid point, one time step, at `kelvin`.
pub fn single_point_dataset(kelvin: f32) -> InMemoryDataset {
    let axes = GridAxes {
        time: hourly_times(1),
        lat: vec![30.0],
        lon: vec![-100.0],
        height: Some(vec![2.0]),
    };
    InMemoryDataset::new("TMP", axes, vec![kelvin]).expect("single point is consistent")
}

/// Opener serving [`central_texas_dataset`].
pub fn central_texas_opener() -> Arc<MemoryOpener> {
    Arc::new(MemoryOpener::new(central_texas_dataset()))
}
