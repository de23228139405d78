//! Gridded dataset store for near-surface temperature data.
//!
//! This crate defines the labeled multidimensional array store the service
//! reads from, and two implementations of it:
//!
//! - [`NetCdfDataset`]: a NetCDF-4 file opened with the native `netcdf`
//!   library (libnetcdf + HDF5).
//! - [`InMemoryDataset`]: an in-memory cube used for fixtures and fakes.
//!
//! # Data Layout
//!
//! Datasets expose one data variable over the named dimensions `time`,
//! `lat`, `lon` and optionally `height`. Whatever order the variable is
//! stored in, [`GriddedDataset::read_block`] returns values in canonical
//! `(time, lat, lon)` row-major order for a single height level, with fill
//! and missing values decoded to `NaN`.
//!
//! ```text
//! TMP(time, height, lat, lon)  --read_block(window)-->  GridBlock[t][i][j]
//! ```

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use chrono::NaiveDateTime;

pub mod error;
pub mod memory;
pub mod native;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryDataset, MemoryOpener};
pub use native::{silence_hdf5_errors, NetCdfDataset, NetCdfOpener};

/// Coordinate axes of a gridded dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxes {
    /// Time coordinate, decoded from CF units.
    pub time: Vec<NaiveDateTime>,
    /// Latitude in degrees, ascending or descending.
    pub lat: Vec<f64>,
    /// Longitude in degrees, ascending or descending.
    pub lon: Vec<f64>,
    /// Vertical level coordinate, absent for single-level files.
    pub height: Option<Vec<f64>>,
}

impl GridAxes {
    /// Shape as (time, lat, lon).
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.time.len(), self.lat.len(), self.lon.len())
    }

    /// Number of vertical levels (1 for single-level files).
    pub fn num_levels(&self) -> usize {
        self.height.as_ref().map(|h| h.len()).unwrap_or(1)
    }

    /// True when latitude is stored north to south.
    pub fn lat_descending(&self) -> bool {
        self.lat.len() > 1 && self.lat[0] > self.lat[self.lat.len() - 1]
    }

    /// Check that a window fits inside these axes.
    pub fn check_window(&self, window: &GridWindow) -> StoreResult<()> {
        let fits = |r: &Range<usize>, len: usize| r.start <= r.end && r.end <= len;
        if !fits(&window.time, self.time.len())
            || !fits(&window.lat, self.lat.len())
            || !fits(&window.lon, self.lon.len())
        {
            return Err(StoreError::InvalidWindow(format!(
                "{:?} outside axes {:?}",
                window,
                self.shape()
            )));
        }
        if let Some(level) = window.height {
            if level >= self.num_levels() {
                return Err(StoreError::InvalidWindow(format!(
                    "height index {} outside {} levels",
                    level,
                    self.num_levels()
                )));
            }
        }
        Ok(())
    }
}

/// Index window into a dataset (half-open ranges on each axis).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridWindow {
    pub time: Range<usize>,
    pub lat: Range<usize>,
    pub lon: Range<usize>,
    /// Height level index; `None` for datasets without a height axis.
    pub height: Option<usize>,
}

impl GridWindow {
    /// Shape as (time, lat, lon).
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.time.len(), self.lat.len(), self.lon.len())
    }

    /// Total number of grid cells in the window.
    pub fn num_cells(&self) -> usize {
        let (nt, ny, nx) = self.shape();
        nt * ny * nx
    }

    pub fn is_empty(&self) -> bool {
        self.num_cells() == 0
    }
}

/// A block of values read from a dataset, with its coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GridBlock {
    /// Values in (time, lat, lon) row-major order; missing values are NaN.
    pub values: Vec<f32>,
    pub times: Vec<NaiveDateTime>,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
}

impl GridBlock {
    /// Create a block, checking that the value count matches the coordinates.
    pub fn new(
        values: Vec<f32>,
        times: Vec<NaiveDateTime>,
        lats: Vec<f64>,
        lons: Vec<f64>,
    ) -> StoreResult<Self> {
        let expected = times.len() * lats.len() * lons.len();
        if values.len() != expected {
            return Err(StoreError::InvalidFormat(format!(
                "block has {} values, expected {} ({}x{}x{})",
                values.len(),
                expected,
                times.len(),
                lats.len(),
                lons.len()
            )));
        }
        Ok(Self {
            values,
            times,
            lats,
            lons,
        })
    }

    /// An empty block.
    pub fn empty() -> Self {
        Self {
            values: Vec::new(),
            times: Vec::new(),
            lats: Vec::new(),
            lons: Vec::new(),
        }
    }

    /// Shape as (time, lat, lon).
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.times.len(), self.lats.len(), self.lons.len())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at (time, lat, lon) indices.
    pub fn get(&self, t: usize, i: usize, j: usize) -> Option<f32> {
        let (nt, ny, nx) = self.shape();
        if t >= nt || i >= ny || j >= nx {
            return None;
        }
        self.values.get((t * ny + i) * nx + j).copied()
    }
}

/// Dimension and variable listing, used for request diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub dimensions: Vec<(String, usize)>,
    pub variables: Vec<String>,
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self
            .dimensions
            .iter()
            .map(|(name, len)| format!("{}: {}", name, len))
            .collect();
        write!(f, "dims {{{}}}, variables {:?}", dims.join(", "), self.variables)
    }
}

/// A read-only labeled array store holding one temperature variable.
///
/// Implementations must be safe for concurrent reads once opened.
pub trait GriddedDataset: Send + Sync + fmt::Debug {
    /// Name of the data variable (e.g. "TMP").
    fn variable(&self) -> &str;

    /// Units attribute of the data variable, if present.
    fn units(&self) -> Option<&str>;

    /// Coordinate axes.
    fn axes(&self) -> &GridAxes;

    /// Read a window of the data variable.
    fn read_block(&self, window: &GridWindow) -> StoreResult<GridBlock>;

    /// Dimension sizes and variable names.
    fn summary(&self) -> DatasetSummary {
        let axes = self.axes();
        let mut dimensions = vec![
            ("time".to_string(), axes.time.len()),
            ("lat".to_string(), axes.lat.len()),
            ("lon".to_string(), axes.lon.len()),
        ];
        let mut variables = vec!["time".to_string(), "lat".to_string(), "lon".to_string()];
        if let Some(height) = &axes.height {
            dimensions.push(("height".to_string(), height.len()));
            variables.push("height".to_string());
        }
        variables.push(self.variable().to_string());
        DatasetSummary {
            dimensions,
            variables,
        }
    }
}

/// Opens the backing dataset from its configured location.
pub trait DatasetOpener: Send + Sync {
    /// Open the dataset. Called once per cache fill.
    fn open(&self) -> StoreResult<Arc<dyn GriddedDataset>>;

    /// Human-readable location of the dataset, for logs.
    fn source(&self) -> String;
}
