//! Native NetCDF dataset access using the netcdf library.
//!
//! The file is opened once and kept behind a mutex: libnetcdf handles are
//! not safe for unsynchronized concurrent access, and reads are short
//! enough that serializing them is cheaper than reopening per request.
//!
//! # Dimension Names
//!
//! The data variable may use any of the common aliases below, in any order.
//! Extra dimensions of length 1 are tolerated and read at index 0.
//!
//! | Axis   | Accepted names                  |
//! |--------|---------------------------------|
//! | time   | `time`, `t`                     |
//! | lat    | `lat`, `latitude`, `y`          |
//! | lon    | `lon`, `longitude`, `x`         |
//! | height | `height`, `level`, `lev`, `z`   |

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Once, PoisonError};

use chrono::NaiveDateTime;
use climate_common::CfTimeUnits;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::{DatasetOpener, GridAxes, GridBlock, GridWindow, GriddedDataset};

const TIME_NAMES: &[&str] = &["time", "t"];
const LAT_NAMES: &[&str] = &["lat", "latitude", "y"];
const LON_NAMES: &[&str] = &["lon", "longitude", "x"];
const HEIGHT_NAMES: &[&str] = &["height", "level", "lev", "z"];

/// Silence HDF5's automatic error printing to stderr.
///
/// HDF5 prints diagnostic stacks even for errors the caller handles, such as
/// probing for optional attributes. Call once at startup before any file is
/// opened; repeated calls are no-ops.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable automatic error output.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Role of one dimension of the data variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Time,
    Lat,
    Lon,
    Height,
    /// Degenerate extra dimension, always read at index 0.
    Singleton,
}

/// Value decoding attributes of the data variable.
#[derive(Debug, Clone, Copy)]
struct Packing {
    scale_factor: f64,
    add_offset: f64,
    fill_value: Option<f64>,
    missing_value: Option<f64>,
}

impl Packing {
    fn decode(&self, raw: f64) -> f32 {
        if !raw.is_finite()
            || self.fill_value.is_some_and(|f| raw == f)
            || self.missing_value.is_some_and(|m| raw == m)
        {
            return f32::NAN;
        }
        (raw * self.scale_factor + self.add_offset) as f32
    }
}

/// A NetCDF file holding one gridded temperature variable.
#[derive(Debug)]
pub struct NetCdfDataset {
    path: PathBuf,
    variable: String,
    units: Option<String>,
    axes: GridAxes,
    dim_axes: Vec<Axis>,
    packing: Packing,
    file: Mutex<netcdf::File>,
}

impl NetCdfDataset {
    /// Open `path` and index the coordinates of `variable`.
    pub fn open(path: impl AsRef<Path>, variable: &str) -> StoreResult<Self> {
        silence_hdf5_errors();

        let path = path.as_ref();
        if !path.exists() {
            return Err(StoreError::NotFound(path.display().to_string()));
        }

        let file = netcdf::open(path)
            .map_err(|e| StoreError::Open(format!("{}: {}", path.display(), e)))?;

        let var = file
            .variable(variable)
            .ok_or_else(|| StoreError::MissingData(format!("{} variable", variable)))?;

        let mut dim_axes = Vec::new();
        for dim in var.dimensions() {
            let axis = classify_dimension(&dim.name(), dim.len())?;
            dim_axes.push(axis);
        }
        for required in [Axis::Time, Axis::Lat, Axis::Lon] {
            if !dim_axes.contains(&required) {
                return Err(StoreError::MissingData(format!(
                    "{:?} dimension on {}",
                    required, variable
                )));
            }
        }

        let dim_names: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let coord_name = |axis: Axis| -> Option<&str> {
            dim_axes
                .iter()
                .position(|a| *a == axis)
                .map(|i| dim_names[i].as_str())
        };

        let time_name = coord_name(Axis::Time).unwrap_or("time");
        let time = read_time_axis(&file, time_name)?;
        let lat = read_coordinate(&file, coord_name(Axis::Lat).unwrap_or("lat"))?;
        let lon = read_coordinate(&file, coord_name(Axis::Lon).unwrap_or("lon"))?;
        let height = match coord_name(Axis::Height) {
            Some(name) => Some(read_coordinate(&file, name)?),
            None => None,
        };

        let packing = Packing {
            scale_factor: get_f64_attr(&var, "scale_factor").unwrap_or(1.0),
            add_offset: get_f64_attr(&var, "add_offset").unwrap_or(0.0),
            fill_value: get_f64_attr(&var, "_FillValue"),
            missing_value: get_f64_attr(&var, "missing_value"),
        };
        let units = get_string_attr(&var, "units");

        let axes = GridAxes {
            time,
            lat,
            lon,
            height,
        };

        info!(
            path = %path.display(),
            variable = variable,
            times = axes.time.len(),
            lats = axes.lat.len(),
            lons = axes.lon.len(),
            levels = axes.num_levels(),
            "Opened NetCDF dataset"
        );

        drop(var);
        Ok(Self {
            path: path.to_path_buf(),
            variable: variable.to_string(),
            units,
            axes,
            dim_axes,
            packing,
            file: Mutex::new(file),
        })
    }

    /// Path the dataset was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GriddedDataset for NetCdfDataset {
    fn variable(&self) -> &str {
        &self.variable
    }

    fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    fn axes(&self) -> &GridAxes {
        &self.axes
    }

    fn read_block(&self, window: &GridWindow) -> StoreResult<GridBlock> {
        self.axes.check_window(window)?;

        let times = self.axes.time[window.time.clone()].to_vec();
        let lats = self.axes.lat[window.lat.clone()].to_vec();
        let lons = self.axes.lon[window.lon.clone()].to_vec();
        if window.is_empty() {
            return GridBlock::new(Vec::new(), times, lats, lons);
        }

        // Extents and strides in the variable's native dimension order.
        let mut extents: Vec<netcdf::Extent> = Vec::with_capacity(self.dim_axes.len());
        let mut counts = Vec::with_capacity(self.dim_axes.len());
        for axis in &self.dim_axes {
            let range = match axis {
                Axis::Time => window.time.clone(),
                Axis::Lat => window.lat.clone(),
                Axis::Lon => window.lon.clone(),
                Axis::Height => {
                    let level = window.height.unwrap_or(0);
                    level..level + 1
                }
                Axis::Singleton => 0..1,
            };
            counts.push(range.len());
            extents.push(range.into());
        }

        let raw: Vec<f64> = {
            let file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
            let var = file
                .variable(&self.variable)
                .ok_or_else(|| StoreError::MissingData(format!("{} variable", self.variable)))?;
            var.get_values::<f64, _>(extents)
                .map_err(|e| StoreError::Read(format!("{}: {}", self.variable, e)))?
        };

        let mut strides = vec![1usize; counts.len()];
        for i in (0..counts.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * counts[i + 1];
        }
        let stride_of = |axis: Axis| -> usize {
            self.dim_axes
                .iter()
                .position(|a| *a == axis)
                .map(|i| strides[i])
                .unwrap_or(0)
        };
        let (st, sy, sx) = (
            stride_of(Axis::Time),
            stride_of(Axis::Lat),
            stride_of(Axis::Lon),
        );

        let (nt, ny, nx) = window.shape();
        let mut values = Vec::with_capacity(nt * ny * nx);
        for t in 0..nt {
            for i in 0..ny {
                for j in 0..nx {
                    let raw_value = raw[t * st + i * sy + j * sx];
                    values.push(self.packing.decode(raw_value));
                }
            }
        }

        debug!(
            variable = %self.variable,
            shape = ?(nt, ny, nx),
            "Read NetCDF block"
        );

        GridBlock::new(values, times, lats, lons)
    }
}

/// Opens a [`NetCdfDataset`] from a fixed path.
#[derive(Debug, Clone)]
pub struct NetCdfOpener {
    path: PathBuf,
    variable: String,
}

impl NetCdfOpener {
    pub fn new(path: impl Into<PathBuf>, variable: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            variable: variable.into(),
        }
    }
}

impl DatasetOpener for NetCdfOpener {
    fn open(&self) -> StoreResult<Arc<dyn GriddedDataset>> {
        let dataset = NetCdfDataset::open(&self.path, &self.variable)?;
        Ok(Arc::new(dataset))
    }

    fn source(&self) -> String {
        self.path.display().to_string()
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

fn classify_dimension(name: &str, len: usize) -> StoreResult<Axis> {
    let lower = name.to_ascii_lowercase();
    let axis = if TIME_NAMES.contains(&lower.as_str()) {
        Axis::Time
    } else if LAT_NAMES.contains(&lower.as_str()) {
        Axis::Lat
    } else if LON_NAMES.contains(&lower.as_str()) {
        Axis::Lon
    } else if HEIGHT_NAMES.contains(&lower.as_str()) {
        Axis::Height
    } else if len == 1 {
        Axis::Singleton
    } else {
        return Err(StoreError::InvalidFormat(format!(
            "unsupported dimension {} (length {})",
            name, len
        )));
    };
    Ok(axis)
}

fn read_coordinate(file: &netcdf::File, name: &str) -> StoreResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| StoreError::MissingData(format!("{} coordinate variable", name)))?;
    var.get_values::<f64, _>(..)
        .map_err(|e| StoreError::InvalidFormat(format!("Failed to read {}: {}", name, e)))
}

fn read_time_axis(file: &netcdf::File, name: &str) -> StoreResult<Vec<NaiveDateTime>> {
    let var = file
        .variable(name)
        .ok_or_else(|| StoreError::MissingData(format!("{} coordinate variable", name)))?;
    let units_attr = get_string_attr(&var, "units")
        .ok_or_else(|| StoreError::MissingData(format!("units attribute on {}", name)))?;
    let units = CfTimeUnits::parse(&units_attr)
        .map_err(|e| StoreError::InvalidFormat(format!("{}: {}", name, e)))?;

    let raw: Vec<f64> = var
        .get_values(..)
        .map_err(|e| StoreError::InvalidFormat(format!("Failed to read {}: {}", name, e)))?;

    raw.iter()
        .map(|&v| {
            units.decode(v).ok_or_else(|| {
                StoreError::InvalidFormat(format!("time value {} out of range", v))
            })
        })
        .collect()
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_dimension_aliases() {
        assert_eq!(classify_dimension("time", 24).unwrap(), Axis::Time);
        assert_eq!(classify_dimension("Latitude", 10).unwrap(), Axis::Lat);
        assert_eq!(classify_dimension("lon", 10).unwrap(), Axis::Lon);
        assert_eq!(classify_dimension("level", 3).unwrap(), Axis::Height);
        assert_eq!(classify_dimension("member", 1).unwrap(), Axis::Singleton);
        assert!(classify_dimension("member", 5).is_err());
    }

    #[test]
    fn test_packing_decodes_fill_and_scale() {
        let packing = Packing {
            scale_factor: 0.01,
            add_offset: 250.0,
            fill_value: Some(-32767.0),
            missing_value: None,
        };
        assert!((packing.decode(5000.0) - 300.0).abs() < 1e-4);
        assert!(packing.decode(-32767.0).is_nan());
        assert!(packing.decode(f64::NAN).is_nan());
    }

    #[test]
    fn test_open_missing_file() {
        let result = NetCdfDataset::open("/nonexistent/combined_data.nc", "TMP");
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
