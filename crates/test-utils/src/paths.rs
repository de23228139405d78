//! Path utilities for locating test data files.
//!
//! Real datasets are large and not checked in; tests that need one use
//! [`find_test_file`] (or the `require_test_file!` macro) and skip when it
//! is absent. Small NetCDF files can be generated on the fly with
//! [`write_netcdf_dataset`].

use std::path::{Path, PathBuf};

use climate_common::format_iso8601;
use netcdf_store::{GridWindow, GriddedDataset, InMemoryDataset};

/// Returns the workspace root directory.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Returns the path to `crates/{crate_name}/testdata/`.
pub fn crate_testdata_dir(crate_name: &str) -> PathBuf {
    workspace_root()
        .join("crates")
        .join(crate_name)
        .join("testdata")
}

/// Searches for a test file in multiple locations.
///
/// This function checks the following locations in order:
/// 1. Environment variable `TEST_DATA_DIR` (if set)
/// 2. `data/` at the workspace root (where the service reads
///    `combined_data.nc` by default)
/// 3. `crates/netcdf-store/testdata/`
/// 4. `testdata/` at the workspace root
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(test_data_dir) = std::env::var("TEST_DATA_DIR") {
        candidates.push(PathBuf::from(test_data_dir).join(name));
    }

    let root = workspace_root();
    candidates.extend([
        root.join("data").join(name),
        crate_testdata_dir("netcdf-store").join(name),
        root.join("testdata").join(name),
    ]);

    candidates.into_iter().find(|path| path.exists())
}

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// Write `dataset` to a NetCDF-4 file laid out like the production file:
/// `TMP(time, height, lat, lon)` with CF time units in hours.
///
/// Missing values are stored as `fill` and declared as `_FillValue`.
pub fn write_netcdf_dataset(
    path: &Path,
    dataset: &InMemoryDataset,
    fill: f32,
) -> Result<(), netcdf::Error> {
    let axes = dataset.axes();
    let levels = axes.height.clone().unwrap_or_else(|| vec![2.0]);

    let mut file = netcdf::create(path)?;
    file.add_dimension("time", axes.time.len())?;
    file.add_dimension("height", levels.len())?;
    file.add_dimension("lat", axes.lat.len())?;
    file.add_dimension("lon", axes.lon.len())?;

    let reference = axes.time.first().copied().unwrap_or_default();
    let hours: Vec<f64> = axes
        .time
        .iter()
        .map(|t| (*t - reference).num_seconds() as f64 / 3600.0)
        .collect();

    let mut time = file.add_variable::<f64>("time", &["time"])?;
    time.put_attribute(
        "units",
        format!("hours since {}", format_iso8601(&reference).replace('T', " ")),
    )?;
    time.put_values(&hours, ..)?;

    let mut height = file.add_variable::<f64>("height", &["height"])?;
    height.put_attribute("units", "m")?;
    height.put_values(&levels, ..)?;

    let mut lat = file.add_variable::<f64>("lat", &["lat"])?;
    lat.put_attribute("units", "degrees_north")?;
    lat.put_values(&axes.lat, ..)?;

    let mut lon = file.add_variable::<f64>("lon", &["lon"])?;
    lon.put_attribute("units", "degrees_east")?;
    lon.put_values(&axes.lon, ..)?;

    let mut data = Vec::with_capacity(axes.time.len() * levels.len() * axes.lat.len() * axes.lon.len());
    for t in 0..axes.time.len() {
        for level in 0..levels.len() {
            let window = GridWindow {
                time: t..t + 1,
                lat: 0..axes.lat.len(),
                lon: 0..axes.lon.len(),
                height: axes.height.as_ref().map(|_| level),
            };
            let block = dataset
                .read_block(&window)
                .map_err(|e| netcdf::Error::Str(e.to_string()))?;
            data.extend(
                block
                    .values
                    .into_iter()
                    .map(|v| if v.is_nan() { fill } else { v }),
            );
        }
    }

    let mut tmp = file.add_variable::<f32>(dataset.variable(), &["time", "height", "lat", "lon"])?;
    tmp.put_attribute("units", dataset.units().unwrap_or("K"))?;
    tmp.put_attribute("_FillValue", fill)?;
    tmp.put_values(&data, ..)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_is_valid() {
        let root = workspace_root();
        assert!(
            root.join("Cargo.toml").exists(),
            "Workspace root should contain Cargo.toml: {:?}",
            root
        );
    }

    #[test]
    fn test_crate_testdata_dir() {
        let dir = crate_testdata_dir("netcdf-store");
        assert!(dir.to_string_lossy().contains("netcdf-store"));
        assert!(dir.to_string_lossy().ends_with("testdata"));
    }

    #[test]
    fn test_temp_test_dir() {
        let dir = temp_test_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_write_netcdf_dataset_reopens() {
        let dir = temp_test_dir();
        let path = dir.path().join("combined_data.nc");
        let ds = crate::fixtures::single_point_dataset(300.0);
        write_netcdf_dataset(&path, &ds, -9999.0).unwrap();

        let reopened = netcdf_store::NetCdfDataset::open(&path, "TMP").unwrap();
        assert_eq!(reopened.axes(), ds.axes());
    }
}
