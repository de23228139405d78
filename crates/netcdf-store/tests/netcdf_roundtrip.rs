//! Reads NetCDF files written on the fly into a temp directory.

use std::path::Path;

use chrono::{Duration, NaiveDate};
use netcdf_store::{
    DatasetOpener, GridAxes, GridWindow, GriddedDataset, InMemoryDataset, NetCdfDataset,
    NetCdfOpener, StoreError,
};
use test_utils::write_netcdf_dataset;

const FILL: f32 = -9999.0;

/// TMP(time, height, lat, lon) with descending latitude.
fn write_surface_file(path: &Path) {
    let t0 = NaiveDate::from_ymd_opt(2024, 5, 31)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let axes = GridAxes {
        time: vec![t0, t0 + Duration::hours(1)],
        lat: vec![31.0, 30.5, 30.0],
        lon: vec![-100.0, -99.5],
        height: Some(vec![2.0, 10.0]),
    };

    // value = 300 + 10*t + 100*level + 2*i + j, with one gap
    let mut data = Vec::new();
    for t in 0..2 {
        for z in 0..2 {
            for i in 0..3 {
                for j in 0..2 {
                    data.push(300.0 + 10.0 * t as f32 + 100.0 * z as f32 + 2.0 * i as f32 + j as f32);
                }
            }
        }
    }
    data[1] = f32::NAN;

    let ds = InMemoryDataset::new("TMP", axes, data).unwrap();
    write_netcdf_dataset(path, &ds, FILL).unwrap();
}

/// T2(time, lon, lat) with no height axis.
fn write_transposed_file(path: &Path) {
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("time", 1).unwrap();
    file.add_dimension("longitude", 3).unwrap();
    file.add_dimension("latitude", 2).unwrap();

    let mut time = file.add_variable::<f64>("time", &["time"]).unwrap();
    time.put_attribute("units", "days since 2024-06-01").unwrap();
    time.put_values(&[0.5f64], ..).unwrap();

    let mut lat = file.add_variable::<f64>("latitude", &["latitude"]).unwrap();
    lat.put_values(&[30.0f64, 31.0], ..).unwrap();

    let mut lon = file.add_variable::<f64>("longitude", &["longitude"]).unwrap();
    lon.put_values(&[-101.0f64, -100.0, -99.0], ..).unwrap();

    let mut t2 = file
        .add_variable::<f32>("T2", &["time", "longitude", "latitude"])
        .unwrap();
    // stored[lon][lat] = 10*lon_idx + lat_idx
    t2.put_values(&[0.0f32, 1.0, 10.0, 11.0, 20.0, 21.0], ..).unwrap();
}

#[test]
fn test_open_reads_axes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("combined_data.nc");
    write_surface_file(&path);

    let ds = NetCdfDataset::open(&path, "TMP").unwrap();
    let axes = ds.axes();
    assert_eq!(axes.shape(), (2, 3, 2));
    assert_eq!(axes.height, Some(vec![2.0, 10.0]));
    assert!(axes.lat_descending());
    assert_eq!(
        axes.time[1],
        NaiveDate::from_ymd_opt(2024, 5, 31)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap()
    );
    assert_eq!(ds.units(), Some("K"));
    assert_eq!(ds.variable(), "TMP");
}

#[test]
fn test_read_block_selects_level_and_decodes_fill() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("combined_data.nc");
    write_surface_file(&path);

    let ds = NetCdfDataset::open(&path, "TMP").unwrap();
    let window = GridWindow {
        time: 0..2,
        lat: 0..2,
        lon: 0..2,
        height: Some(0),
    };
    let block = ds.read_block(&window).unwrap();
    assert_eq!(block.shape(), (2, 2, 2));
    assert_eq!(block.get(0, 0, 0), Some(300.0));
    assert!(block.get(0, 0, 1).unwrap().is_nan());
    assert_eq!(block.get(0, 1, 1), Some(303.0));
    assert_eq!(block.get(1, 1, 0), Some(312.0));
    assert_eq!(block.lats, vec![31.0, 30.5]);

    let upper = GridWindow {
        height: Some(1),
        ..window
    };
    let block = ds.read_block(&upper).unwrap();
    assert_eq!(block.get(0, 0, 0), Some(400.0));
}

#[test]
fn test_read_block_reorders_transposed_variable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transposed.nc");
    write_transposed_file(&path);

    let ds = NetCdfDataset::open(&path, "T2").unwrap();
    assert_eq!(ds.axes().height, None);
    assert_eq!(
        ds.axes().time[0],
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    );

    let window = GridWindow {
        time: 0..1,
        lat: 0..2,
        lon: 1..3,
        height: None,
    };
    let block = ds.read_block(&window).unwrap();
    // canonical (time, lat, lon) order
    assert_eq!(block.values, vec![10.0, 20.0, 11.0, 21.0]);
}

#[test]
fn test_empty_window_returns_empty_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("combined_data.nc");
    write_surface_file(&path);

    let ds = NetCdfDataset::open(&path, "TMP").unwrap();
    let window = GridWindow {
        time: 1..1,
        lat: 0..3,
        lon: 0..2,
        height: Some(0),
    };
    let block = ds.read_block(&window).unwrap();
    assert!(block.is_empty());
}

#[test]
fn test_missing_variable_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("combined_data.nc");
    write_surface_file(&path);

    let result = NetCdfDataset::open(&path, "RH");
    assert!(matches!(result, Err(StoreError::MissingData(_))));
}

#[test]
fn test_opener_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let opener = NetCdfOpener::new(dir.path().join("missing.nc"), "TMP");
    assert!(opener.source().ends_with("missing.nc"));
    assert!(matches!(opener.open(), Err(StoreError::NotFound(_))));
}
