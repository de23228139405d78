//! Fixtures for the climate subset workspace tests.
//!
//! - [`fixtures`]: the central-Texas reference cube (17 x 17 points at
//!   0.125°, 48 hourly steps, 2 m and 10 m levels), mirrored variants with
//!   north-to-south or east-to-west axes, a single-point dataset and a
//!   [`MemoryOpener`](netcdf_store::MemoryOpener) serving the reference cube.
//! - [`generators`]: the Kelvin cube behind the reference datasets.
//! - [`paths`]: a NetCDF writer for on-disk fixtures and lookup of the
//!   optional production file `combined_data.nc`.

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Returns from the current test when `$name` is not found by
/// [`find_test_file`], printing a skip notice.
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!("skipping: {} not found (set TEST_DATA_DIR)", $name);
                return;
            }
        }
    }};
}

/// Asserts `|left - right| <= epsilon`, comparing as `f64` so `f32` field
/// values can be checked against `f64` expectations.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        if (left - right).abs() > epsilon {
            panic!(
                "assertion failed: {} is not within {} of {} (diff {})",
                left,
                epsilon,
                right,
                (left - right).abs()
            );
        }
    }};
}
