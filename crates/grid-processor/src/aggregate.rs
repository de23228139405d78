//! Time averaging and summary statistics for raster and report exports.

use climate_common::{kelvin_to_celsius, BoundingBox};
use netcdf_store::{GridAxes, GridBlock};
use serde::Serialize;

use crate::error::{GridProcessorError, Result};

/// Affine pixel-to-geographic transform of a north-up raster.
///
/// `lon = origin_x + col * pixel_width`, `lat = origin_y - row * pixel_height`
/// for the upper-left corner of a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Transform spanning `bounds` with `width` x `height` pixels.
    pub fn from_bounds(bounds: &BoundingBox, width: usize, height: usize) -> Self {
        Self {
            origin_x: bounds.min_lon,
            origin_y: bounds.max_lat,
            pixel_width: bounds.width() / width.max(1) as f64,
            pixel_height: bounds.height() / height.max(1) as f64,
        }
    }

    /// GDAL-ordered coefficients `[x0, dx, 0, y0, 0, -dy]`.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            0.0,
            self.origin_y,
            0.0,
            -self.pixel_height,
        ]
    }

    /// Geographic (lon, lat) of the upper-left corner of a pixel.
    pub fn pixel_to_geo(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.origin_x + col as f64 * self.pixel_width,
            self.origin_y - row as f64 * self.pixel_height,
        )
    }
}

/// Min, max, mean and population standard deviation of the valid cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub valid_count: usize,
}

impl FieldStatistics {
    /// Statistics over the finite values of `values`; `None` if there are none.
    pub fn compute<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
        I::IntoIter: Clone,
    {
        let iter = values.into_iter().filter(|v| v.is_finite());

        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in iter.clone() {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        if count == 0 {
            return None;
        }

        let mean = sum / count as f64;
        let variance = iter.map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64;

        Some(Self {
            min,
            max,
            mean,
            std_dev: variance.sqrt(),
            valid_count: count,
        })
    }
}

/// Time-averaged 2-D temperature field in degrees Celsius.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanField {
    pub width: usize,
    pub height: usize,
    /// Row-major values, row 0 northernmost. Cells without data are NaN.
    pub values: Vec<f32>,
    /// Requested bounds the raster is georeferenced to.
    pub bounds: BoundingBox,
    /// Grid spacing as (lon, lat) degrees; 0 where unknown.
    pub cell_size: (f64, f64),
}

impl MeanField {
    /// Fill unknown grid spacing from the dataset axes.
    ///
    /// A block one cell wide carries no spacing of its own, so a
    /// single-point selection needs the dataset's.
    pub fn with_grid_resolution(mut self, axes: &GridAxes) -> Self {
        if self.cell_size.0 <= 0.0 {
            self.cell_size.0 = axis_step(&axes.lon);
        }
        if self.cell_size.1 <= 0.0 {
            self.cell_size.1 = axis_step(&axes.lat);
        }
        self
    }

    /// Transform from the requested bounds.
    ///
    /// On an axis where the bounds collapse to a line (min == max) the
    /// pixel is one grid cell centred on the selected coordinate.
    pub fn geo_transform(&self) -> GeoTransform {
        let mut transform = GeoTransform::from_bounds(&self.bounds, self.width, self.height);
        let (dx, dy) = self.cell_size;
        if transform.pixel_width <= 0.0 && dx > 0.0 {
            transform.origin_x = self.bounds.min_lon - dx / 2.0;
            transform.pixel_width = dx;
        }
        if transform.pixel_height <= 0.0 && dy > 0.0 {
            transform.origin_y = self.bounds.max_lat + dy / 2.0;
            transform.pixel_height = dy;
        }
        transform
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.values.get(row * self.width + col).copied()
    }

    /// Statistics over the valid cells.
    pub fn statistics(&self) -> Result<FieldStatistics> {
        FieldStatistics::compute(self.values.iter().map(|&v| v as f64))
            .ok_or_else(|| GridProcessorError::empty_region("averaged field has no valid cells"))
    }
}

/// Average a Kelvin block over time and convert to Celsius.
///
/// The mean skips NaN samples per cell; the Celsius offset is applied once
/// to the averaged field. Rows run north to south and columns west to east
/// whatever the axis directions of the block.
pub fn time_mean(block: &GridBlock, bounds: &BoundingBox) -> Result<MeanField> {
    let (nt, ny, nx) = block.shape();
    if nt == 0 || ny == 0 || nx == 0 {
        return Err(GridProcessorError::empty_region(format!(
            "selection has shape ({}, {}, {})",
            nt, ny, nx
        )));
    }

    let plane = ny * nx;
    let mut sums = vec![0.0f64; plane];
    let mut counts = vec![0u32; plane];
    for t in 0..nt {
        let step = &block.values[t * plane..(t + 1) * plane];
        for (k, &v) in step.iter().enumerate() {
            if !v.is_nan() {
                sums[k] += v as f64;
                counts[k] += 1;
            }
        }
    }

    let south_first = ny > 1 && block.lats[0] < block.lats[ny - 1];
    let east_first = nx > 1 && block.lons[0] > block.lons[nx - 1];
    let mut values = Vec::with_capacity(plane);
    for row in 0..ny {
        let i = if south_first { ny - 1 - row } else { row };
        for col in 0..nx {
            let j = if east_first { nx - 1 - col } else { col };
            let k = i * nx + j;
            let v = if counts[k] == 0 {
                f32::NAN
            } else {
                kelvin_to_celsius(sums[k] / counts[k] as f64) as f32
            };
            values.push(v);
        }
    }

    if values.iter().all(|v| v.is_nan()) {
        return Err(GridProcessorError::empty_region(
            "no valid temperature values in selection",
        ));
    }

    Ok(MeanField {
        width: nx,
        height: ny,
        values,
        bounds: *bounds,
        cell_size: (axis_step(&block.lons), axis_step(&block.lats)),
    })
}

/// Spacing between the first two coordinates, 0 for a single coordinate.
fn axis_step(axis: &[f64]) -> f64 {
    match axis {
        [a, b, ..] => (b - a).abs(),
        _ => 0.0,
    }
}

/// Scalar statistics shown in the PDF report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportStatistics {
    /// Mean in degrees Celsius.
    pub mean_temp: f64,
    pub max_temp: f64,
    pub min_temp: f64,
    /// Standard deviation, computed on Kelvin (shift invariant).
    pub std_temp: f64,
    pub count: usize,
}

/// Summarise every valid value of a Kelvin block.
pub fn report_statistics(block: &GridBlock) -> Result<ReportStatistics> {
    let stats = FieldStatistics::compute(block.values.iter().map(|&v| v as f64))
        .ok_or_else(|| GridProcessorError::empty_region("no valid temperature values in selection"))?;

    Ok(ReportStatistics {
        mean_temp: kelvin_to_celsius(stats.mean),
        max_temp: kelvin_to_celsius(stats.max),
        min_temp: kelvin_to_celsius(stats.min),
        std_temp: stats.std_dev,
        count: stats.valid_count,
    })
}
