//! Export encoders for temperature subsets.
//!
//! - [`geotiff`]: single-band float GeoTIFF with GDAL metadata
//! - [`pdf`]: minimal PDF 1.4 writer (base-14 Helvetica, Flate content)
//! - [`report`]: the fixed single-page statistics report built on [`pdf`]

pub mod error;
pub mod geotiff;
pub mod pdf;
pub mod report;

pub use error::{RenderError, RenderResult};
pub use geotiff::{encode_geotiff, write_geotiff, GeoRaster, RasterStatistics, RasterTags, NODATA};
pub use report::{render_report, ReportContent, ReportFigures};
