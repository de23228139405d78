//! Bounded spatial/temporal subsetting of gridded temperature data.
//!
//! This crate turns a bounding-box and date-range query into a slice of the
//! backing dataset and feeds that slice to one of three consumers:
//!
//! - **Point table**: flattened Celsius rows, downsampled to a fixed cap and
//!   rendered as JSON records for the map.
//! - **Time mean**: a north-up 2-D average with a geotransform, for raster
//!   export.
//! - **Report statistics**: mean/min/max/std over the window.
//!
//! # Architecture
//!
//! ```text
//! HTTP request
//!      │
//!      ▼
//! DatasetCache::get_dataset()  (open once, shared Arc)
//!      │
//!      ▼
//! resolve_window(axes, query)  ──► SubsetSizeEstimate::check_limits
//!      │
//!      ▼
//! GriddedDataset::read_block
//!      │
//!      ├─► extract ─► limit ─► to_records      (/api/data)
//!      ├─► time_mean ─► MeanField              (/api/download-geotiff)
//!      └─► report_statistics                   (/api/download-pdf)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{extract, limit, to_records, DatasetCache, SubsetParams};
//!
//! let cache = DatasetCache::new(opener);
//! let ds = cache.get_dataset()?;
//! let query = params.parse()?;
//! let table = limit(extract(ds.as_ref(), &query)?, 10_000, 42);
//! let records = to_records(&table);
//! ```

pub mod aggregate;
pub mod cache;
pub mod error;
pub mod estimate;
pub mod extract;
pub mod limit;
pub mod query;
pub mod records;
pub mod types;

// Re-export commonly used types at crate root
pub use aggregate::{
    report_statistics, time_mean, FieldStatistics, GeoTransform, MeanField, ReportStatistics,
};
pub use cache::DatasetCache;
pub use error::{GridProcessorError, Result};
pub use estimate::{check_query_size, LimitExceeded, SizeLimits, SubsetSizeEstimate};
pub use extract::{extract, extract_block};
pub use limit::{limit, DEFAULT_MAX_POINTS, DEFAULT_SAMPLE_SEED};
pub use query::{resolve_window, SubsetParams, SubsetQuery, SURFACE_HEIGHT};
pub use records::to_records;
pub use types::{DataRecord, SubsetRow, SubsetTable};
