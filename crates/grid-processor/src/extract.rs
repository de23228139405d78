//! Subset extraction.
//!
//! ```text
//! SubsetQuery ─► resolve_window ─► read_block ─► flatten (time, lat, lon)
//!                                                   │
//!                                       drop NaN ◄──┘
//!                                           │
//!                           K → °C, round value 2dp, lat/lon 3dp
//! ```

use climate_common::{kelvin_to_celsius, round_to};
use netcdf_store::{GridBlock, GriddedDataset};
use tracing::debug;

use crate::error::{GridProcessorError, Result};
use crate::query::{resolve_window, SubsetQuery};
use crate::types::{SubsetRow, SubsetTable};

/// Decimal places kept for temperature values.
pub const VALUE_DECIMALS: u32 = 2;
/// Decimal places kept for coordinates.
pub const COORD_DECIMALS: u32 = 3;

/// Read the raw Kelvin block selected by `query`.
///
/// Returns `Ok(None)` when the window holds no grid points.
pub fn extract_block(ds: &dyn GriddedDataset, query: &SubsetQuery) -> Result<Option<GridBlock>> {
    let Some(window) = resolve_window(ds.axes(), query) else {
        debug!(
            start = %query.start,
            end = %query.end,
            bbox = ?query.bbox,
            "Query window selects no grid points"
        );
        return Ok(None);
    };

    debug!(shape = ?window.shape(), level = ?window.height, "Selected data shape");

    let block = ds
        .read_block(&window)
        .map_err(GridProcessorError::ReadFailed)?;
    Ok(Some(block))
}

/// Extract a Celsius point table for `query`.
///
/// An empty window yields an empty table, not an error.
pub fn extract(ds: &dyn GriddedDataset, query: &SubsetQuery) -> Result<SubsetTable> {
    let Some(block) = extract_block(ds, query)? else {
        return Ok(SubsetTable::empty());
    };
    let table = flatten(&block);
    Ok(table)
}

fn flatten(block: &GridBlock) -> SubsetTable {
    let (nt, ny, nx) = block.shape();
    let mut rows = Vec::with_capacity(block.values.len());

    for t in 0..nt {
        for i in 0..ny {
            for j in 0..nx {
                let value = block.values[(t * ny + i) * nx + j];
                if value.is_nan() {
                    continue;
                }
                rows.push(SubsetRow {
                    lat: round_to(block.lats[i], COORD_DECIMALS),
                    lon: round_to(block.lons[j], COORD_DECIMALS),
                    time: block.times[t],
                    value: round_to(kelvin_to_celsius(value as f64), VALUE_DECIMALS),
                });
            }
        }
    }

    debug!(
        initial = block.values.len(),
        after_dropna = rows.len(),
        "Flattened subset"
    );

    SubsetTable::new(rows)
}
