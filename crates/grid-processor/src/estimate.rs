//! Request size estimation and limit checks.

use std::fmt;

use climate_common::BoundingBox;
use netcdf_store::{GridAxes, GridWindow};

use crate::error::GridProcessorError;
use crate::query::{resolve_window, SubsetQuery};

/// Size limits applied before a window is read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeLimits {
    /// Maximum number of grid cells (time x lat x lon) read per request.
    pub max_grid_cells: usize,
    /// Maximum bounding box area; `None` disables the check.
    pub max_area_sq_degrees: Option<f64>,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            max_grid_cells: 50_000_000,
            max_area_sq_degrees: None,
        }
    }
}

/// Estimated size of a resolved subset window.
#[derive(Debug, Clone)]
pub struct SubsetSizeEstimate {
    pub num_time_steps: usize,
    /// Number of spatial points (lat x lon).
    pub num_points: usize,
    pub num_cells: usize,
    pub area_sq_degrees: f64,
    /// Bytes read from the store (f32 per cell).
    pub estimated_bytes: usize,
}

impl SubsetSizeEstimate {
    pub fn for_window(window: &GridWindow, bbox: &BoundingBox) -> Self {
        let (nt, ny, nx) = window.shape();
        let num_cells = nt * ny * nx;
        Self {
            num_time_steps: nt,
            num_points: ny * nx,
            num_cells,
            area_sq_degrees: bbox.area_sq_degrees(),
            estimated_bytes: num_cells * std::mem::size_of::<f32>(),
        }
    }

    /// Get estimated size in megabytes.
    pub fn estimated_mb(&self) -> f64 {
        self.estimated_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Check if this estimate exceeds the limits.
    pub fn check_limits(&self, limits: &SizeLimits) -> Result<(), LimitExceeded> {
        if let Some(max_area) = limits.max_area_sq_degrees {
            if self.area_sq_degrees > max_area {
                return Err(LimitExceeded::AreaTooLarge {
                    requested: self.area_sq_degrees,
                    limit: max_area,
                });
            }
        }

        if self.num_cells > limits.max_grid_cells {
            return Err(LimitExceeded::TooManyCells {
                requested: self.num_cells,
                limit: limits.max_grid_cells,
                estimated_mb: self.estimated_mb(),
            });
        }

        Ok(())
    }
}

/// Limit exceeded error.
#[derive(Debug, Clone)]
pub enum LimitExceeded {
    AreaTooLarge { requested: f64, limit: f64 },
    TooManyCells { requested: usize, limit: usize, estimated_mb: f64 },
}

impl fmt::Display for LimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitExceeded::AreaTooLarge { requested, limit } => write!(
                f,
                "Area too large: {:.2} square degrees requested, limit is {:.2}",
                requested, limit
            ),
            LimitExceeded::TooManyCells {
                requested,
                limit,
                estimated_mb,
            } => write!(
                f,
                "Too many grid cells: {} requested ({:.1}MB), limit is {}",
                requested, estimated_mb, limit
            ),
        }
    }
}

impl std::error::Error for LimitExceeded {}

impl From<LimitExceeded> for GridProcessorError {
    fn from(err: LimitExceeded) -> Self {
        GridProcessorError::TooLarge(err.to_string())
    }
}

/// Reject `query` if its resolved window exceeds `limits`.
///
/// Queries that select nothing always pass.
pub fn check_query_size(
    axes: &GridAxes,
    query: &SubsetQuery,
    limits: &SizeLimits,
) -> Result<(), GridProcessorError> {
    match resolve_window(axes, query) {
        Some(window) => {
            SubsetSizeEstimate::for_window(&window, &query.bbox).check_limits(limits)?;
            Ok(())
        }
        None => Ok(()),
    }
}
