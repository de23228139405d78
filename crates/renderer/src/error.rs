//! Error types for export encoding.

use climate_common::ClimateError;
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("TIFF encoding failed: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster: {0}")]
    InvalidRaster(String),
}

impl From<RenderError> for ClimateError {
    fn from(err: RenderError) -> Self {
        ClimateError::Export(err.to_string())
    }
}
