//! Error types for grid processing.

use climate_common::ClimateError;
use netcdf_store::StoreError;
use thiserror::Error;

/// Errors that can occur while subsetting and aggregating grids.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// Query parameter missing or unparsable.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The window holds no usable grid points.
    #[error("empty region: {0}")]
    EmptyRegion(String),

    /// The window exceeds a configured size limit.
    #[error("request too large: {0}")]
    TooLarge(String),

    /// Failed to open the dataset.
    #[error("failed to open dataset")]
    OpenFailed(#[source] StoreError),

    /// Failed to read data from the dataset.
    #[error("failed to read grid data")]
    ReadFailed(#[source] StoreError),
}

impl GridProcessorError {
    /// Create an InvalidQuery error.
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Create an EmptyRegion error.
    pub fn empty_region(msg: impl Into<String>) -> Self {
        Self::EmptyRegion(msg.into())
    }
}

impl From<climate_common::time::TimeParseError> for GridProcessorError {
    fn from(err: climate_common::time::TimeParseError) -> Self {
        Self::InvalidQuery(err.to_string())
    }
}

impl From<GridProcessorError> for ClimateError {
    fn from(err: GridProcessorError) -> Self {
        match err {
            GridProcessorError::InvalidQuery(msg) => ClimateError::InvalidQuery(msg),
            GridProcessorError::EmptyRegion(msg) => ClimateError::EmptyRegion(msg),
            GridProcessorError::TooLarge(msg) => ClimateError::RequestTooLarge(msg),
            GridProcessorError::OpenFailed(e) | GridProcessorError::ReadFailed(e) => e.into(),
        }
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
