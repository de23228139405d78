//! Error types for dataset store operations.

use climate_common::ClimateError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error types for opening and reading gridded datasets.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing file does not exist
    #[error("Dataset not found: {0}")]
    NotFound(String),

    /// File exists but could not be opened as NetCDF
    #[error("Failed to open dataset: {0}")]
    Open(String),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Window does not fit the dataset axes
    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    /// Read failed on an open dataset
    #[error("Read failed: {0}")]
    Read(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<StoreError> for ClimateError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_)
            | StoreError::Open(_)
            | StoreError::MissingData(_)
            | StoreError::InvalidFormat(_) => ClimateError::StoreUnavailable(err.to_string()),
            StoreError::InvalidWindow(_) => ClimateError::Internal(err.to_string()),
            StoreError::Read(_) | StoreError::IoError(_) => ClimateError::DataRead(err.to_string()),
        }
    }
}
