//! Error taxonomy shared by the climate services.

use thiserror::Error;

/// Result type alias using ClimateError.
pub type ClimateResult<T> = Result<T, ClimateError>;

/// Primary error type surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ClimateError {
    // === Request Errors ===
    /// Missing or unparsable query parameters or request body.
    #[error("{0}")]
    InvalidQuery(String),

    /// Window exceeds the configured size limits.
    #[error("Request too large: {0}")]
    RequestTooLarge(String),

    // === Data Errors ===
    /// Export window contains no grid points.
    #[error("No data in selected region: {0}")]
    EmptyRegion(String),

    /// Backing dataset missing or unreadable at open time.
    #[error("Dataset unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Failed to read data: {0}")]
    DataRead(String),

    // === Output Errors ===
    #[error("Export failed: {0}")]
    Export(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ClimateError {
    /// Create an InvalidQuery error.
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Create an EmptyRegion error.
    pub fn empty_region(msg: impl Into<String>) -> Self {
        Self::EmptyRegion(msg.into())
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ClimateError::InvalidQuery(_) => "InvalidQuery",
            ClimateError::RequestTooLarge(_) => "RequestTooLarge",
            ClimateError::EmptyRegion(_) => "EmptyRegion",
            ClimateError::StoreUnavailable(_) => "StoreUnavailable",
            ClimateError::DataRead(_) => "DataRead",
            ClimateError::Export(_) => "Export",
            ClimateError::Internal(_) => "Internal",
        }
    }

    /// HTTP status code for hardened deployments.
    ///
    /// Compatibility mode ignores this and answers 500 for everything.
    pub fn http_status_code(&self) -> u16 {
        match self {
            ClimateError::InvalidQuery(_) => 400,
            ClimateError::RequestTooLarge(_) => 413,
            ClimateError::EmptyRegion(_) => 422,
            ClimateError::StoreUnavailable(_) => 503,
            _ => 500,
        }
    }
}

impl From<std::io::Error> for ClimateError {
    fn from(err: std::io::Error) -> Self {
        ClimateError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ClimateError {
    fn from(err: serde_json::Error) -> Self {
        ClimateError::InvalidQuery(format!("Invalid JSON body: {}", err))
    }
}

impl From<crate::time::TimeParseError> for ClimateError {
    fn from(err: crate::time::TimeParseError) -> Self {
        ClimateError::InvalidQuery(err.to_string())
    }
}
