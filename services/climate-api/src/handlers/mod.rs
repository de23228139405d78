//! HTTP request handlers for the climate API.

pub mod cache;
pub mod data;
pub mod export;
pub mod health;
pub mod index;

use crate::error::ApiError;

/// Run synchronous dataset work on the blocking pool.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("worker task failed: {}", e)))?
}
