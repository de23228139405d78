//! Application state for the climate API.

use std::sync::Arc;

use axum::response::Response;
use grid_processor::DatasetCache;
use metrics_exporter_prometheus::PrometheusHandle;
use netcdf_store::{DatasetOpener, NetCdfOpener};
use tracing::{error, warn};

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::metrics;

/// Shared application state.
pub struct AppState {
    pub config: ServiceConfig,

    /// Process-wide handle to the backing dataset.
    pub dataset: DatasetCache,

    prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// State backed by the NetCDF file named in `config`.
    pub fn new(config: ServiceConfig) -> Self {
        let opener = Arc::new(NetCdfOpener::new(
            config.dataset.path.clone(),
            config.dataset.variable.clone(),
        ));
        Self::with_opener(config, opener)
    }

    pub fn with_opener(config: ServiceConfig, opener: Arc<dyn DatasetOpener>) -> Self {
        Self {
            config,
            dataset: DatasetCache::new(opener),
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Prometheus text exposition, if a recorder is installed.
    pub fn render_metrics(&self) -> Option<String> {
        self.prometheus.as_ref().map(|handle| handle.render())
    }

    /// Log and count `err`, then render it per the error settings.
    pub fn error_response(&self, endpoint: &'static str, err: ApiError) -> Response {
        metrics::record_error(endpoint, err.kind());
        let status = err.status(&self.config.errors);
        if status.is_server_error() {
            error!(endpoint, kind = err.kind(), error = %err, "Request failed");
        } else {
            warn!(endpoint, kind = err.kind(), error = %err, "Request rejected");
        }
        err.into_response(&self.config.errors)
    }
}
