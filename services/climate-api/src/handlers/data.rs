//! Point data for the interactive map.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::{IntoResponse, Response},
    Json,
};
use grid_processor::{check_query_size, extract, limit, to_records, DataRecord, SubsetParams};
use tracing::{info, instrument};

use super::run_blocking;
use crate::error::ApiError;
use crate::metrics::{self, RequestTimer};
use crate::state::AppState;

const ENDPOINT: &str = "data";

/// GET /api/data
///
/// Returns at most `limits.max_points` `{lat, lon, value, time}` records
/// for the window, sampled reproducibly when the window holds more.
#[instrument(skip(state))]
pub async fn data_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SubsetParams>,
) -> Response {
    let timer = RequestTimer::start(ENDPOINT);
    let result = fetch_records(Arc::clone(&state), params).await;
    timer.finish();

    match result {
        Ok(records) => Json(records).into_response(),
        Err(err) => state.error_response(ENDPOINT, err),
    }
}

async fn fetch_records(
    state: Arc<AppState>,
    params: SubsetParams,
) -> Result<Vec<DataRecord>, ApiError> {
    let query = params.parse()?;
    info!(
        start = %query.start,
        end = %query.end,
        min_lat = query.bbox.min_lat,
        max_lat = query.bbox.max_lat,
        min_lon = query.bbox.min_lon,
        max_lon = query.bbox.max_lon,
        "Data request"
    );

    let records = run_blocking(move || {
        let ds = state.dataset.get_dataset()?;
        metrics::record_dataset_opens(state.dataset.open_count());

        let limits = &state.config.limits;
        check_query_size(ds.axes(), &query, &limits.size_limits())?;

        let table = extract(ds.as_ref(), &query)?;
        let total = table.len();
        let sampled = limit(table, limits.max_points, limits.sample_seed);
        info!(total, returned = sampled.len(), "Subset extracted");

        Ok(to_records(&sampled))
    })
    .await?;

    metrics::record_points(records.len());
    Ok(records)
}
