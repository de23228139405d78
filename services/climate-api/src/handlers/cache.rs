//! Dataset cache invalidation.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use tracing::{info, instrument};

use crate::metrics::RequestTimer;
use crate::schema::MessageResponse;
use crate::state::AppState;

/// POST /api/clear-cache
///
/// Drops the cached dataset handle; the next request reopens the file.
#[instrument(skip(state))]
pub async fn clear_cache_handler(Extension(state): Extension<Arc<AppState>>) -> Json<MessageResponse> {
    let timer = RequestTimer::start("clear_cache");
    let was_open = state.dataset.clear_cache();
    info!(was_open, "Dataset cache cleared");
    timer.finish();

    Json(MessageResponse {
        message: "Cache cleared".to_string(),
    })
}
