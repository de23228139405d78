//! GeoTIFF and PDF report downloads.

use std::sync::Arc;

use axum::{extract::Extension, response::Response};
use bytes::Bytes;
use chrono::Utc;
use grid_processor::{
    check_query_size, extract_block, report_statistics, time_mean, GridProcessorError,
    SubsetQuery,
};
use netcdf_store::{GridBlock, GriddedDataset};
use renderer::{
    render_report, write_geotiff, GeoRaster, RasterStatistics, RasterTags, ReportContent,
    ReportFigures,
};
use tracing::{info, instrument};

use super::run_blocking;
use crate::download::{attachment_response, bytes_attachment, export_tempfile};
use crate::error::ApiError;
use crate::metrics::{self, RequestTimer};
use crate::schema::{parse_body, RasterExportRequest, ReportRequest, REPORT_FILENAME};
use crate::state::AppState;

/// POST /api/download-geotiff
///
/// Time-averaged Celsius field of the window as a single-band GeoTIFF.
#[instrument(skip(state, body))]
pub async fn download_geotiff_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Response {
    let timer = RequestTimer::start("geotiff");
    let result = export_geotiff(Arc::clone(&state), body).await;
    timer.finish();

    result.unwrap_or_else(|err| state.error_response("geotiff", err))
}

/// POST /api/download-pdf
///
/// Single-page statistics report for the window.
#[instrument(skip(state, body))]
pub async fn download_pdf_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Response {
    let timer = RequestTimer::start("pdf");
    let result = export_report(Arc::clone(&state), body).await;
    timer.finish();

    result.unwrap_or_else(|err| state.error_response("pdf", err))
}

async fn export_geotiff(state: Arc<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request: RasterExportRequest = parse_body(&body)?;
    let query = request.query()?;
    let name = request.export_name();
    info!(filename = %name, bounds = ?query.bbox, start = %query.start, end = %query.end, "GeoTIFF request");

    let document_name = name.clone();
    let path = run_blocking(move || {
        let (ds, block) = read_window(&state, &query)?;
        let field = time_mean(&block, &query.bbox)?.with_grid_resolution(ds.axes());
        let stats = field.statistics()?;
        let transform = field.geo_transform();
        info!(
            width = field.width,
            height = field.height,
            valid = stats.valid_count,
            "Averaged field"
        );

        let raster = GeoRaster {
            width: field.width,
            height: field.height,
            values: &field.values,
            origin_x: transform.origin_x,
            origin_y: transform.origin_y,
            pixel_width: transform.pixel_width,
            pixel_height: transform.pixel_height,
            tags: RasterTags::new(
                document_name,
                Utc::now().naive_utc(),
                RasterStatistics {
                    min: stats.min,
                    max: stats.max,
                    mean: stats.mean,
                    std_dev: stats.std_dev,
                },
            ),
        };

        let mut file = export_tempfile(".tiff")?;
        write_geotiff(file.as_file_mut(), &raster)?;
        Ok(file.into_temp_path())
    })
    .await?;

    attachment_response(path, "image/tiff", &format!("{}.tiff", name)).await
}

async fn export_report(state: Arc<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request: ReportRequest = parse_body(&body)?;
    let query = request.query()?;
    info!(bounds = ?query.bbox, start = %query.start, end = %query.end, "PDF report request");

    let pdf = run_blocking(move || {
        let (_, block) = read_window(&state, &query)?;
        let stats = report_statistics(&block)?;
        info!(count = stats.count, mean = stats.mean_temp, "Report statistics");

        let content = ReportContent {
            start_date: request.dates.start_date,
            end_date: request.dates.end_date,
            bounds: query.bbox,
            figures: ReportFigures {
                mean: stats.mean_temp,
                max: stats.max_temp,
                min: stats.min_temp,
                std_dev: stats.std_temp,
            },
            generated_at: Utc::now().naive_utc(),
        };
        Ok(render_report(&content)?)
    })
    .await?;

    bytes_attachment(pdf, "application/pdf", REPORT_FILENAME)
}

/// Open the dataset, check limits and read the raw Kelvin block.
fn read_window(
    state: &AppState,
    query: &SubsetQuery,
) -> Result<(Arc<dyn GriddedDataset>, GridBlock), ApiError> {
    let ds = state.dataset.get_dataset()?;
    metrics::record_dataset_opens(state.dataset.open_count());
    check_query_size(ds.axes(), query, &state.config.limits.size_limits())?;

    let block = extract_block(ds.as_ref(), query)?
        .ok_or_else(|| GridProcessorError::empty_region("selection contains no grid points"))?;
    Ok((ds, block))
}
