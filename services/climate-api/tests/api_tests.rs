//! Handler tests against the in-memory reference dataset.

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Bytes},
    extract::{Extension, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use climate_api::config::ServiceConfig;
use climate_api::handlers::{cache, data, export, health, index};
use climate_api::state::AppState;
use grid_processor::{DataRecord, SubsetParams};
use netcdf_store::{DatasetOpener, MemoryOpener};
use serde_json::{json, Value};
use test_utils::{bbox, central_texas_opener, single_point_dataset, time};
use tiff::decoder::Decoder;
use tiff::tags::Tag;

// ============================================================================
// Helper functions
// ============================================================================

fn state_with(opener: Arc<dyn DatasetOpener>, config: ServiceConfig) -> Arc<AppState> {
    Arc::new(AppState::with_opener(config, opener))
}

fn default_state() -> Arc<AppState> {
    state_with(central_texas_opener(), ServiceConfig::default())
}

fn strict_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.errors.strict_status_codes = true;
    config
}

fn params(
    start: &str,
    end: &str,
    (min_lat, max_lat, min_lon, max_lon): (f64, f64, f64, f64),
) -> SubsetParams {
    SubsetParams {
        start_date: Some(start.to_string()),
        end_date: Some(end.to_string()),
        min_lat: Some(min_lat.to_string()),
        max_lat: Some(max_lat.to_string()),
        min_lon: Some(min_lon.to_string()),
        max_lon: Some(max_lon.to_string()),
    }
}

fn export_body((min_lat, max_lat, min_lon, max_lon): (f64, f64, f64, f64), filename: Option<&str>) -> Bytes {
    let mut body = json!({
        "bounds": {"swLat": min_lat, "swLon": min_lon, "neLat": max_lat, "neLon": max_lon},
        "dates": {"startDate": time::QUERY_DAY, "endDate": "2024-05-31T23:00:00"},
    });
    if let Some(name) = filename {
        body["filename"] = json!(name);
    }
    Bytes::from(body.to_string())
}

async fn body_bytes(response: Response) -> Bytes {
    to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn get_data(state: &Arc<AppState>, p: SubsetParams) -> Response {
    data::data_handler(Extension(Arc::clone(state)), Query(p)).await
}

// ============================================================================
// /api/data
// ============================================================================

#[tokio::test]
async fn test_data_scenario_single_day() {
    let state = default_state();
    let response = get_data(&state, params(time::QUERY_DAY, time::QUERY_DAY, bbox::CENTRAL_TEXAS)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let records: Vec<DataRecord> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(records.len(), 81);
    for r in &records {
        assert!((30.0..=31.0).contains(&r.lat));
        assert!((-100.0..=-99.0).contains(&r.lon));
        assert!((-50.0..=60.0).contains(&r.value));
        assert_eq!(r.time, "2024-05-31T00:00:00");
    }
}

#[tokio::test]
async fn test_data_wire_types() {
    let state = default_state();
    let response = get_data(&state, params(time::QUERY_DAY, time::QUERY_DAY, bbox::SINGLE_POINT)).await;
    let value = body_json(response).await;

    let first = &value.as_array().unwrap()[0];
    assert!(first["lat"].is_number());
    assert!(first["lon"].is_number());
    assert!(first["value"].is_number());
    assert!(first["time"].is_string());
}

#[tokio::test]
async fn test_data_is_capped_and_deterministic() {
    let state = default_state();
    let p = params(time::FIRST_STEP, time::LAST_STEP, bbox::FULL_GRID);

    let first: Vec<DataRecord> =
        serde_json::from_slice(&body_bytes(get_data(&state, p.clone()).await).await).unwrap();
    let second: Vec<DataRecord> =
        serde_json::from_slice(&body_bytes(get_data(&state, p).await).await).unwrap();

    assert_eq!(first.len(), 10_000);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_data_empty_window_is_empty_array() {
    let state = default_state();
    let response = get_data(&state, params(time::QUERY_DAY, time::QUERY_DAY, bbox::OUTSIDE)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_data_missing_parameter_compat_mode() {
    let state = default_state();
    let mut p = params(time::QUERY_DAY, time::QUERY_DAY, bbox::CENTRAL_TEXAS);
    p.start_date = None;

    let response = get_data(&state, p).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("start_date"));
    assert!(body["traceback"].is_string());
}

#[tokio::test]
async fn test_data_invalid_date_strict_mode() {
    let state = state_with(central_texas_opener(), strict_config());
    let response = get_data(&state, params("not-a-date", time::QUERY_DAY, bbox::CENTRAL_TEXAS)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_data_size_limit() {
    let mut config = strict_config();
    config.limits.max_grid_cells = 100;
    let state = state_with(central_texas_opener(), config);

    let response = get_data(&state, params(time::FIRST_STEP, time::LAST_STEP, bbox::FULL_GRID)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_missing_dataset() {
    let state = state_with(Arc::new(MemoryOpener::empty()), ServiceConfig::default());
    let response = get_data(&state, params(time::QUERY_DAY, time::QUERY_DAY, bbox::CENTRAL_TEXAS)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let state = state_with(Arc::new(MemoryOpener::empty()), strict_config());
    let response = get_data(&state, params(time::QUERY_DAY, time::QUERY_DAY, bbox::CENTRAL_TEXAS)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(!state.dataset.is_open());
}

// ============================================================================
// /api/clear-cache
// ============================================================================

#[tokio::test]
async fn test_clear_cache_then_requery() {
    let opener = central_texas_opener();
    let state = state_with(opener.clone(), ServiceConfig::default());
    let p = params(time::QUERY_DAY, "2024-05-31T12:00:00", bbox::CENTRAL_TEXAS);

    let before = body_bytes(get_data(&state, p.clone()).await).await;
    let ack = cache::clear_cache_handler(Extension(Arc::clone(&state)))
        .await
        .into_response();
    assert_eq!(ack.status(), StatusCode::OK);
    assert_eq!(body_json(ack).await, json!({"message": "Cache cleared"}));
    assert!(!state.dataset.is_open());

    let after = body_bytes(get_data(&state, p).await).await;
    assert_eq!(before, after);
    assert_eq!(opener.open_count(), 2);
}

// ============================================================================
// /api/download-geotiff
// ============================================================================

#[tokio::test]
async fn test_geotiff_download() {
    let state = default_state();
    let response = export::download_geotiff_handler(
        Extension(state),
        export_body(bbox::CENTRAL_TEXAS, Some("texas")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/tiff");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"texas.tiff\""
    );

    let bytes = body_bytes(response).await;
    let mut decoder = Decoder::new(Cursor::new(bytes.to_vec())).unwrap();
    assert_eq!(decoder.dimensions().unwrap(), (9, 9));

    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).unwrap();
    assert_eq!(&tiepoint[3..5], &[-100.0, 31.0]);
    let nodata = decoder.get_tag_ascii_string(Tag::from_u16_exhaustive(42113)).unwrap();
    assert_eq!(nodata, "-9999");
    let metadata = decoder.get_tag_ascii_string(Tag::Unknown(42112)).unwrap();
    assert!(metadata.contains("texas"));
    assert!(metadata.contains("STATISTICS_MINIMUM"));
}

#[tokio::test]
async fn test_geotiff_single_point_uses_grid_spacing() {
    let state = default_state();
    let response = export::download_geotiff_handler(
        Extension(state),
        export_body(bbox::SINGLE_POINT, Some("point")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = body_bytes(response).await;
    let mut decoder = Decoder::new(Cursor::new(bytes.to_vec())).unwrap();
    assert_eq!(decoder.dimensions().unwrap(), (1, 1));

    // one 0.125° reference cell centred on (30N, 100W)
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).unwrap();
    assert_eq!(&scale[..2], &[0.125, 0.125]);
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).unwrap();
    assert_eq!(&tiepoint[3..5], &[-100.0625, 30.0625]);
}

#[tokio::test]
async fn test_geotiff_default_filename() {
    let state = default_state();
    let response =
        export::download_geotiff_handler(Extension(state), export_body(bbox::CENTRAL_TEXAS, None)).await;
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"temperature_data.tiff\""
    );
}

#[tokio::test]
async fn test_geotiff_empty_region() {
    let state = default_state();
    let response =
        export::download_geotiff_handler(Extension(state), export_body(bbox::OUTSIDE, Some("x"))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("No data in selected region"));

    let state = state_with(central_texas_opener(), strict_config());
    let response =
        export::download_geotiff_handler(Extension(state), export_body(bbox::OUTSIDE, Some("x"))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_geotiff_malformed_body() {
    let state = state_with(central_texas_opener(), strict_config());
    let response =
        export::download_geotiff_handler(Extension(state), Bytes::from_static(b"{not json")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
}

// ============================================================================
// /api/download-pdf
// ============================================================================

#[tokio::test]
async fn test_pdf_download() {
    let state = default_state();
    let response =
        export::download_pdf_handler(Extension(state), export_body(bbox::CENTRAL_TEXAS, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"temperature_report.pdf\""
    );

    let bytes = body_bytes(response).await;
    assert!(bytes.starts_with(b"%PDF-1.4"));
    assert!(bytes.ends_with(b"%%EOF\n"));
}

#[tokio::test]
async fn test_pdf_single_point() {
    let opener: Arc<dyn DatasetOpener> = Arc::new(MemoryOpener::new(single_point_dataset(300.0)));
    let state = state_with(opener, ServiceConfig::default());
    let body = json!({
        "bounds": {"swLat": 30.0, "swLon": -100.0, "neLat": 30.0, "neLon": -100.0},
        "dates": {"startDate": time::FIRST_STEP, "endDate": time::FIRST_STEP},
    });
    let response = export::download_pdf_handler(Extension(state), Bytes::from(body.to_string())).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_pdf_empty_region() {
    let state = state_with(central_texas_opener(), strict_config());
    let response =
        export::download_pdf_handler(Extension(state), export_body(bbox::BETWEEN_POINTS, None)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ============================================================================
// Front end, health and readiness
// ============================================================================

#[tokio::test]
async fn test_index_serves_template() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>map</html>").unwrap();
    let mut config = ServiceConfig::default();
    config.frontend.template_dir = dir.path().to_path_buf();
    let state = state_with(central_texas_opener(), config);

    let page = index::index_handler(Extension(state)).await;
    assert_eq!(page.0, "<html>map</html>");
}

#[tokio::test]
async fn test_index_fallback_page() {
    let mut config = ServiceConfig::default();
    config.frontend.template_dir = "/nonexistent/templates".into();
    let state = state_with(central_texas_opener(), config);

    let page = index::index_handler(Extension(state)).await;
    assert!(page.0.contains("/api/data"));
}

#[tokio::test]
async fn test_ready_reports_dataset_state() {
    let response = health::ready_handler(Extension(default_state())).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["dataset"], "open");

    let state = state_with(Arc::new(MemoryOpener::empty()), ServiceConfig::default());
    let response = health::ready_handler(Extension(state)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["ready"], false);
    assert!(body["dataset"].as_str().unwrap().starts_with("error:"));
}

#[tokio::test]
async fn test_concurrent_first_requests_open_once() {
    let opener = central_texas_opener();
    let state = state_with(opener.clone(), ServiceConfig::default());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                get_data(&state, params(time::QUERY_DAY, time::QUERY_DAY, bbox::CENTRAL_TEXAS))
                    .await
                    .status()
            })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }
    assert_eq!(opener.open_count(), 1);
}

#[test]
fn test_metrics_without_recorder() {
    let response = tokio_test::block_on(health::metrics_handler(Extension(default_state())));
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; version=0.0.4"
    );
}

#[test]
fn test_health() {
    let response = tokio_test::block_on(health::health_handler());
    assert_eq!(response.status, "ok");
}

// ============================================================================
// Production dataset (skipped when data/combined_data.nc is absent)
// ============================================================================

#[tokio::test]
async fn test_data_against_combined_dataset() {
    let path = test_utils::require_test_file!("combined_data.nc");
    let opener = Arc::new(netcdf_store::NetCdfOpener::new(path, "TMP".to_string()));
    let state = state_with(opener, ServiceConfig::default());

    let response = get_data(
        &state,
        params("2024-05-31", "2024-05-31", (29.0, 31.0, -99.0, -97.0)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let records: Vec<DataRecord> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(records.len() <= 10_000);
    for record in &records {
        assert!((29.0..=31.0).contains(&record.lat));
        assert!((-99.0..=-97.0).contains(&record.lon));
        assert!(record.time.starts_with("2024-05-31"));
    }
}
