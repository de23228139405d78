//! Streaming file attachments backed by temporary files.
//!
//! The response body owns the [`TempPath`]; the file is removed when the
//! body has been fully sent or when it is dropped early (client went away,
//! socket write failed). Errors before the response is built drop the
//! path on the spot.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use bytes::Bytes;
use futures::stream::{self, Stream};
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::ApiError;

const CHUNK_SIZE: usize = 64 * 1024;

/// Create an empty temp file for an export with the given extension.
pub fn export_tempfile(suffix: &str) -> Result<tempfile::NamedTempFile, ApiError> {
    Ok(tempfile::Builder::new()
        .prefix("climate-export-")
        .suffix(suffix)
        .tempfile()?)
}

/// Build an attachment response streaming `path`, deleting it afterwards.
pub async fn attachment_response(
    path: TempPath,
    content_type: &str,
    filename: &str,
) -> Result<Response, ApiError> {
    let file = File::open(&path).await?;
    let len = file.metadata().await?.len();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .header(header::CONTENT_LENGTH, len)
        .body(Body::from_stream(temp_file_stream(file, path)))
        .map_err(|e| ApiError::internal(format!("failed to build response: {}", e)))
}

/// In-memory attachment response.
pub fn bytes_attachment(data: Vec<u8>, content_type: &str, filename: &str) -> Result<Response, ApiError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .header(header::CONTENT_LENGTH, data.len())
        .body(Body::from(data))
        .map_err(|e| ApiError::internal(format!("failed to build response: {}", e)))
}

/// Chunked reader over `file` that keeps `path` alive until it ends.
fn temp_file_stream(
    file: File,
    path: TempPath,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    stream::try_unfold((file, path), |(mut file, path)| async move {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let n = file.read(&mut buf).await?;
        if n == 0 {
            tracing::debug!(path = %path.display(), "Download finished, removing temp file");
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some((Bytes::from(buf), (file, path))))
    })
}
