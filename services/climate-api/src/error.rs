//! Conversion of pipeline failures into `{error, traceback}` responses.

use axum::{
    http::{header, StatusCode},
    response::Response,
};
use climate_common::ClimateError;
use serde::Serialize;

use crate::config::ErrorsConfig;

/// A request failure plus the rendered chain of its causes.
#[derive(Debug)]
pub struct ApiError {
    error: ClimateError,
    chain: Vec<String>,
}

/// Wire body of a failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl<E> From<E> for ApiError
where
    E: std::error::Error + Into<ClimateError>,
{
    fn from(err: E) -> Self {
        let mut chain = vec![err.to_string()];
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        Self {
            error: err.into(),
            chain,
        }
    }
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        ClimateError::Internal(msg.into()).into()
    }

    pub fn invalid_query(msg: impl Into<String>) -> Self {
        ClimateError::invalid_query(msg).into()
    }

    pub fn error(&self) -> &ClimateError {
        &self.error
    }

    pub fn kind(&self) -> &'static str {
        self.error.kind()
    }

    /// The error followed by its sources, one per line.
    pub fn traceback(&self) -> String {
        let mut out = String::from("Traceback (most recent error last):\n");
        for (i, entry) in self.chain.iter().enumerate() {
            if i == 0 {
                out.push_str(&format!("  {}\n", entry));
            } else {
                out.push_str(&format!("  caused by: {}\n", entry));
            }
        }
        out
    }

    /// HTTP status for this error under `config`.
    pub fn status(&self, config: &ErrorsConfig) -> StatusCode {
        if config.strict_status_codes {
            StatusCode::from_u16(self.error.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    pub fn body(&self, config: &ErrorsConfig) -> ErrorBody {
        ErrorBody {
            error: self.error.to_string(),
            traceback: config.include_traceback.then(|| self.traceback()),
        }
    }

    pub fn into_response(self, config: &ErrorsConfig) -> Response {
        let json = serde_json::to_string(&self.body(config)).unwrap_or_default();
        Response::builder()
            .status(self.status(config))
            .header(header::CONTENT_TYPE, "application/json")
            .body(json.into())
            .unwrap_or_else(|_| Response::new(self.error.to_string().into()))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}
