use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use coincast_core::{ConfigError, ErrorBody, ForecastError, ForecastErrorKind};
use thiserror::Error;

/// Startup failures of the web binary.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("COINCAST_ADDR must be a socket address like 127.0.0.1:8000, got '{value}'")]
    InvalidAddr { value: String },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// Handler error: a [`ForecastError`] rendered as `{"error": {...}}`.
#[derive(Debug)]
pub struct ApiError(pub ForecastError);

impl From<ForecastError> for ApiError {
    fn from(error: ForecastError) -> Self {
        Self(error)
    }
}

pub const fn status_for(kind: ForecastErrorKind) -> StatusCode {
    match kind {
        ForecastErrorKind::InvalidRequest
        | ForecastErrorKind::InvalidDateFormat
        | ForecastErrorKind::HorizonOutOfRange => StatusCode::BAD_REQUEST,
        ForecastErrorKind::SymbolNotFound => StatusCode::NOT_FOUND,
        ForecastErrorKind::InsufficientHistory => StatusCode::UNPROCESSABLE_ENTITY,
        ForecastErrorKind::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
        ForecastErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.kind());
        (status, Json(ErrorBody::from(&self.0))).into_response()
    }
}
