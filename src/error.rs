use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Upstream returned {status} for {symbol}")]
    Status { symbol: String, status: u16 },

    #[error("Upstream error {code}: {description}")]
    Upstream { code: String, description: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No data for {0}")]
    NoData(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Every ticker was skipped; the message is returned to the client as-is.
    #[error("{0}")]
    NoResults(&'static str),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NoResults(_) => StatusCode::BAD_REQUEST,
        };
        tracing::warn!(status = %status, error = %self, "Returning error response");
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
