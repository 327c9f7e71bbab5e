// src/utils/errors.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::utils::types::ApiResponse;

/// Why a raw candle could not be normalized.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandleError {
    #[error("missing or null `{0}`")]
    MissingField(&'static str),
    #[error("`{field}` is not a number: {raw:?}")]
    BadNumber { field: &'static str, raw: String },
    #[error("`{0}` is not finite")]
    NotFinite(&'static str),
    #[error("unparsable timestamp {0:?}")]
    BadTimestamp(String),
}

/// Errors surfaced by the HTTP layer. The engine itself never fails.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("candle #{index}: {source}")]
    Candle {
        index: usize,
        #[source]
        source: CandleError,
    },
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Candle { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::err(self.to_string()))
    }
}
