//! Error types for filter composition and the HTTP surface

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::web::ErrorResponse;

/// Errors raised while parsing or applying request filters.
///
/// Every variant is a client-input error; none of them is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("invalid value '{value}' for parameter '{param}': {reason}")]
    Parse {
        param: String,
        value: String,
        reason: String,
    },

    #[error("invalid sort column selected: {0}")]
    InvalidSortColumn(String),

    #[error("cannot apply filter '{filter}': {reason}")]
    Composition { filter: String, reason: String },
}

impl FilterError {
    pub fn parse(param: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            param: param.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors returned by API handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Filter(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(e) => error!(error = %e, "Request failed"),
            other => warn!(status = status.as_u16(), error = %other, "Request rejected"),
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
