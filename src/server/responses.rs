use crate::error::{CaptureError, LockerError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// JSON body for every failed API call
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

/// Failure returned from an API handler
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Locker(#[from] LockerError),

    #[error("no image yet")]
    NoImage,

    #[error("failed to read image: {0}")]
    ImageRead(#[source] std::io::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Capture(CaptureError::TooSoon) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Capture(CaptureError::Busy) => StatusCode::CONFLICT,
            ApiError::Capture(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Locker(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NoImage => StatusCode::NOT_FOUND,
            ApiError::ImageRead(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let stderr = match self {
            ApiError::Capture(CaptureError::Failed { stderr }) => Some(stderr.clone()),
            _ => None,
        };

        ErrorBody {
            ok: false,
            error: self.to_string(),
            stderr,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        debug!("Responding {}: {:?}", status, self);
        (status, Json(self.body())).into_response()
    }
}
