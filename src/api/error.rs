use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::sheets::SheetError;

use super::models::StatusResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Configuration(String),
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("No keyword found. Please provide a keyword or add one to cell D1 in the spreadsheet.")]
    NoKeyword,
    #[error("No URLs found in column A of the spreadsheet.")]
    NoUrls,
    #[error("{0}")]
    Sheet(SheetError),
    #[error("{0:#}")]
    Unexpected(#[from] anyhow::Error),
}

impl From<SheetError> for ApiError {
    fn from(e: SheetError) -> Self {
        match e {
            SheetError::MissingCredentials(_) => ApiError::Configuration(e.to_string()),
            other => ApiError::Sheet(other),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Configuration(_)
            | ApiError::InvalidBody(_)
            | ApiError::NoKeyword
            | ApiError::NoUrls => StatusCode::BAD_REQUEST,
            ApiError::Sheet(_) | ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "keyword search failed");
            format!("An error occurred: {self}")
        } else {
            self.to_string()
        };
        (status, Json(StatusResponse::error(message))).into_response()
    }
}
