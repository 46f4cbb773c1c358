use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::fires::{PipelineError, QueryError};

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::MissingCredential => {
                tracing::error!("rejecting fire query: FIRMS_MAP_KEY is not configured");
                Self::internal(err.to_string())
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
