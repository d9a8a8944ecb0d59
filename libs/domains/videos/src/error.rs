use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Message returned for related-video requests that cannot be answered.
pub const RELATED_UNAVAILABLE_MESSAGE: &str = "Video not found or missing embedding";

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Video not found: {0}")]
    NotFound(Uuid),

    /// The source video is absent or carries no embedding; callers cannot tell which.
    #[error("Video not found or missing embedding: {0}")]
    RelatedUnavailable(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Catalog store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type VideoResult<T> = Result<T, VideoError>;

impl From<reqwest::Error> for VideoError {
    fn from(err: reqwest::Error) -> Self {
        VideoError::Store(format!("Data API request failed: {}", err))
    }
}

impl From<database::cassandra::CassandraError> for VideoError {
    fn from(err: database::cassandra::CassandraError) -> Self {
        VideoError::Store(err.to_string())
    }
}

impl From<core_config::ConfigError> for VideoError {
    fn from(err: core_config::ConfigError) -> Self {
        VideoError::Config(err.to_string())
    }
}

/// Convert VideoError to AppError for standardized HTTP error responses
impl From<VideoError> for AppError {
    fn from(err: VideoError) -> Self {
        match err {
            VideoError::NotFound(_) => AppError::NotFound("Video not found".to_string()),
            VideoError::RelatedUnavailable(_) => {
                AppError::NotFound(RELATED_UNAVAILABLE_MESSAGE.to_string())
            }
            VideoError::Validation(msg) => AppError::BadRequest(msg),
            VideoError::Store(msg) => AppError::Store(msg),
            VideoError::Config(msg) => AppError::StoreConfig(msg),
            VideoError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for VideoError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
