use std::io::Error as IoError;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use pulse_service::EngineError;
use pulse_service::config::ConfigError;
use serde_json::json;
use thiserror::Error;

/// Startup failures
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Engine error: {0:#}")]
    Engine(#[from] anyhow::Error),
}

/// Request failures, rendered as `{ statusCode, message }`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error("Internal server error")]
    Internal(#[source] EngineError),
}

impl From<EngineError> for ApiError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::MonitorNotFound(_) => ApiError::NotFound("Monitor not found"),
            EngineError::NotCron(_) => ApiError::NotFound("Monitor is not a cron type"),
            EngineError::Validation(e) => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(source) = self {
            tracing::error!("Request failed: {source}");
        }

        HttpResponse::build(self.status_code())
            .json(json!({ "statusCode": self.status_code().as_u16(), "message": self.to_string() }))
    }
}
