use std::io::Error as IoError;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::config;
use crate::trigger::TriggerError;

/// Failures during startup, before the server accepts traffic.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("configuration error: {0:?}")]
    Config(config::Error),
    #[error("database error: {0}")]
    Database(#[from] libsql::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool::managed::PoolError<libsql::Error>),
    #[error("connection pool build error: {0}")]
    PoolBuild(#[from] deadpool::managed::BuildError),
    #[error("checker client error: {0}")]
    Checker(#[from] reqwest::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<config::Error> for AppError {
    fn from(err: config::Error) -> Self {
        Self::Config(err)
    }
}

/// Request-level errors with stable client-facing status codes and
/// messages. Internal detail never leaves the process; it is logged when
/// the response is rendered.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Upgrade for more checks")]
    QuotaExceeded,
    #[error("Not Found")]
    NotFound,
    #[error("Something went wrong")]
    Internal(String),
}

impl From<TriggerError> for ApiError {
    fn from(err: TriggerError) -> Self {
        match err {
            TriggerError::QuotaExceeded => Self::QuotaExceeded,
            TriggerError::MonitorNotFound => Self::NotFound,
            TriggerError::SchemaInvalid(detail) => Self::Internal(detail),
            TriggerError::RunNotRecorded => Self::Internal("run insert did not produce a row".to_string()),
            TriggerError::Database(err) => Self::Internal(format!("{err:#}")),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::QuotaExceeded => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(detail) = self {
            tracing::error!(detail = %detail, "request failed on an internal error");
        }

        let status = self.status_code();
        HttpResponse::build(status)
            .json(json!({ "code": status.as_u16(), "message": self.to_string() }))
    }
}
