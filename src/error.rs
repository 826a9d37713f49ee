//! Typed errors and HTTP mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
    #[error("store: {0}")]
    Store(String),
}

/// Failures of the external content generator. Messages are surfaced to API callers verbatim.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("no Gemini API key: send X-Gemini-Api-Key or set GEMINI_API_KEY")]
    MissingApiKey,
    #[error("generator request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generator returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("generator returned no content")]
    EmptyResponse,
    #[error("generator returned malformed content: {0}")]
    Malformed(String),
    #[error("store: {0}")]
    Store(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Rejected(#[from] JsonRejection),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Rejected(r) => r.status(),
            AppError::Generator(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Db(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            AppError::Rejected(r) => r.body_text(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            tracing::warn!(error = %detail, "request failed");
        }
        (status, Json(ErrorBody { detail })).into_response()
    }
}
