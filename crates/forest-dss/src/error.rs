use crate::config::ConfigError;
use crate::eligibility::{DataQualityError, IngestError, PipelineError, UnknownFamily};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Pipeline(PipelineError),
    Ingest(IngestError),
    UnknownFamily(UnknownFamily),
    /// A blocking evaluation task panicked or was cancelled.
    Worker(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnknownFamily(_)
            | AppError::Ingest(_)
            | AppError::Pipeline(PipelineError::DataQuality(_)) => StatusCode::BAD_REQUEST,
            AppError::Pipeline(_)
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Pipeline(err) => write!(f, "eligibility error: {}", err),
            AppError::Ingest(err) => write!(f, "input error: {}", err),
            AppError::UnknownFamily(err) => write!(f, "{}", err),
            AppError::Worker(message) => write!(f, "evaluation task failed: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Pipeline(err) => Some(err),
            AppError::Ingest(err) => Some(err),
            AppError::UnknownFamily(err) => Some(err),
            AppError::Worker(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<PipelineError> for AppError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}

impl From<DataQualityError> for AppError {
    fn from(value: DataQualityError) -> Self {
        Self::Pipeline(PipelineError::DataQuality(value))
    }
}

impl From<IngestError> for AppError {
    fn from(value: IngestError) -> Self {
        Self::Ingest(value)
    }
}

impl From<UnknownFamily> for AppError {
    fn from(value: UnknownFamily) -> Self {
        Self::UnknownFamily(value)
    }
}
