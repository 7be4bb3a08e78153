use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::governance::router::status_for;
use crate::workflows::governance::GovernanceError;
use crate::workflows::simulation::{SimulationRequestError, UsageFeedError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Application-level error shared by the service binary and the CLI.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Json(serde_json::Error),
    Feed(UsageFeedError),
    Simulation(SimulationRequestError),
    Governance(GovernanceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {err}"),
            AppError::Telemetry(err) => write!(f, "telemetry error: {err}"),
            AppError::Io(err) => write!(f, "io error: {err}"),
            AppError::Server(err) => write!(f, "server error: {err}"),
            AppError::Json(err) => write!(f, "invalid json: {err}"),
            AppError::Feed(err) => write!(f, "usage feed error: {err}"),
            AppError::Simulation(err) => write!(f, "invalid simulation request: {err}"),
            AppError::Governance(err) => write!(f, "{err}"),
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
            AppError::Json(err) => Some(err),
            AppError::Feed(err) => Some(err),
            AppError::Simulation(err) => Some(err),
            AppError::Governance(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Json(_) | AppError::Simulation(_) => StatusCode::BAD_REQUEST,
            AppError::Governance(err) => status_for(err),
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Feed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
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

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<UsageFeedError> for AppError {
    fn from(value: UsageFeedError) -> Self {
        Self::Feed(value)
    }
}

impl From<SimulationRequestError> for AppError {
    fn from(value: SimulationRequestError) -> Self {
        Self::Simulation(value)
    }
}

impl From<GovernanceError> for AppError {
    fn from(value: GovernanceError) -> Self {
        Self::Governance(value)
    }
}
