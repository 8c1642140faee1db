use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::verification::{ApiError, DeskError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Api(ApiError),
    Workflow(DeskError),
    /// No usable landlord token; the operator has to log in again.
    LoginRequired,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Api(err) => write!(f, "api error: {}", err),
            AppError::Workflow(err) => write!(f, "workflow error: {}", err),
            AppError::LoginRequired => write!(
                f,
                "login required: set APP_TOKEN or APP_TOKEN_PATH to a landlord token"
            ),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Api(err) => Some(err),
            AppError::Workflow(err) => Some(err),
            AppError::LoginRequired => None,
        }
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

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::Unauthenticated => Self::LoginRequired,
            other => Self::Api(other),
        }
    }
}

impl From<DeskError> for AppError {
    fn from(value: DeskError) -> Self {
        match value {
            DeskError::Api(ApiError::Unauthenticated) => Self::LoginRequired,
            other => Self::Workflow(other),
        }
    }
}
