/// # Simulator Errors
/// This module defines the `SimulatorError` enum, which covers everything that can go wrong while the simulator
/// is starting up or being driven. Failed transmissions are not errors: they are reported as outcomes and the loop keeps going.


use thiserror::Error;
use std::io;
use tokio::task::JoinError;

#[derive(Error, Debug)]
pub enum SimulatorError {
    /// Represents errors arising from misconfigurations or invalid settings.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Represents errors during the initialization of the logging system.
    #[error("Logging initialization error: {0}")]
    LoggingError(String),

    /// Represents errors while building the HTTP client used for transmissions.
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    /// Raised when a start is requested on a simulator that is already running.
    #[error("Simulation already running")]
    AlreadyRunning,

    /// Represents errors when waiting for the background simulation task to complete.
    #[error("Task join error: {0}")]
    TaskJoinError(String),
}

impl From<config::ConfigError> for SimulatorError {
    fn from(err: config::ConfigError) -> Self {
        SimulatorError::ConfigError(err.to_string())
    }
}

impl From<url::ParseError> for SimulatorError {
    fn from(err: url::ParseError) -> Self {
        SimulatorError::ConfigError(format!("invalid api_url: {}", err))
    }
}

impl From<JoinError> for SimulatorError {
    fn from(err: JoinError) -> Self {
        SimulatorError::TaskJoinError(err.to_string())
    }
}

pub type SimulatorResult<T> = Result<T, SimulatorError>;
