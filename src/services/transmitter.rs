use std::fmt;
use std::time::Duration;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::info;

use crate::config::SimulatorSettings;
use crate::errors::SimulatorResult;
use crate::models::Reading;

/// What happened to a single reading after it was handed to a sink.
///
/// Failures are values, not errors: the loop logs them and carries on with the next sensor.
#[derive(Debug, Clone, PartialEq)]
pub enum TransmitOutcome {
    /// The endpoint answered 200
    Delivered {
        sensor_id: String,
        humidity: f64,
        temperature: f64,
    },
    /// The endpoint answered with any other status
    Rejected {
        sensor_id: String,
        status: u16,
    },
    /// The request never completed (timeout, refused connection, DNS, ...)
    Failed {
        sensor_id: String,
        error: String,
    },
}

impl TransmitOutcome {
    pub fn sensor_id(&self) -> &str {
        match self {
            TransmitOutcome::Delivered { sensor_id, .. }
            | TransmitOutcome::Rejected { sensor_id, .. }
            | TransmitOutcome::Failed { sensor_id, .. } => sensor_id,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, TransmitOutcome::Delivered { .. })
    }
}

impl fmt::Display for TransmitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransmitOutcome::Delivered { sensor_id, humidity, temperature } => {
                write!(f, "✓ {}: {:.1}%H, {:.1}°C", sensor_id, humidity, temperature)
            }
            TransmitOutcome::Rejected { sensor_id, status } => {
                write!(f, "✗ {}: HTTP error {}", sensor_id, status)
            }
            TransmitOutcome::Failed { sensor_id, error } => {
                write!(f, "✗ {}: {}", sensor_id, error)
            }
        }
    }
}

/// Destination for generated readings
#[async_trait]
pub trait ReadingSink: Send + Sync {
    /// Delivers one reading. Never fails; every problem is folded into the returned outcome.
    async fn send(&self, reading: &Reading) -> TransmitOutcome;
}

/// Posts readings as JSON to the ingestion API
pub struct HttpTransmitter {
    client: Client,
    api_url: String,
}

impl HttpTransmitter {
    /// Creates a transmitter for `api_url` whose requests give up after `timeout`
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> SimulatorResult<Self> {
        let api_url = api_url.into();
        info!("Initializing HTTP transmitter for {}", api_url);
        let client = Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client, api_url })
    }

    pub fn from_settings(settings: &SimulatorSettings) -> SimulatorResult<Self> {
        Self::new(settings.api_url.clone(), settings.request_timeout())
    }
}

#[async_trait]
impl ReadingSink for HttpTransmitter {
    async fn send(&self, reading: &Reading) -> TransmitOutcome {
        let sensor_id = reading.sensor_id.clone();
        let response = self.client.post(&self.api_url)
            .header(CONTENT_TYPE, "application/json")
            .json(reading)
            .send()
            .await;

        match response {
            Ok(response) if response.status() == StatusCode::OK => TransmitOutcome::Delivered {
                sensor_id,
                humidity: reading.humidity,
                temperature: reading.temperature,
            },
            Ok(response) => TransmitOutcome::Rejected {
                sensor_id,
                status: response.status().as_u16(),
            },
            Err(e) => TransmitOutcome::Failed {
                sensor_id,
                error: describe_transport_error(&e),
            },
        }
    }
}

/// Flattens a reqwest error and its sources into one line
fn describe_transport_error(err: &reqwest::Error) -> String {
    let kind = if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connection error"
    } else {
        "request error"
    };

    let mut message = format!("{}: {}", kind, err);
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}
