//! # Sensor Reading

//! The `Reading` struct is the JSON document posted to the ingestion API. Field names are part of the
//! wire contract and must not be renamed.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use super::isensor::{Location, Sensor};

/// One synthetic measurement for a single sensor. Created per tick, sent once, then dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    pub sensor_id: String,
    /// Relative humidity, percent in [0, 100]
    pub humidity: f64,
    /// Air temperature, degrees Celsius in [0, 50]
    pub temperature: f64,
    /// Soil pH with at most two decimals
    pub soil_ph: f64,
    pub location: Location,
    /// Battery charge, percent
    pub battery_level: u8,
    /// Radio signal strength, percent
    pub signal_strength: u8,
    /// Local time of generation, ISO-8601 without offset
    pub timestamp: NaiveDateTime,
    pub metadata: ReadingMetadata,
}

/// Static sensor description carried along with every reading
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadingMetadata {
    pub crop_type: String,
    pub soil_type: String,
    pub sensor_name: String,
}

impl From<&Sensor> for ReadingMetadata {
    fn from(sensor: &Sensor) -> Self {
        Self {
            crop_type: sensor.crop_type.clone(),
            soil_type: sensor.soil_type.clone(),
            sensor_name: sensor.name.clone(),
        }
    }
}
