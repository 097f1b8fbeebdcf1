//! # Virtual Sensor Representation

//! This module defines the `Sensor` struct describing one virtual field sensor, its `Location`, and the
//! `CropType` enum that selects which climate profile the generator uses for it.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Geographic position of a sensor, serialized as `{ "lat", "lng", "name" }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    /// Human readable place name
    pub name: String,
}

/// Static description of a virtual sensor. Built once at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sensor {
    /// Unique identifier reported as `sensor_id`
    pub id: String,
    /// Display name reported as `metadata.sensor_name`
    pub name: String,
    pub location: Location,
    /// Crop label as configured; sent verbatim in the reading metadata
    pub crop_type: String,
    /// Free-form soil label
    pub soil_type: String,
}

/// Crops the generator has a dedicated climate profile for
#[derive(Debug, Clone, Copy, Display, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CropType {
    #[display("rice")]
    Rice,
    #[display("maize")]
    Maize,
    #[display("tomato")]
    Tomato,
    #[display("unspecified")]
    Unspecified,
}

impl std::str::FromStr for CropType {
    type Err = std::convert::Infallible;

    /// Parses a crop label case-insensitively. English and French labels are recognised;
    /// anything else maps to `CropType::Unspecified`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_uppercase().as_str() {
            "RICE" | "RIZ" => CropType::Rice,
            "MAIZE" | "CORN" | "MAÏS" | "MAIS" => CropType::Maize,
            "TOMATO" | "TOMATOES" | "TOMATE" | "TOMATES" => CropType::Tomato,
            _ => CropType::Unspecified,
        })
    }
}

impl Sensor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        location: Location,
        crop_type: impl Into<String>,
        soil_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location,
            crop_type: crop_type.into(),
            soil_type: soil_type.into(),
        }
    }

    /// The climate profile key for this sensor's crop label
    pub fn crop(&self) -> CropType {
        self.crop_type.parse().unwrap_or(CropType::Unspecified)
    }
}

/// The fleet of sensors simulated when nothing else is supplied: three plots around Dakar.
pub fn default_sensors() -> Vec<Sensor> {
    vec![
        Sensor::new(
            "sensor_001",
            "Parcelle Nord",
            Location { lat: 14.6937, lng: -17.4441, name: "Dakar".into() },
            "Riz",
            "Argileux",
        ),
        Sensor::new(
            "sensor_002",
            "Parcelle Sud",
            Location { lat: 14.7237, lng: -17.4551, name: "Rufisque".into() },
            "Maïs",
            "Sableux",
        ),
        Sensor::new(
            "sensor_003",
            "Parcelle Est",
            Location { lat: 14.6637, lng: -17.4331, name: "Pikine".into() },
            "Tomates",
            "Limon",
        ),
    ]
}
