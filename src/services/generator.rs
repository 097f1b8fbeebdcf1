//! # Reading Generator

//! Produces plausible readings for a sensor from three heuristics: a per-crop climate profile, a day/night
//! adjustment keyed on the local hour, and a small trend shared by humidity and temperature.
//! Generation is pure computation and cannot fail.

use std::collections::HashMap;
use chrono::{NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use crate::models::{local_now, CropType, Reading, ReadingMetadata, Sensor};

pub const HUMIDITY_BOUNDS: (f64, f64) = (0.0, 100.0);
pub const TEMPERATURE_BOUNDS: (f64, f64) = (0.0, 50.0);
pub const SOIL_PH_RANGE: (f64, f64) = (5.8, 7.2);
pub const BATTERY_RANGE: (u8, u8) = (85, 100);
pub const SIGNAL_RANGE: (u8, u8) = (75, 100);

/// Zero appears twice so it is drawn half of the time.
pub const TREND_CHOICES: [f64; 4] = [-0.5, 0.0, 0.0, 0.5];

/// A value source for one axis of a climate profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Band {
    /// Always the same value
    Fixed(f64),
    /// Uniform draw from the inclusive range
    Uniform(f64, f64),
}

impl Band {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Band::Fixed(value) => value,
            Band::Uniform(low, high) => rng.gen_range(low..=high),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        match *self {
            Band::Fixed(fixed) => value == fixed,
            Band::Uniform(low, high) => (low..=high).contains(&value),
        }
    }
}

/// Base humidity and temperature for a crop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropProfile {
    pub humidity: Band,
    pub temperature: Band,
}

/// Used for any crop without an entry in the table. Its bases are fixed, so only the diurnal
/// and trend terms make its readings vary.
pub const DEFAULT_PROFILE: CropProfile = CropProfile {
    humidity: Band::Fixed(45.0),
    temperature: Band::Fixed(25.0),
};

static CROP_PROFILES: Lazy<HashMap<CropType, CropProfile>> = Lazy::new(|| {
    HashMap::from([
        (CropType::Rice, CropProfile {
            humidity: Band::Uniform(60.0, 80.0),
            temperature: Band::Uniform(28.0, 35.0),
        }),
        (CropType::Maize, CropProfile {
            humidity: Band::Uniform(40.0, 60.0),
            temperature: Band::Uniform(30.0, 38.0),
        }),
        (CropType::Tomato, CropProfile {
            humidity: Band::Uniform(50.0, 70.0),
            temperature: Band::Uniform(25.0, 32.0),
        }),
    ])
});

/// Looks up the climate profile for a crop, falling back to `DEFAULT_PROFILE`
pub fn profile_for(crop: CropType) -> &'static CropProfile {
    CROP_PROFILES.get(&crop).unwrap_or(&DEFAULT_PROFILE)
}

/// Day runs from 06:00 through 18:59 local time
pub fn is_daytime(hour: u32) -> bool {
    (6..=18).contains(&hour)
}

/// Day/night variation added on top of the crop base
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiurnalAdjustment {
    pub humidity: Band,
    pub temperature: Band,
}

impl DiurnalAdjustment {
    pub fn for_hour(hour: u32) -> Self {
        if is_daytime(hour) {
            Self {
                humidity: Band::Uniform(-10.0, -5.0),
                temperature: Band::Uniform(2.0, 8.0),
            }
        } else {
            Self {
                humidity: Band::Uniform(5.0, 15.0),
                temperature: Band::Uniform(-5.0, -2.0),
            }
        }
    }
}

/// The unclamped terms behind one reading's humidity and temperature.
///
/// `trend` is stored once and added to both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    pub base_humidity: f64,
    pub base_temperature: f64,
    pub humidity_variation: f64,
    pub temperature_variation: f64,
    pub trend: f64,
}

impl ClimateSample {
    pub fn draw<R: Rng + ?Sized>(crop: CropType, hour: u32, rng: &mut R) -> Self {
        let profile = profile_for(crop);
        let base_humidity = profile.humidity.sample(rng);
        let base_temperature = profile.temperature.sample(rng);

        let diurnal = DiurnalAdjustment::for_hour(hour);
        let temperature_variation = diurnal.temperature.sample(rng);
        let humidity_variation = diurnal.humidity.sample(rng);

        let trend = *TREND_CHOICES.choose(rng).unwrap_or(&0.0);

        Self {
            base_humidity,
            base_temperature,
            humidity_variation,
            temperature_variation,
            trend,
        }
    }

    pub fn humidity(&self) -> f64 {
        (self.base_humidity + self.humidity_variation + self.trend)
            .clamp(HUMIDITY_BOUNDS.0, HUMIDITY_BOUNDS.1)
    }

    pub fn temperature(&self) -> f64 {
        (self.base_temperature + self.temperature_variation + self.trend)
            .clamp(TEMPERATURE_BOUNDS.0, TEMPERATURE_BOUNDS.1)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Generates a reading for `sensor` stamped with the current local time
pub fn generate_reading(sensor: &Sensor) -> Reading {
    generate_reading_at(sensor, local_now(), &mut rand::thread_rng())
}

/// Generates a reading for `sensor` as if taken at `now`, drawing every random term from `rng`
pub fn generate_reading_at<R: Rng + ?Sized>(sensor: &Sensor, now: NaiveDateTime, rng: &mut R) -> Reading {
    let climate = ClimateSample::draw(sensor.crop(), now.hour(), rng);

    Reading {
        sensor_id: sensor.id.clone(),
        humidity: climate.humidity(),
        temperature: climate.temperature(),
        soil_ph: round2(rng.gen_range(SOIL_PH_RANGE.0..=SOIL_PH_RANGE.1)),
        location: sensor.location.clone(),
        battery_level: rng.gen_range(BATTERY_RANGE.0..=BATTERY_RANGE.1),
        signal_strength: rng.gen_range(SIGNAL_RANGE.0..=SIGNAL_RANGE.1),
        timestamp: now,
        metadata: ReadingMetadata::from(sensor),
    }
}
