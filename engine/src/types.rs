//! Common types used across the engine

use serde::{Deserialize, Serialize};

/// Geographic coordinates in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Coarse climate class used to pick typical bloom dates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegionClass {
    South,
    West,
    North,
    #[default]
    Default,
}

impl RegionClass {
    /// Classify by state code and latitude.
    ///
    /// Gulf states and anything below 32°N are south; the Pacific states are
    /// west; anything above 42°N is north.
    pub fn classify(state: &str, latitude: f64) -> Self {
        if matches!(state, "FL" | "TX") || latitude < 32.0 {
            RegionClass::South
        } else if matches!(state, "CA" | "OR" | "WA") {
            RegionClass::West
        } else if latitude > 42.0 {
            RegionClass::North
        } else {
            RegionClass::Default
        }
    }
}

impl std::fmt::Display for RegionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionClass::South => write!(f, "south"),
            RegionClass::West => write!(f, "west"),
            RegionClass::North => write!(f, "north"),
            RegionClass::Default => write!(f, "default"),
        }
    }
}

/// Convert Celsius to Fahrenheit
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}
