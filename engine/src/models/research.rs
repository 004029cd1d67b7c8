//! Research records served by the cultivar catalog

use serde::{Deserialize, Serialize};

use crate::calendar::harvest_days;
use crate::types::{Coordinates, RegionClass};

fn default_base_temp() -> f64 {
    50.0
}

/// Genetic quality tier of a cultivar
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Premium,
    #[default]
    Standard,
    Commodity,
}

/// Relative season timing within a crop
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimingClass {
    Early,
    #[default]
    Mid,
    Late,
}

/// Research facts about one cultivar
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CultivarResearch {
    pub cultivar_id: String,
    pub cultivar_name: String,
    /// Crop id this cultivar belongs to (e.g. "navel_orange")
    pub crop_type: String,
    /// Peak Brix reported by studies; the genetic ceiling
    #[serde(default)]
    pub research_peak_brix: Option<f64>,
    #[serde(default)]
    pub research_avg_brix: Option<f64>,
    #[serde(default)]
    pub quality_tier: QualityTier,
    #[serde(default)]
    pub timing_class: TimingClass,
    #[serde(default)]
    pub days_to_maturity: Option<u32>,
    #[serde(default)]
    pub gdd_to_maturity: Option<f64>,
    #[serde(default)]
    pub gdd_to_peak: Option<f64>,
    #[serde(default = "default_base_temp")]
    pub gdd_base_temp: f64,
    /// Upper developmental cap for the 86/50 method
    #[serde(default)]
    pub gdd_max_temp: Option<f64>,
    /// Number of independent Brix studies behind `research_peak_brix`
    #[serde(default)]
    pub brix_study_count: u32,
    #[serde(default)]
    pub research_sources: Vec<String>,
}

/// Bloom and harvest statistics for a cultivar in a region
///
/// Day-of-year fields are 1-based. Harvest windows that cross Jan 1 have
/// `historical_harvest_end_doy < historical_harvest_start_doy`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionalBloomData {
    pub cultivar_id: String,
    pub region_id: String,
    #[serde(default)]
    pub avg_bloom_start_doy: Option<i32>,
    #[serde(default)]
    pub avg_bloom_peak_doy: Option<i32>,
    #[serde(default)]
    pub avg_bloom_end_doy: Option<i32>,
    #[serde(default)]
    pub historical_harvest_start_doy: Option<i32>,
    #[serde(default)]
    pub historical_harvest_end_doy: Option<i32>,
    #[serde(default)]
    pub historical_peak_start_doy: Option<i32>,
    #[serde(default)]
    pub historical_peak_end_doy: Option<i32>,
    #[serde(default)]
    pub avg_gdd_per_day_bloom_to_harvest: Option<f64>,
    #[serde(default)]
    pub years_of_data: u32,
    #[serde(default)]
    pub data_source: Option<String>,
}

impl RegionalBloomData {
    /// Bloom day used as the reference point, peak preferred over start
    pub fn bloom_doy(&self) -> Option<i32> {
        self.avg_bloom_peak_doy.or(self.avg_bloom_start_doy)
    }

    /// Length of the historical harvest season in days, wrap-aware
    pub fn historical_harvest_days(&self) -> Option<u32> {
        match (self.historical_harvest_start_doy, self.historical_harvest_end_doy) {
            (Some(start), Some(end)) => Some(harvest_days(start, end)),
            _ => None,
        }
    }
}

/// Rootstock effect on fruit quality
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RootstockResearch {
    pub rootstock_id: String,
    pub rootstock_name: String,
    #[serde(default)]
    pub crop_types: Vec<String>,
    /// Added to the scion's Brix
    #[serde(default)]
    pub brix_modifier: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A growing region known to the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowingRegion {
    pub region_id: String,
    pub name: String,
    /// Two-letter state code
    pub state: String,
    pub coordinates: Coordinates,
    /// Typical daily GDD over a growing season
    #[serde(default)]
    pub seasonal_daily_gdd: Option<f64>,
}

impl GrowingRegion {
    pub fn class(&self) -> RegionClass {
        RegionClass::classify(&self.state, self.coordinates.latitude)
    }
}
