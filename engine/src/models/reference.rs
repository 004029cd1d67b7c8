//! Phenology reference produced per prediction request

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::GddTarget;

/// Which data the GDD target was built from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TargetSource {
    /// Cultivar genetics plus regional bloom statistics
    CultivarRegional,
    /// Cultivar genetics with crop-level bloom dates
    CultivarOnly,
    /// Cultivar genetics anchored on a grower's planting date
    GrowerPlanting,
    /// Crop-level defaults (no cultivar match)
    CropDefault,
    /// Generic defaults (unknown crop)
    GenericFallback,
}

impl TargetSource {
    /// True when no cultivar data backed the target
    pub fn is_fallback(&self) -> bool {
        matches!(self, TargetSource::CropDefault | TargetSource::GenericFallback)
    }
}

impl std::fmt::Display for TargetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetSource::CultivarRegional => write!(f, "cultivar research + regional data"),
            TargetSource::CultivarOnly => write!(f, "cultivar research"),
            TargetSource::GrowerPlanting => write!(f, "cultivar research + grower planting date"),
            TargetSource::CropDefault => write!(f, "crop defaults"),
            TargetSource::GenericFallback => write!(f, "generic defaults"),
        }
    }
}

/// How the reference date relates to today
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeasonSelection {
    /// A season whose development span has not elapsed
    InProgress,
    /// Every recent season has lapsed; the next bloom is used
    Upcoming,
    /// Storage crop past its span; the latest bloom is kept
    Holding,
    /// Supplied by the grower
    Planted,
}

/// Historical harvest statistics as days of the year
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoricalWindow {
    pub harvest_start_doy: i32,
    pub harvest_end_doy: i32,
    pub peak_start_doy: Option<i32>,
    pub peak_end_doy: Option<i32>,
}

impl HistoricalWindow {
    /// True when the season crosses Jan 1
    pub fn wraps_year(&self) -> bool {
        self.harvest_end_doy < self.harvest_start_doy
    }
}

/// Reference date and targets for one prediction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhenologyReference {
    /// Bloom or planting date the GDD clock starts from
    pub reference_date: NaiveDate,
    pub crop_id: String,
    pub cultivar_id: Option<String>,
    pub region_id: String,
    pub source_gdd_target: GddTarget,
    pub source: TargetSource,
    pub season: SeasonSelection,
    /// Present in regional-average mode when history exists
    pub historical_window: Option<HistoricalWindow>,
    /// Research-backed daily GDD from bloom to harvest
    pub regional_daily_gdd: Option<f64>,
    /// Rate used to size the development span
    pub seasonal_daily_gdd: f64,
    pub days_to_maturity: Option<u32>,
    /// Apples and pears hold in storage and never roll forward
    pub long_storage: bool,
}
