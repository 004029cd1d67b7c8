//! Harvest window models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Harvest status of a crop relative to today
///
/// Several flags can hold at once; the status is the highest-priority one:
/// at peak, in optimal window, past optimal, harvestable, off season.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeasonStatus {
    OffSeason,
    Harvestable,
    InOptimalWindow,
    AtPeak,
    PastOptimal,
}

impl SeasonStatus {
    pub fn from_flags(flags: &SeasonFlags) -> Self {
        if flags.at_peak {
            SeasonStatus::AtPeak
        } else if flags.in_optimal_window {
            SeasonStatus::InOptimalWindow
        } else if flags.past_optimal {
            SeasonStatus::PastOptimal
        } else if flags.harvestable {
            SeasonStatus::Harvestable
        } else {
            SeasonStatus::OffSeason
        }
    }

    pub fn is_in_season(&self) -> bool {
        !matches!(self, SeasonStatus::OffSeason)
    }
}

impl std::fmt::Display for SeasonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeasonStatus::OffSeason => write!(f, "off_season"),
            SeasonStatus::Harvestable => write!(f, "harvestable"),
            SeasonStatus::InOptimalWindow => write!(f, "in_optimal_window"),
            SeasonStatus::AtPeak => write!(f, "at_peak"),
            SeasonStatus::PastOptimal => write!(f, "past_optimal"),
        }
    }
}

/// Every status condition evaluated independently
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SeasonFlags {
    pub harvestable: bool,
    pub in_optimal_window: bool,
    pub at_peak: bool,
    pub past_optimal: bool,
    pub off_season: bool,
}

/// How the window dates were obtained
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionBasis {
    /// Regional day-of-year statistics
    HistoricalLookup,
    /// GDD thresholds divided by a daily rate
    GddProjection,
    /// No usable rate; fixed offsets from days to maturity
    FixedOffsets,
}

/// Projected harvest calendar for one season
///
/// Dates satisfy `maturity <= optimal_start <= peak_center <= optimal_end <= window_end`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarvestWindowPrediction {
    pub reference_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub optimal_start_date: NaiveDate,
    pub peak_center_date: NaiveDate,
    pub optimal_end_date: NaiveDate,
    pub window_end_date: NaiveDate,
    /// Share of the harvest window elapsed today, 0-100
    pub progress_pct: f64,
    pub status: SeasonStatus,
    pub flags: SeasonFlags,
    pub showing_next_season: bool,
    pub basis: ProjectionBasis,
}

impl HarvestWindowPrediction {
    /// The five dates in window order
    pub fn dates(&self) -> [NaiveDate; 5] {
        [
            self.maturity_date,
            self.optimal_start_date,
            self.peak_center_date,
            self.optimal_end_date,
            self.window_end_date,
        ]
    }

    pub fn is_ordered(&self) -> bool {
        self.dates().windows(2).all(|w| w[0] <= w[1])
    }

    /// Short human-readable window message for `today`
    pub fn headline(&self, today: NaiveDate) -> String {
        if self.flags.off_season {
            if self.showing_next_season {
                let days_until = (self.maturity_date - today).num_days();
                if days_until <= 60 {
                    return format!("Next season in {} days", days_until);
                }
                return format!("Next season: {}", self.maturity_date.format("%B %Y"));
            }
            if today < self.maturity_date {
                let days_until = (self.maturity_date - today).num_days();
                if days_until <= 30 {
                    return format!("Season starts in {} days", days_until);
                }
                return format!("Season: {}", self.maturity_date.format("%B %d"));
            }
            return "Off-season".to_string();
        }

        match self.status {
            SeasonStatus::AtPeak => "AT PEAK NOW!".to_string(),
            SeasonStatus::InOptimalWindow => "Optimal harvest NOW!".to_string(),
            SeasonStatus::PastOptimal => "Past peak - still good".to_string(),
            _ => {
                let days_until_peak = (self.peak_center_date - today).num_days();
                if days_until_peak > 0 {
                    format!("Good now, peak in {} days", days_until_peak)
                } else {
                    "Harvestable now".to_string()
                }
            }
        }
    }
}
