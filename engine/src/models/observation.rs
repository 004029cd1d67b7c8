//! Weather observation models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::GddTarget;
use crate::gdd::daily_gdd;

/// One day of observed temperatures in °F
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub temp_high: f64,
    pub temp_low: f64,
}

impl DailyObservation {
    pub fn new(date: NaiveDate, temp_high: f64, temp_low: f64) -> Self {
        Self {
            date,
            temp_high,
            temp_low,
        }
    }

    /// Build from a provider record that may have gaps.
    ///
    /// Returns `None` when either temperature is missing or not finite; such
    /// days are data gaps and must not reach the accumulator.
    pub fn from_partial(date: NaiveDate, temp_high: Option<f64>, temp_low: Option<f64>) -> Option<Self> {
        match (temp_high, temp_low) {
            (Some(high), Some(low)) if high.is_finite() && low.is_finite() => {
                Some(Self::new(date, high, low))
            }
            _ => None,
        }
    }

    pub fn avg_temp(&self) -> f64 {
        (self.temp_high + self.temp_low) / 2.0
    }

    /// Heat units contributed by this day
    pub fn gdd(&self, base_temp: f64, max_temp: Option<f64>) -> f64 {
        daily_gdd(self.temp_high, self.temp_low, base_temp, max_temp)
    }
}

/// A forecast day; `confidence` falls with lead time
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub temp_high: f64,
    pub temp_low: f64,
    pub confidence: f64,
}

impl ForecastDay {
    pub fn projected_gdd(&self, base_temp: f64, max_temp: Option<f64>) -> f64 {
        daily_gdd(self.temp_high, self.temp_low, base_temp, max_temp)
    }
}

/// Monthly climate normals for a region
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Climatology {
    pub month: u32,
    pub avg_high: f64,
    pub avg_low: f64,
    pub avg_temp: f64,
    /// Average daily GDD at base 55°F
    pub avg_daily_gdd: f64,
    pub observation_count: usize,
    /// True when derived from the latitude table rather than observations
    #[serde(default)]
    pub is_default: bool,
}

impl Climatology {
    /// Average daily heat units at an arbitrary base and cap
    pub fn avg_daily_gdd_at(&self, base_temp: f64, max_temp: Option<f64>) -> f64 {
        daily_gdd(self.avg_high, self.avg_low, base_temp, max_temp)
    }
}

/// Heat accumulated since a reference date
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AccumulationState {
    pub cumulative_gdd: f64,
    pub observation_count: usize,
    pub last_date: Option<NaiveDate>,
    /// Set when the total was estimated from an average rate instead of observations
    #[serde(default)]
    pub estimated: bool,
}

impl Default for AccumulationState {
    fn default() -> Self {
        Self::empty()
    }
}

impl AccumulationState {
    pub fn empty() -> Self {
        Self {
            cumulative_gdd: 0.0,
            observation_count: 0,
            last_date: None,
            estimated: false,
        }
    }

    /// Climatology stand-in: `days_elapsed × avg_daily_gdd`
    pub fn estimated(days_elapsed: i64, avg_daily_gdd: f64) -> Self {
        let days = days_elapsed.max(0) as f64;
        let rate = if avg_daily_gdd.is_finite() {
            avg_daily_gdd.max(0.0)
        } else {
            0.0
        };
        Self {
            cumulative_gdd: days * rate,
            observation_count: 0,
            last_date: None,
            estimated: true,
        }
    }

    /// Mean GDD per observed day
    pub fn avg_daily_gdd(&self) -> Option<f64> {
        if self.observation_count == 0 {
            return None;
        }
        Some(self.cumulative_gdd / self.observation_count as f64)
    }

    pub fn pct_to_maturity(&self, target: &GddTarget) -> f64 {
        (self.cumulative_gdd / target.gdd_to_maturity * 100.0).min(100.0)
    }

    pub fn pct_to_peak(&self, target: &GddTarget) -> f64 {
        (self.cumulative_gdd / target.gdd_to_peak * 100.0).min(100.0)
    }
}

/// Aggregated weather for a season to date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_gdd: f64,
    pub avg_daily_gdd: f64,
    pub avg_high: f64,
    pub avg_low: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    /// Days with a low below 32°F
    pub frost_events: usize,
    pub last_frost_date: Option<NaiveDate>,
    /// Rough estimate: 8 hours per day with a low between 32°F and 45°F
    pub chill_hours: u32,
    pub observation_count: usize,
    pub missing_days: i64,
}

/// How the season compares to the expected heat accumulation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaceStatus {
    Ahead,
    Normal,
    Behind,
}

impl std::fmt::Display for PaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaceStatus::Ahead => write!(f, "ahead"),
            PaceStatus::Normal => write!(f, "normal"),
            PaceStatus::Behind => write!(f, "behind"),
        }
    }
}

/// Result of comparing accumulated heat with a normal season
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonPace {
    pub status: PaceStatus,
    pub current_gdd: f64,
    pub expected_gdd: f64,
    pub deviation_gdd: f64,
    pub deviation_pct: f64,
    pub message: String,
}
