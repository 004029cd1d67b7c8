//! Confidence ranges around point predictions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Quality of the research data behind a prediction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    High,
    Medium,
    Low,
    Unknown,
}

impl DataQuality {
    /// Days either side of a likely date
    pub fn uncertainty_days(&self) -> i64 {
        match self {
            DataQuality::High => 3,
            DataQuality::Medium => 7,
            DataQuality::Low => 14,
            DataQuality::Unknown => 21,
        }
    }
}

/// Banded confidence for display
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    Speculative,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ConfidenceLevel::High
        } else if score >= 0.6 {
            ConfidenceLevel::Medium
        } else if score >= 0.4 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::Speculative
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "high"),
            ConfidenceLevel::Medium => write!(f, "medium"),
            ConfidenceLevel::Low => write!(f, "low"),
            ConfidenceLevel::Speculative => write!(f, "speculative"),
        }
    }
}

/// A point estimate with its plausible spread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionRange {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
    pub confidence: f64,
    pub data_quality: DataQuality,
}

impl PredictionRange {
    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_score(self.confidence)
    }

    pub fn range_width(&self) -> f64 {
        self.high - self.low
    }

    /// Half the range as a percentage of the midpoint
    pub fn uncertainty_pct(&self) -> f64 {
        if self.mid == 0.0 {
            return 0.0;
        }
        self.range_width() / 2.0 / self.mid * 100.0
    }

    /// Display string; bare values only at high confidence
    pub fn to_display(&self) -> String {
        match self.confidence_level() {
            ConfidenceLevel::High => {
                format!("{:.1} (±{:.1})", self.mid, self.range_width() / 2.0)
            }
            ConfidenceLevel::Medium | ConfidenceLevel::Low => {
                format!("{:.1} - {:.1}", self.low, self.high)
            }
            ConfidenceLevel::Speculative => format!("~{:.1} (estimate)", self.mid),
        }
    }
}

/// A likely date with earliest and latest bounds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DateRange {
    pub earliest: NaiveDate,
    pub likely: NaiveDate,
    pub latest: NaiveDate,
    pub confidence: f64,
    pub data_quality: DataQuality,
}

impl DateRange {
    pub fn range_days(&self) -> i64 {
        (self.latest - self.earliest).num_days()
    }

    pub fn to_display(&self) -> String {
        let days = self.range_days();
        if days <= 7 {
            format!("~{}", self.likely.format("%b %d"))
        } else if days <= 21 {
            format!(
                "{} - {}",
                self.earliest.format("%b %d"),
                self.latest.format("%b %d")
            )
        } else {
            format!(
                "{} to {}",
                self.earliest.format("%b"),
                self.latest.format("%b")
            )
        }
    }
}

/// Date ranges around the start, peak and end of a harvest window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarvestDateRanges {
    pub start: DateRange,
    pub peak: DateRange,
    pub end: DateRange,
}

/// Which research facts exist for a cultivar
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CultivarDataCompleteness {
    pub has_brix_data: bool,
    pub has_gdd_data: bool,
    pub has_bloom_data: bool,
    pub has_harvest_window: bool,
    pub has_regional_data: bool,
    #[serde(default)]
    pub brix_study_count: u32,
    #[serde(default)]
    pub years_of_data: u32,
}

impl CultivarDataCompleteness {
    fn flags(&self) -> [(bool, &'static str); 5] {
        [
            (self.has_brix_data, "Brix research"),
            (self.has_gdd_data, "GDD requirements"),
            (self.has_bloom_data, "bloom dates"),
            (self.has_harvest_window, "harvest window"),
            (self.has_regional_data, "regional data"),
        ]
    }

    /// Fraction of the five facts present
    pub fn completeness_score(&self) -> f64 {
        let present = self.flags().iter().filter(|(has, _)| *has).count();
        present as f64 / 5.0
    }

    pub fn data_quality(&self) -> DataQuality {
        let score = self.completeness_score();
        if score >= 0.8 {
            DataQuality::High
        } else if score >= 0.6 {
            DataQuality::Medium
        } else if score >= 0.4 {
            DataQuality::Low
        } else {
            DataQuality::Unknown
        }
    }

    /// Completeness plus bonuses for well-studied cultivars, capped at 0.95
    pub fn base_confidence(&self) -> f64 {
        let mut confidence = self.completeness_score();
        if self.brix_study_count >= 5 {
            confidence += 0.1;
        }
        if self.years_of_data >= 10 {
            confidence += 0.1;
        }
        confidence.min(0.95)
    }

    pub fn missing_data(&self) -> Vec<&'static str> {
        self.flags()
            .iter()
            .filter(|(has, _)| !*has)
            .map(|(_, name)| *name)
            .collect()
    }
}
