//! Quality assessment models

use serde::{Deserialize, Serialize};

/// Measurement unit of the primary quality metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QualityUnit {
    /// Dissolved sugar, fruit
    Brix,
    /// Kernel oil content, nuts
    OilPercent,
}

impl std::fmt::Display for QualityUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityUnit::Brix => write!(f, "°Bx"),
            QualityUnit::OilPercent => write!(f, "% oil"),
        }
    }
}

/// Whether a crop keeps ripening after harvest
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PostHarvestBehavior {
    Climacteric,
    NonClimacteric,
}

/// Predicted internal quality at a point in the season
///
/// For nuts `predicted_sugar` holds oil percentage and acid is 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityPrediction {
    pub predicted_sugar: f64,
    pub predicted_acid: f64,
    /// Sugar to acid ratio, only when acid is above 0.1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    /// Brix minus four times acid
    pub brima: f64,
    pub unit: QualityUnit,
    pub peak_sugar: f64,
    pub peak_acid: f64,
    /// Sugar after post-harvest losses, when days since harvest is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_sugar: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness_multiplier: Option<f64>,
    /// Whether the crop keeps ripening once picked
    pub post_harvest: PostHarvestBehavior,
    pub confidence: f64,
    pub message: String,
}

impl QualityPrediction {
    /// Value and unit, e.g. "12.4 °Bx"
    pub fn display_value(&self) -> String {
        format!("{:.1} {}", self.predicted_sugar, self.unit)
    }
}
