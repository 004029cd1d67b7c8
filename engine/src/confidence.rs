//! Confidence scoring and prediction ranges
//!
//! A point value is never shown alone once confidence drops below high;
//! every prediction is wrapped in a range sized by the quality of the
//! research behind it.

use chrono::NaiveDate;

use crate::calendar::shift;
use crate::models::{
    CultivarDataCompleteness, CultivarResearch, DataQuality, DateRange, HarvestDateRanges,
    HarvestWindowPrediction, PredictionRange, QualityPrediction, QualityUnit, RegionalBloomData,
    TargetSource,
};
use crate::quality::BrixModifiers;

pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Base confidence ceiling when only generic defaults were available
pub const GENERIC_FALLBACK_CAP: f64 = 0.3;
/// Base confidence ceiling when only crop-level defaults were available
pub const CROP_DEFAULT_CAP: f64 = 0.5;

const NEAR_TERM_DAYS: i64 = 14;
const HIGH_VARIANCE: f64 = 0.2;

/// Oil spreads are this many times the Brix spread
const OIL_SPREAD_SCALE: f64 = 2.0;
/// Oil content a nut kernel can plausibly reach, in percent
const OIL_BOUNDS: (f64, f64) = (55.0, 72.0);

/// Adjust a base confidence for forecast horizon and data availability.
///
/// Horizon decay is tiered: ×0.95 beyond 14 days, ×0.85 beyond 30, ×0.7
/// beyond 60. Near-term events without a forecast lose a further 10%, and
/// historical variance above 0.2 costs 15%. The result is clamped to
/// [0.1, 0.95] and rounded to two decimals.
pub fn confidence(
    base_confidence: f64,
    days_until_event: i64,
    forecast_available: bool,
    historical_variance: Option<f64>,
) -> f64 {
    if !base_confidence.is_finite() {
        return MIN_CONFIDENCE;
    }
    let mut confidence = base_confidence;

    if days_until_event > 60 {
        confidence *= 0.7;
    } else if days_until_event > 30 {
        confidence *= 0.85;
    } else if days_until_event > NEAR_TERM_DAYS {
        confidence *= 0.95;
    }

    if !forecast_available && days_until_event <= NEAR_TERM_DAYS {
        confidence *= 0.9;
    }

    if historical_variance.is_some_and(|v| v > HIGH_VARIANCE) {
        confidence *= 0.85;
    }

    (confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE) * 100.0).round() / 100.0
}

/// Cap a base confidence when the target came from a fallback
pub fn cap_for_source(base_confidence: f64, source: TargetSource) -> f64 {
    match source {
        TargetSource::GenericFallback => base_confidence.min(GENERIC_FALLBACK_CAP),
        TargetSource::CropDefault => base_confidence.min(CROP_DEFAULT_CAP),
        _ => base_confidence,
    }
}

/// Which research facts the catalog holds for a cultivar in a region
pub fn completeness_for(
    cultivar: Option<&CultivarResearch>,
    regional: Option<&RegionalBloomData>,
) -> CultivarDataCompleteness {
    let Some(cultivar) = cultivar else {
        return CultivarDataCompleteness::default();
    };
    CultivarDataCompleteness {
        has_brix_data: cultivar.research_peak_brix.is_some(),
        has_gdd_data: cultivar.gdd_to_maturity.is_some() || cultivar.gdd_to_peak.is_some(),
        has_bloom_data: regional.is_some_and(|r| r.bloom_doy().is_some()),
        has_harvest_window: regional.is_some_and(|r| r.historical_harvest_days().is_some()),
        has_regional_data: regional.is_some(),
        brix_study_count: cultivar.brix_study_count,
        years_of_data: regional.map(|r| r.years_of_data).unwrap_or(0),
    }
}

/// Brix range around `cultivar_base` plus modifiers.
///
/// Without cultivar research the crop-average range 8-10-12 is returned at
/// low confidence.
pub fn build_brix_range(
    cultivar_base: Option<f64>,
    modifiers: &BrixModifiers,
    completeness: &CultivarDataCompleteness,
) -> PredictionRange {
    let Some(base) = cultivar_base else {
        return PredictionRange {
            low: 8.0,
            mid: 10.0,
            high: 12.0,
            confidence: GENERIC_FALLBACK_CAP,
            data_quality: DataQuality::Low,
        };
    };

    let point = base + modifiers.total();
    let base_confidence = completeness.base_confidence();
    let (spread, data_quality) = brix_spread(base_confidence);

    PredictionRange {
        low: (point - spread).max(0.0),
        mid: point,
        high: point + spread,
        confidence: base_confidence,
        data_quality,
    }
}

/// Half-width in °Brix for a base confidence
fn brix_spread(base_confidence: f64) -> (f64, DataQuality) {
    if base_confidence >= 0.7 {
        (0.5, DataQuality::High)
    } else if base_confidence >= 0.5 {
        (1.0, DataQuality::Medium)
    } else {
        (1.5, DataQuality::Low)
    }
}

/// Range around the assessed sugar, or oil for nuts.
///
/// Uses the Brix spread bands; oil spreads are doubled and stay within
/// 55-72%. The range carries the prediction's own confidence.
pub fn build_quality_range(
    quality: &QualityPrediction,
    completeness: &CultivarDataCompleteness,
) -> PredictionRange {
    let (spread, data_quality) = brix_spread(completeness.base_confidence());
    let point = quality.predicted_sugar;
    let (low, high) = match quality.unit {
        QualityUnit::Brix => ((point - spread).max(0.0), point + spread),
        QualityUnit::OilPercent => {
            let spread = spread * OIL_SPREAD_SCALE;
            (
                (point - spread).max(OIL_BOUNDS.0).min(point),
                (point + spread).min(OIL_BOUNDS.1).max(point),
            )
        }
    };
    PredictionRange {
        low,
        mid: point,
        high,
        confidence: quality.confidence,
        data_quality,
    }
}

/// Date range around `likely` sized by data quality
pub fn build_date_range(likely: NaiveDate, confidence: f64, data_quality: DataQuality) -> DateRange {
    let days = data_quality.uncertainty_days();
    DateRange {
        earliest: shift(likely, -days),
        likely,
        latest: shift(likely, days),
        confidence,
        data_quality,
    }
}

/// Date ranges around window start, peak center and window end
pub fn build_window_ranges(
    window: &HarvestWindowPrediction,
    confidence: f64,
    data_quality: DataQuality,
) -> HarvestDateRanges {
    HarvestDateRanges {
        start: build_date_range(window.maturity_date, confidence, data_quality),
        peak: build_date_range(window.peak_center_date, confidence, data_quality),
        end: build_date_range(window.window_end_date, confidence, data_quality),
    }
}
