//! Per-crop quality curves
//!
//! Each crop family supplies a sugar accumulation curve, an acid decay
//! curve and a post-harvest freshness table. Nuts report oil percentage in
//! place of sugar and have no acid.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{PostHarvestBehavior, QualityPrediction, QualityUnit, SeasonStatus};

/// Ceiling used when neither cultivar research nor a crop profile has one
pub const DEFAULT_BRIX_CEILING: f64 = 12.0;

/// Acid level below which the sugar/acid ratio is not meaningful
const MIN_ACID_FOR_RATIO: f64 = 0.1;

const TIMING_HALF_WIDTH_GDD: f64 = 150.0;
const TIMING_MAX_PENALTY: f64 = 1.0;
const TIMING_PENALTY_CAP: f64 = 1.5;

// ============================================================================
// Crop Families
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BerryKind {
    Strawberry,
    Blueberry,
    Tomato,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PomeKind {
    Apple,
    Pear,
}

/// Closed set of quality models
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "family", content = "kind")]
pub enum CropFamily {
    Citrus,
    Berry(BerryKind),
    StoneClimacteric,
    StoneNonClimacteric,
    Pome(PomeKind),
    Tropical,
    Nut,
}

/// Family chosen for a crop and whether it was a fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyResolution {
    pub family: CropFamily,
    pub is_fallback: bool,
}

impl FamilyResolution {
    /// Annotation for reports when the family was not matched
    pub fn annotation(&self) -> Option<&'static str> {
        self.is_fallback
            .then_some("quality estimated with the citrus model")
    }
}

impl CropFamily {
    /// Family for a known crop id
    pub fn for_crop(crop_id: &str) -> Option<Self> {
        let family = match crop_id {
            "navel_orange" | "valencia" | "grapefruit" | "tangerine" | "satsuma" | "pomegranate" => {
                CropFamily::Citrus
            }
            "strawberry" => CropFamily::Berry(BerryKind::Strawberry),
            "blueberry" => CropFamily::Berry(BerryKind::Blueberry),
            "tomato" => CropFamily::Berry(BerryKind::Tomato),
            "peach" => CropFamily::StoneClimacteric,
            "sweet_cherry" | "tart_cherry" | "cherry" => CropFamily::StoneNonClimacteric,
            "apple" => CropFamily::Pome(PomeKind::Apple),
            "pear" => CropFamily::Pome(PomeKind::Pear),
            "mango" => CropFamily::Tropical,
            "pecan" => CropFamily::Nut,
            _ => return None,
        };
        Some(family)
    }

    /// Family for any crop; unknown crops use the citrus model and say so
    pub fn resolve(crop_id: &str) -> FamilyResolution {
        match Self::for_crop(crop_id) {
            Some(family) => FamilyResolution {
                family,
                is_fallback: false,
            },
            None => {
                debug!(crop_id, "No quality model for crop, using citrus model");
                FamilyResolution {
                    family: CropFamily::Citrus,
                    is_fallback: true,
                }
            }
        }
    }

    fn params(&self) -> &'static QualityParams {
        match self {
            CropFamily::Citrus => &CITRUS,
            CropFamily::Berry(BerryKind::Strawberry) => &STRAWBERRY,
            CropFamily::Berry(BerryKind::Blueberry) => &BLUEBERRY,
            CropFamily::Berry(BerryKind::Tomato) => &TOMATO,
            CropFamily::StoneClimacteric => &PEACH,
            CropFamily::StoneNonClimacteric => &CHERRY,
            CropFamily::Pome(PomeKind::Apple) => &APPLE,
            CropFamily::Pome(PomeKind::Pear) => &PEAR,
            CropFamily::Tropical => &MANGO,
            CropFamily::Nut => &PECAN,
        }
    }

    /// Sugar (°Brix) at `gdd`, or oil percentage for nuts
    pub fn sugar(&self, gdd: f64, ceiling: f64) -> f64 {
        self.params().sugar.evaluate(gdd.max(0.0), ceiling)
    }

    /// Titratable acid at `gdd`; always 0 for nuts
    pub fn acid(&self, gdd: f64) -> f64 {
        self.params().acid.evaluate(gdd.max(0.0))
    }

    /// Quality multiplier in [0, 1] after `days_since_harvest`.
    ///
    /// Pears follow the cold-storage table while `cold_chain` holds and the
    /// room-temperature ripening curve (rise, peak, fall) otherwise.
    /// Tomatoes ignore the flag.
    pub fn freshness_decay(&self, days_since_harvest: u32, cold_chain: bool) -> f64 {
        let params = self.params();
        let table = if cold_chain {
            &params.cold_chain
        } else {
            &params.ambient
        };
        table.evaluate(days_since_harvest).clamp(0.0, 1.0)
    }

    /// Days of optimal freshness after harvest
    pub fn freshness_window_days(&self) -> u32 {
        self.params().freshness_window_days
    }

    pub fn post_harvest_behavior(&self) -> PostHarvestBehavior {
        self.params().behavior
    }

    pub fn unit(&self) -> QualityUnit {
        match self {
            CropFamily::Nut => QualityUnit::OilPercent,
            _ => QualityUnit::Brix,
        }
    }

    pub fn is_nut(&self) -> bool {
        matches!(self, CropFamily::Nut)
    }
}

impl std::fmt::Display for CropFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CropFamily::Citrus => write!(f, "citrus"),
            CropFamily::Berry(_) => write!(f, "berry"),
            CropFamily::StoneClimacteric => write!(f, "stone_fruit_climacteric"),
            CropFamily::StoneNonClimacteric => write!(f, "stone_fruit_non_climacteric"),
            CropFamily::Pome(_) => write!(f, "pome"),
            CropFamily::Tropical => write!(f, "tropical"),
            CropFamily::Nut => write!(f, "nut"),
        }
    }
}

// ============================================================================
// Curve Parameters
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum SugarCurve {
    /// `min + (ceiling - min) / (1 + exp(-(gdd - midpoint) / steepness))`
    Logistic {
        min: f64,
        midpoint: f64,
        steepness: f64,
    },
    /// Proportional rise to the ceiling at `full_at`
    Linear { full_at: f64 },
    /// Oil percentage, flat below shuck split then linear to the target
    Oil {
        min_oil: f64,
        max_oil: f64,
        shuck_split_gdd: f64,
        target_gdd: f64,
    },
}

impl SugarCurve {
    fn evaluate(&self, gdd: f64, ceiling: f64) -> f64 {
        match *self {
            SugarCurve::Logistic {
                min,
                midpoint,
                steepness,
            } => min + (ceiling - min) / (1.0 + (-(gdd - midpoint) / steepness).exp()),
            SugarCurve::Linear { full_at } => {
                if gdd >= full_at {
                    ceiling
                } else {
                    ceiling * (gdd / full_at)
                }
            }
            SugarCurve::Oil {
                min_oil,
                max_oil,
                shuck_split_gdd,
                target_gdd,
            } => {
                if gdd >= target_gdd {
                    max_oil
                } else if gdd >= shuck_split_gdd {
                    min_oil
                        + (max_oil - min_oil) * (gdd - shuck_split_gdd)
                            / (target_gdd - shuck_split_gdd)
                } else {
                    min_oil
                }
            }
        }
    }
}

/// `initial * exp(-decay_rate * gdd)`
#[derive(Debug, Clone, Copy)]
struct AcidCurve {
    initial: f64,
    decay_rate: f64,
}

impl AcidCurve {
    const NONE: AcidCurve = AcidCurve {
        initial: 0.0,
        decay_rate: 0.0,
    };

    fn evaluate(&self, gdd: f64) -> f64 {
        self.initial * (-self.decay_rate * gdd).exp()
    }
}

/// Step table, then a linear decline to a floor.
///
/// `steps` holds `(last_day, multiplier)` pairs in day order. Past the last
/// step the multiplier is `max(floor, 1 - (days - tail_offset) * tail_rate)`.
#[derive(Debug, Clone, Copy)]
struct DecayTable {
    steps: &'static [(u32, f64)],
    tail_offset: u32,
    tail_rate: f64,
    floor: f64,
}

impl DecayTable {
    fn evaluate(&self, days: u32) -> f64 {
        if let Some((_, value)) = self.steps.iter().find(|(last_day, _)| days <= *last_day) {
            return *value;
        }
        let over = f64::from(days) - f64::from(self.tail_offset);
        (1.0 - over * self.tail_rate).max(self.floor)
    }
}

#[derive(Debug)]
struct QualityParams {
    sugar: SugarCurve,
    acid: AcidCurve,
    cold_chain: DecayTable,
    ambient: DecayTable,
    freshness_window_days: u32,
    behavior: PostHarvestBehavior,
}

const fn logistic(min: f64, midpoint: f64, steepness: f64) -> SugarCurve {
    SugarCurve::Logistic {
        min,
        midpoint,
        steepness,
    }
}

const fn acid(initial: f64, decay_rate: f64) -> AcidCurve {
    AcidCurve {
        initial,
        decay_rate,
    }
}

static CITRUS: QualityParams = QualityParams {
    sugar: logistic(6.0, 5500.0, 900.0),
    acid: acid(3.0, 0.00025),
    cold_chain: DecayTable {
        steps: &[(7, 1.0), (14, 0.98), (30, 0.95)],
        tail_offset: 30,
        tail_rate: 0.01,
        floor: 0.8,
    },
    ambient: DecayTable {
        steps: &[(3, 1.0), (7, 0.95)],
        tail_offset: 7,
        tail_rate: 0.03,
        floor: 0.7,
    },
    freshness_window_days: 30,
    behavior: PostHarvestBehavior::NonClimacteric,
};

static STRAWBERRY: QualityParams = QualityParams {
    sugar: SugarCurve::Linear { full_at: 1500.0 },
    acid: acid(1.5, 0.0008),
    cold_chain: DecayTable {
        steps: &[(1, 1.0), (3, 0.95), (5, 0.85)],
        tail_offset: 5,
        tail_rate: 0.1,
        floor: 0.5,
    },
    ambient: DecayTable {
        steps: &[(1, 0.95), (2, 0.8)],
        tail_offset: 0,
        tail_rate: 0.2,
        floor: 0.3,
    },
    freshness_window_days: 5,
    behavior: PostHarvestBehavior::NonClimacteric,
};

static BLUEBERRY: QualityParams = QualityParams {
    sugar: logistic(8.0, 1300.0, 150.0),
    acid: acid(0.5, 0.0006),
    cold_chain: DecayTable {
        steps: &[(5, 1.0), (10, 0.95), (14, 0.9)],
        tail_offset: 14,
        tail_rate: 0.03,
        floor: 0.6,
    },
    ambient: DecayTable {
        steps: &[(3, 1.0), (5, 0.9)],
        tail_offset: 5,
        tail_rate: 0.1,
        floor: 0.4,
    },
    freshness_window_days: 10,
    behavior: PostHarvestBehavior::NonClimacteric,
};

// Refrigeration damages tomato flavor, so both tables are the same.
const TOMATO_DECAY: DecayTable = DecayTable {
    steps: &[(2, 1.0), (5, 0.95), (7, 0.9)],
    tail_offset: 7,
    tail_rate: 0.05,
    floor: 0.6,
};

static TOMATO: QualityParams = QualityParams {
    sugar: logistic(3.5, 1200.0, 200.0),
    acid: acid(0.8, 0.0006),
    cold_chain: TOMATO_DECAY,
    ambient: TOMATO_DECAY,
    freshness_window_days: 7,
    behavior: PostHarvestBehavior::Climacteric,
};

static PEACH: QualityParams = QualityParams {
    sugar: logistic(8.0, 1900.0, 200.0),
    acid: acid(1.0, 0.0008),
    cold_chain: DecayTable {
        steps: &[(5, 1.0), (10, 0.95), (14, 0.85)],
        tail_offset: 14,
        tail_rate: 0.05,
        floor: 0.5,
    },
    ambient: DecayTable {
        steps: &[(3, 1.0), (5, 0.9)],
        tail_offset: 5,
        tail_rate: 0.1,
        floor: 0.4,
    },
    freshness_window_days: 10,
    behavior: PostHarvestBehavior::Climacteric,
};

static CHERRY: QualityParams = QualityParams {
    sugar: logistic(10.0, 1400.0, 80.0),
    acid: acid(0.8, 0.0006),
    cold_chain: DecayTable {
        steps: &[(3, 1.0), (7, 0.95), (14, 0.85)],
        tail_offset: 14,
        tail_rate: 0.05,
        floor: 0.5,
    },
    ambient: DecayTable {
        steps: &[(1, 1.0), (3, 0.85)],
        tail_offset: 3,
        tail_rate: 0.15,
        floor: 0.3,
    },
    freshness_window_days: 7,
    behavior: PostHarvestBehavior::NonClimacteric,
};

static APPLE: QualityParams = QualityParams {
    sugar: logistic(10.0, 2300.0, 300.0),
    acid: acid(0.8, 0.0003),
    cold_chain: DecayTable {
        steps: &[(30, 1.0), (60, 0.98), (90, 0.95), (180, 0.9)],
        tail_offset: 180,
        tail_rate: 0.002,
        floor: 0.7,
    },
    ambient: DecayTable {
        steps: &[(7, 1.0), (14, 0.95), (30, 0.85)],
        tail_offset: 30,
        tail_rate: 0.02,
        floor: 0.5,
    },
    freshness_window_days: 60,
    behavior: PostHarvestBehavior::Climacteric,
};

static PEAR: QualityParams = QualityParams {
    sugar: logistic(10.0, 1900.0, 250.0),
    acid: acid(0.5, 0.0004),
    // cold treatment: quality held, fruit not yet ripe
    cold_chain: DecayTable {
        steps: &[(60, 1.0), (90, 0.98)],
        tail_offset: 90,
        tail_rate: 0.003,
        floor: 0.8,
    },
    // room-temperature ripening after cold treatment
    ambient: DecayTable {
        steps: &[(0, 0.8), (1, 0.85), (2, 0.9), (3, 0.95), (5, 1.0), (7, 0.9)],
        tail_offset: 7,
        tail_rate: 0.1,
        floor: 0.4,
    },
    freshness_window_days: 5,
    behavior: PostHarvestBehavior::Climacteric,
};

static MANGO: QualityParams = QualityParams {
    sugar: logistic(10.0, 3000.0, 400.0),
    acid: acid(0.6, 0.0005),
    cold_chain: DecayTable {
        steps: &[(7, 1.0), (14, 0.95)],
        tail_offset: 14,
        tail_rate: 0.03,
        floor: 0.6,
    },
    ambient: DecayTable {
        steps: &[(8, 1.0), (10, 0.9)],
        tail_offset: 10,
        tail_rate: 0.1,
        floor: 0.4,
    },
    freshness_window_days: 8,
    behavior: PostHarvestBehavior::Climacteric,
};

static PECAN: QualityParams = QualityParams {
    sugar: SugarCurve::Oil {
        min_oil: 55.0,
        max_oil: 70.0,
        shuck_split_gdd: 2600.0,
        target_gdd: 2900.0,
    },
    acid: AcidCurve::NONE,
    cold_chain: DecayTable {
        steps: &[(180, 1.0), (365, 0.98)],
        tail_offset: 365,
        tail_rate: 0.0005,
        floor: 0.85,
    },
    ambient: DecayTable {
        steps: &[(30, 1.0), (90, 0.95), (180, 0.85)],
        tail_offset: 180,
        tail_rate: 0.002,
        floor: 0.5,
    },
    freshness_window_days: 180,
    behavior: PostHarvestBehavior::NonClimacteric,
};

// ============================================================================
// Brix Modifiers
// ============================================================================

/// Brix shift from tree age; young and old trees fall short of genetics
pub fn age_modifier(tree_age_years: Option<u32>) -> f64 {
    match tree_age_years {
        None => 0.0,
        Some(0..=2) => -0.8,
        Some(3..=4) => -0.5,
        Some(5..=7) => -0.2,
        Some(8..=18) => 0.0,
        Some(19..=25) => -0.2,
        Some(_) => -0.3,
    }
}

/// Parabolic Brix penalty for distance from the peak in GDD.
///
/// No penalty within half the half-width; capped at 1.5 × the max penalty.
pub fn timing_modifier(current_gdd: f64, peak_gdd: f64) -> f64 {
    let distance = (current_gdd - peak_gdd).abs();
    if distance <= TIMING_HALF_WIDTH_GDD / 2.0 {
        return 0.0;
    }
    let penalty = TIMING_MAX_PENALTY * (distance / TIMING_HALF_WIDTH_GDD).powi(2);
    -penalty.min(TIMING_MAX_PENALTY * TIMING_PENALTY_CAP)
}

/// Brix adjustments applied on top of the curve
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BrixModifiers {
    pub rootstock: f64,
    pub age: f64,
    pub timing: f64,
}

impl BrixModifiers {
    pub fn total(&self) -> f64 {
        self.rootstock + self.age + self.timing
    }
}

// ============================================================================
// Assessment
// ============================================================================

/// Everything needed to assess quality at one moment
#[derive(Debug, Clone, PartialEq)]
pub struct QualityInputs {
    pub current_gdd: f64,
    pub peak_gdd: f64,
    pub ceiling: f64,
    pub status: SeasonStatus,
    /// Before maturity of the current season
    pub developing: bool,
    pub rootstock_modifier: f64,
    pub tree_age_years: Option<u32>,
    pub days_since_harvest: Option<u32>,
    pub cold_chain: bool,
    pub confidence: f64,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Evaluate the family's curves and apply Brix modifiers
pub fn assess(family: CropFamily, inputs: &QualityInputs) -> QualityPrediction {
    let ceiling = if inputs.ceiling.is_finite() && inputs.ceiling > 0.0 {
        inputs.ceiling
    } else {
        DEFAULT_BRIX_CEILING
    };

    let modifiers = if family.is_nut() {
        BrixModifiers::default()
    } else {
        BrixModifiers {
            rootstock: inputs.rootstock_modifier,
            age: age_modifier(inputs.tree_age_years),
            timing: timing_modifier(inputs.current_gdd, inputs.peak_gdd),
        }
    };
    let peak_modifiers = BrixModifiers {
        timing: 0.0,
        ..modifiers
    };

    let sugar = (family.sugar(inputs.current_gdd, ceiling) + modifiers.total()).max(0.0);
    let acid = family.acid(inputs.current_gdd);
    let peak_sugar = (family.sugar(inputs.peak_gdd, ceiling) + peak_modifiers.total()).max(0.0);
    let peak_acid = family.acid(inputs.peak_gdd);

    let ratio = (acid > MIN_ACID_FOR_RATIO).then(|| round_to(sugar / acid, 1));

    let freshness = inputs
        .days_since_harvest
        .map(|days| family.freshness_decay(days, inputs.cold_chain));

    let message = if family.is_nut() {
        format!("Oil content: {:.0}%", sugar)
    } else {
        match inputs.status {
            SeasonStatus::AtPeak => "At peak sweetness!".to_string(),
            SeasonStatus::InOptimalWindow => "Excellent - in optimal window".to_string(),
            SeasonStatus::Harvestable | SeasonStatus::PastOptimal => "Good - ready to eat".to_string(),
            SeasonStatus::OffSeason if inputs.developing => "Developing".to_string(),
            SeasonStatus::OffSeason => "Not in season".to_string(),
        }
    };

    QualityPrediction {
        predicted_sugar: round_to(sugar, 1),
        predicted_acid: round_to(acid, 2),
        ratio,
        brima: round_to(sugar - 4.0 * acid, 1),
        unit: family.unit(),
        peak_sugar: round_to(peak_sugar, 1),
        peak_acid: round_to(peak_acid, 2),
        delivered_sugar: freshness.map(|f| round_to(sugar * f, 1)),
        freshness_multiplier: freshness,
        post_harvest: family.post_harvest_behavior(),
        confidence: inputs.confidence,
        message,
    }
}
