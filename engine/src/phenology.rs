//! Phenology resolution: reference dates and GDD targets
//!
//! Research data is preferred over crop-level defaults, and crop-level
//! defaults over the generic target. Each step down is explicit and
//! recorded in [`TargetSource`].

use chrono::{Datelike, Duration, NaiveDate};
use tracing::{debug, info, warn};

use crate::calendar::doy_to_date;
use crate::catalog::ResearchCatalog;
use crate::gdd::is_usable_rate;
use crate::models::{
    CultivarResearch, GddTarget, GddTargetError, HistoricalWindow, PhenologyReference,
    RegionalBloomData, SeasonSelection, TargetSource,
};
use crate::types::RegionClass;

/// Longest span from bloom to the end of harvest that a season may occupy
pub const MAX_DEVELOPMENT_DAYS: i64 = 550;

/// Daily GDD used to size development spans when nothing better is known
pub const DEFAULT_SEASONAL_GDD: f64 = 15.0;

/// Days past the projected window end before a season counts as over
pub const DEFAULT_GRACE_DAYS: i64 = 30;

/// Bloom date used for crops without a profile
pub const GENERIC_BLOOM: (u32, u32) = (4, 1);

/// Maturity used for a cultivar with no GDD data on an unknown crop
const FALLBACK_MATURITY_GDD: f64 = 1000.0;
const PEAK_FROM_MATURITY_PCT: f64 = 115.0;
const PLANTING_WINDOW_FRACTION: f64 = 0.12;
const DEFAULT_WINDOW_FRACTION: f64 = 0.15;
const MIN_REGIONAL_WINDOW_GDD: f64 = 100.0;

// ============================================================================
// Crop Profiles
// ============================================================================

/// Crop-level defaults used when cultivar research is missing
#[derive(Debug, Clone, Copy)]
pub struct CropProfile {
    pub crop_id: &'static str,
    pub target: GddTarget,
    /// Typical bloom (month, day) outside the listed region classes
    pub bloom: (u32, u32),
    pub bloom_by_class: &'static [(RegionClass, (u32, u32))],
    /// Typical peak Brix, or oil percentage for nuts
    pub sugar_ceiling: f64,
    /// Held in storage after harvest; never rolled to next season
    pub long_storage: bool,
}

impl CropProfile {
    /// Typical bloom (month, day) for a region class
    pub fn typical_bloom(&self, class: RegionClass) -> (u32, u32) {
        self.bloom_by_class
            .iter()
            .find(|(c, _)| *c == class)
            .map(|(_, md)| *md)
            .unwrap_or(self.bloom)
    }
}

const fn target(base: f64, maturity: f64, peak: f64, window: f64) -> GddTarget {
    GddTarget {
        base_temp: base,
        max_temp: None,
        gdd_to_maturity: maturity,
        gdd_to_peak: peak,
        gdd_window: window,
    }
}

static CROP_PROFILES: &[CropProfile] = &[
    CropProfile {
        crop_id: "navel_orange",
        target: target(55.0, 5100.0, 6100.0, 3500.0),
        bloom: (3, 10),
        bloom_by_class: &[(RegionClass::South, (3, 15))],
        sugar_ceiling: 14.0,
        long_storage: false,
    },
    CropProfile {
        crop_id: "valencia",
        target: target(55.0, 8000.0, 9000.0, 2200.0),
        bloom: (3, 1),
        bloom_by_class: &[],
        sugar_ceiling: 13.0,
        long_storage: false,
    },
    CropProfile {
        crop_id: "grapefruit",
        target: target(55.0, 5500.0, 7100.0, 4000.0),
        bloom: (3, 5),
        bloom_by_class: &[(RegionClass::South, (3, 1))],
        sugar_ceiling: 11.0,
        long_storage: false,
    },
    CropProfile {
        crop_id: "tangerine",
        target: target(55.0, 5300.0, 5700.0, 900.0),
        bloom: (3, 15),
        bloom_by_class: &[(RegionClass::South, (3, 20))],
        sugar_ceiling: 13.0,
        long_storage: false,
    },
    CropProfile {
        crop_id: "satsuma",
        target: target(55.0, 4600.0, 5100.0, 700.0),
        bloom: (3, 10),
        bloom_by_class: &[(RegionClass::South, (3, 15))],
        sugar_ceiling: 12.0,
        long_storage: false,
    },
    CropProfile {
        crop_id: "pomegranate",
        target: target(50.0, 3800.0, 4500.0, 1000.0),
        bloom: (4, 20),
        bloom_by_class: &[(RegionClass::West, (4, 15))],
        sugar_ceiling: 17.0,
        long_storage: false,
    },
    CropProfile {
        crop_id: "peach",
        target: target(45.0, 1800.0, 2000.0, 150.0),
        bloom: (4, 1),
        bloom_by_class: &[(RegionClass::South, (3, 1))],
        sugar_ceiling: 14.0,
        long_storage: false,
    },
    CropProfile {
        crop_id: "sweet_cherry",
        target: target(40.0, 1400.0, 1550.0, 100.0),
        bloom: (4, 15),
        bloom_by_class: &[(RegionClass::West, (4, 1))],
        sugar_ceiling: 20.0,
        long_storage: false,
    },
    CropProfile {
        crop_id: "tart_cherry",
        target: target(39.2, 1000.0, 1100.0, 80.0),
        bloom: (5, 1),
        bloom_by_class: &[(RegionClass::North, (5, 5))],
        sugar_ceiling: 16.0,
        long_storage: false,
    },
    CropProfile {
        crop_id: "cherry",
        target: target(40.0, 1100.0, 1400.0, 600.0),
        bloom: (4, 15),
        bloom_by_class: &[(RegionClass::West, (4, 1))],
        sugar_ceiling: 20.0,
        long_storage: false,
    },
    CropProfile {
        crop_id: "apple",
        target: target(43.0, 2200.0, 2500.0, 200.0),
        bloom: (4, 15),
        bloom_by_class: &[
            (RegionClass::North, (5, 1)),
            (RegionClass::West, (4, 20)),
        ],
        sugar_ceiling: 15.0,
        long_storage: true,
    },
    CropProfile {
        crop_id: "pear",
        target: target(40.0, 2400.0, 2700.0, 800.0),
        bloom: (4, 10),
        bloom_by_class: &[(RegionClass::West, (4, 1))],
        sugar_ceiling: 14.0,
        long_storage: true,
    },
    CropProfile {
        crop_id: "strawberry",
        target: target(50.0, 700.0, 1300.0, 1100.0),
        bloom: (4, 1),
        bloom_by_class: &[(RegionClass::South, (10, 1))],
        sugar_ceiling: 10.0,
        long_storage: false,
    },
    CropProfile {
        crop_id: "blueberry",
        target: target(45.0, 1200.0, 1400.0, 100.0),
        bloom: (5, 1),
        bloom_by_class: &[(RegionClass::South, (3, 1))],
        sugar_ceiling: 14.0,
        long_storage: false,
    },
    CropProfile {
        crop_id: "mango",
        target: target(60.0, 2800.0, 3200.0, 300.0),
        bloom: (3, 1),
        bloom_by_class: &[(RegionClass::South, (2, 15))],
        sugar_ceiling: 18.0,
        long_storage: false,
    },
    CropProfile {
        crop_id: "pecan",
        target: target(65.0, 2600.0, 2900.0, 400.0),
        bloom: (4, 15),
        bloom_by_class: &[(RegionClass::South, (4, 1))],
        sugar_ceiling: 70.0,
        long_storage: false,
    },
    CropProfile {
        crop_id: "tomato",
        target: GddTarget {
            base_temp: 50.0,
            max_temp: Some(86.0),
            gdd_to_maturity: 2400.0,
            gdd_to_peak: 2600.0,
            gdd_window: 2400.0,
        },
        bloom: (4, 15),
        bloom_by_class: &[(RegionClass::South, (9, 1))],
        sugar_ceiling: 7.0,
        long_storage: false,
    },
];

/// Look up crop-level defaults
pub fn crop_profile(crop_id: &str) -> Option<&'static CropProfile> {
    CROP_PROFILES.iter().find(|p| p.crop_id == crop_id)
}

/// Every crop with a profile
pub fn known_crops() -> impl Iterator<Item = &'static str> {
    CROP_PROFILES.iter().map(|p| p.crop_id)
}

// ============================================================================
// Resolver
// ============================================================================

/// Tunable constants for reference selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverSettings {
    pub grace_days: i64,
    pub default_seasonal_gdd: f64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            grace_days: DEFAULT_GRACE_DAYS,
            default_seasonal_gdd: DEFAULT_SEASONAL_GDD,
        }
    }
}

/// How the harvest window width is derived
#[derive(Debug, Clone, Copy, PartialEq)]
enum WindowMode {
    Planting,
    Regional { harvest_days: Option<u32>, daily_gdd: Option<f64> },
    Default,
}

struct ResolvedTarget {
    target: GddTarget,
    source: TargetSource,
}

/// Turns crop, cultivar and region into a [`PhenologyReference`]
pub struct PhenologyResolver<'a, C: ?Sized> {
    catalog: &'a C,
    settings: ResolverSettings,
}

impl<'a, C: ResearchCatalog + ?Sized> PhenologyResolver<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self::with_settings(catalog, ResolverSettings::default())
    }

    pub fn with_settings(catalog: &'a C, settings: ResolverSettings) -> Self {
        Self { catalog, settings }
    }

    /// Resolve the season relevant on `today` from bloom statistics.
    ///
    /// Regional bloom data wins over the crop's typical bloom for the
    /// region class, which wins over the generic April 1.
    pub fn resolve(
        &self,
        crop_id: &str,
        cultivar_id: Option<&str>,
        region_id: &str,
        today: NaiveDate,
    ) -> PhenologyReference {
        let profile = crop_profile(crop_id);
        let cultivar = cultivar_id.and_then(|id| self.catalog.get_cultivar(id));
        let regional = cultivar_id.and_then(|id| self.catalog.get_regional_data(id, region_id));

        let mode = match regional {
            Some(data) => WindowMode::Regional {
                harvest_days: data.historical_harvest_days(),
                daily_gdd: data.avg_gdd_per_day_bloom_to_harvest,
            },
            None => WindowMode::Default,
        };
        let resolved = self.resolve_target(crop_id, profile, cultivar, regional.is_some(), mode);

        let seasonal_daily_gdd = self.seasonal_rate(regional, region_id);
        let long_storage = profile.is_some_and(|p| p.long_storage);
        let span = development_span(
            &resolved.target,
            seasonal_daily_gdd,
            if long_storage { 0 } else { self.settings.grace_days },
        );

        let class = self
            .catalog
            .get_region(region_id)
            .map(|r| r.class())
            .unwrap_or_default();
        let bloom_doy = regional.and_then(RegionalBloomData::bloom_doy);
        let bloom_for_year = |year: i32| -> Option<NaiveDate> {
            match (bloom_doy, profile) {
                (Some(doy), _) => doy_to_date(doy, year),
                (None, Some(p)) => {
                    let (month, day) = p.typical_bloom(class);
                    NaiveDate::from_ymd_opt(year, month, day)
                }
                (None, None) => NaiveDate::from_ymd_opt(year, GENERIC_BLOOM.0, GENERIC_BLOOM.1),
            }
        };

        let (reference_date, season) = select_reference(bloom_for_year, today, span, long_storage);
        debug!(
            crop_id,
            region_id,
            %reference_date,
            ?season,
            span_days = span,
            "Resolved bloom reference"
        );

        let historical_window = regional.and_then(|data| {
            Some(HistoricalWindow {
                harvest_start_doy: data.historical_harvest_start_doy?,
                harvest_end_doy: data.historical_harvest_end_doy?,
                peak_start_doy: data.historical_peak_start_doy,
                peak_end_doy: data.historical_peak_end_doy,
            })
        });

        PhenologyReference {
            reference_date,
            crop_id: crop_id.to_string(),
            cultivar_id: cultivar_id.map(str::to_string),
            region_id: region_id.to_string(),
            source_gdd_target: resolved.target,
            source: resolved.source,
            season,
            historical_window,
            regional_daily_gdd: regional.and_then(|d| d.avg_gdd_per_day_bloom_to_harvest),
            seasonal_daily_gdd,
            days_to_maturity: cultivar.and_then(|c| c.days_to_maturity),
            long_storage,
        }
    }

    /// Resolve a grower-supplied planting date, used as-is
    pub fn resolve_planting(
        &self,
        crop_id: &str,
        cultivar_id: Option<&str>,
        region_id: &str,
        planting_date: NaiveDate,
        today: NaiveDate,
    ) -> PhenologyReference {
        let profile = crop_profile(crop_id);
        let cultivar = cultivar_id.and_then(|id| self.catalog.get_cultivar(id));
        let resolved = self.resolve_target(crop_id, profile, cultivar, false, WindowMode::Planting);

        if planting_date > today {
            debug!(crop_id, %planting_date, "Planting date is in the future");
        }

        PhenologyReference {
            reference_date: planting_date,
            crop_id: crop_id.to_string(),
            cultivar_id: cultivar_id.map(str::to_string),
            region_id: region_id.to_string(),
            source_gdd_target: resolved.target,
            source: resolved.source,
            season: SeasonSelection::Planted,
            historical_window: None,
            regional_daily_gdd: None,
            seasonal_daily_gdd: self.seasonal_rate(None, region_id),
            days_to_maturity: cultivar.and_then(|c| c.days_to_maturity),
            long_storage: profile.is_some_and(|p| p.long_storage),
        }
    }

    fn seasonal_rate(&self, regional: Option<&RegionalBloomData>, region_id: &str) -> f64 {
        regional
            .and_then(|d| d.avg_gdd_per_day_bloom_to_harvest)
            .or_else(|| {
                self.catalog
                    .get_region(region_id)
                    .and_then(|r| r.seasonal_daily_gdd)
            })
            .filter(|rate| is_usable_rate(*rate))
            .unwrap_or(self.settings.default_seasonal_gdd)
    }

    fn resolve_target(
        &self,
        crop_id: &str,
        profile: Option<&CropProfile>,
        cultivar: Option<&CultivarResearch>,
        has_regional: bool,
        mode: WindowMode,
    ) -> ResolvedTarget {
        if let Some(cultivar) = cultivar {
            match cultivar_target(cultivar, profile, mode) {
                Ok(target) => {
                    let source = match mode {
                        WindowMode::Planting => TargetSource::GrowerPlanting,
                        _ if has_regional => TargetSource::CultivarRegional,
                        _ => TargetSource::CultivarOnly,
                    };
                    return ResolvedTarget { target, source };
                }
                Err(e) => {
                    warn!(
                        cultivar_id = %cultivar.cultivar_id,
                        error = %e,
                        "Invalid cultivar GDD targets, using crop defaults"
                    );
                }
            }
        }

        match profile {
            Some(p) => ResolvedTarget {
                target: p.target,
                source: TargetSource::CropDefault,
            },
            None => {
                info!(crop_id, "No crop profile, using generic GDD target");
                ResolvedTarget {
                    target: GddTarget::GENERIC,
                    source: TargetSource::GenericFallback,
                }
            }
        }
    }
}

/// Build a target from cultivar genetics
fn cultivar_target(
    cultivar: &CultivarResearch,
    profile: Option<&CropProfile>,
    mode: WindowMode,
) -> Result<GddTarget, GddTargetError> {
    let maturity = cultivar
        .gdd_to_maturity
        .or_else(|| profile.map(|p| p.target.gdd_to_maturity))
        .unwrap_or(FALLBACK_MATURITY_GDD);
    let peak = cultivar
        .gdd_to_peak
        .unwrap_or_else(|| (maturity * PEAK_FROM_MATURITY_PCT / 100.0).floor());

    let window = match mode {
        WindowMode::Planting => peak * PLANTING_WINDOW_FRACTION,
        WindowMode::Regional {
            harvest_days: Some(days),
            daily_gdd,
        } => {
            let rate = daily_gdd.unwrap_or(DEFAULT_SEASONAL_GDD);
            (f64::from(days) * rate * 0.5).max(MIN_REGIONAL_WINDOW_GDD)
        }
        WindowMode::Regional { .. } | WindowMode::Default => peak * DEFAULT_WINDOW_FRACTION,
    };

    let max_temp = cultivar
        .gdd_max_temp
        .or_else(|| profile.and_then(|p| p.target.max_temp));

    GddTarget::new(cultivar.gdd_base_temp, maturity, peak, window)?.with_max_temp(max_temp)
}

/// Days from reference to the end of harvest plus grace, capped
pub fn development_span(target: &GddTarget, seasonal_daily_gdd: f64, grace_days: i64) -> i64 {
    let rate = if is_usable_rate(seasonal_daily_gdd) {
        seasonal_daily_gdd
    } else {
        DEFAULT_SEASONAL_GDD
    };
    let days = (target.window_end_gdd() / rate).ceil() as i64 + grace_days.max(0);
    days.min(MAX_DEVELOPMENT_DAYS)
}

/// Choose the reference bloom for `today`.
///
/// Candidates are the blooms of the two previous years and the current
/// year that are not after today. The oldest one whose span has not
/// elapsed wins, so a long season still being harvested keeps its bloom.
/// When none is active, storage crops keep the latest bloom and everything
/// else moves to the next bloom after today.
fn select_reference<F>(
    bloom_for_year: F,
    today: NaiveDate,
    span_days: i64,
    long_storage: bool,
) -> (NaiveDate, SeasonSelection)
where
    F: Fn(i32) -> Option<NaiveDate>,
{
    let year = today.year();
    let past: Vec<NaiveDate> = (year - 2..=year)
        .filter_map(&bloom_for_year)
        .filter(|bloom| *bloom <= today)
        .collect();

    if let Some(active) = past
        .iter()
        .find(|bloom| today <= **bloom + Duration::days(span_days))
    {
        return (*active, SeasonSelection::InProgress);
    }

    if long_storage {
        if let Some(latest) = past.last() {
            return (*latest, SeasonSelection::Holding);
        }
    }

    let upcoming = (year..=year + 1)
        .filter_map(&bloom_for_year)
        .find(|bloom| *bloom > today);
    match upcoming {
        Some(bloom) => {
            debug!(%bloom, "All recent seasons have lapsed, using next bloom");
            (bloom, SeasonSelection::Upcoming)
        }
        None => {
            warn!(%today, "No bloom date could be built, anchoring on today");
            (today, SeasonSelection::Upcoming)
        }
    }
}
