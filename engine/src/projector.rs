//! Harvest window projection
//!
//! Turns a reference date and GDD target into the five window dates, either
//! by walking observed and forecast heat or by dividing by an average daily
//! rate. Regional day-of-year history, when present, replaces the GDD
//! arithmetic entirely.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::calendar::{doy_to_date, resolve_season_year, same_day_next_year, shift};
use crate::gdd::{is_usable_rate, offset_days};
use crate::models::{
    DailyObservation, ForecastDay, GddTarget, HarvestWindowPrediction, HistoricalWindow,
    PhenologyReference, ProjectionBasis, SeasonFlags, SeasonStatus,
};
use crate::phenology::DEFAULT_GRACE_DAYS;

/// Days either side of the peak center that count as "at peak"
pub const AT_PEAK_TOLERANCE_DAYS: i64 = 3;

/// Days to maturity assumed when no rate and no cultivar figure exist
pub const DEFAULT_DAYS_TO_MATURITY: i64 = 120;

/// Offsets after maturity used when no usable rate exists
const FIXED_OFFSETS: [i64; 5] = [0, 15, 30, 45, 60];

const MAX_ROLL_FORWARD: usize = 3;

/// Where the daily heat for a projection comes from
#[derive(Debug, Clone, Copy)]
pub enum RateSource<'a> {
    /// Real observations from the reference date onward, then forecast
    /// days, then `forward_rate` beyond the last known day
    Observed {
        observations: &'a [DailyObservation],
        forecast: &'a [ForecastDay],
        forward_rate: f64,
    },
    /// A single average rate from the reference date
    Climatology { avg_daily_gdd: f64 },
}

/// When a lapsed season is replaced by the next one
///
/// Tunable policy, not an invariant: storage crops never roll, everything
/// else rolls once today is `grace_days` past the window end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollForwardPolicy {
    pub grace_days: i64,
    pub long_storage: bool,
}

impl Default for RollForwardPolicy {
    fn default() -> Self {
        Self {
            grace_days: DEFAULT_GRACE_DAYS,
            long_storage: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projector {
    pub policy: RollForwardPolicy,
    pub fallback_days_to_maturity: i64,
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(RollForwardPolicy::default())
    }
}

impl Projector {
    pub fn new(policy: RollForwardPolicy) -> Self {
        Self {
            policy,
            fallback_days_to_maturity: DEFAULT_DAYS_TO_MATURITY,
        }
    }

    /// Projector configured for a resolved reference
    pub fn for_reference(reference: &PhenologyReference, grace_days: i64) -> Self {
        Self {
            policy: RollForwardPolicy {
                grace_days,
                long_storage: reference.long_storage,
            },
            fallback_days_to_maturity: reference
                .days_to_maturity
                .map(i64::from)
                .unwrap_or(DEFAULT_DAYS_TO_MATURITY),
        }
    }

    /// Historical lookup when the reference carries a window, GDD projection otherwise
    pub fn project_reference(
        &self,
        reference: &PhenologyReference,
        rate: &RateSource<'_>,
        today: NaiveDate,
    ) -> HarvestWindowPrediction {
        if let Some(window) = reference.historical_window {
            if let Some(prediction) = self.project_historical(&window, reference.reference_date, today) {
                return prediction;
            }
            debug!(
                crop_id = %reference.crop_id,
                "Historical window could not be mapped to dates, projecting from GDD"
            );
        }
        self.project(
            reference.reference_date,
            &reference.source_gdd_target,
            rate,
            today,
        )
    }

    /// Project window dates from GDD thresholds
    pub fn project(
        &self,
        reference_date: NaiveDate,
        target: &GddTarget,
        rate: &RateSource<'_>,
        today: NaiveDate,
    ) -> HarvestWindowPrediction {
        let thresholds = target.thresholds();
        let projected = match rate {
            RateSource::Observed {
                observations,
                forecast,
                forward_rate,
            } => walk_observed(
                reference_date,
                target,
                &thresholds,
                observations,
                forecast,
                *forward_rate,
            ),
            RateSource::Climatology { avg_daily_gdd } => {
                climatology_dates(reference_date, &thresholds, *avg_daily_gdd)
            }
        };

        let (mut dates, basis) = match projected {
            Some(dates) => (dates, ProjectionBasis::GddProjection),
            None => {
                debug!(%reference_date, "No usable GDD rate, using fixed offsets");
                (self.fixed_offset_dates(reference_date), ProjectionBasis::FixedOffsets)
            }
        };
        enforce_order(&mut dates);

        let mut reference_date = reference_date;
        let mut showing_next_season = false;
        if !self.policy.long_storage {
            for _ in 0..MAX_ROLL_FORWARD {
                if today <= shift(dates[4], self.policy.grace_days) {
                    break;
                }
                let next = same_day_next_year(reference_date);
                let delta = (next - reference_date).num_days();
                for date in dates.iter_mut() {
                    *date = shift(*date, delta);
                }
                reference_date = next;
                showing_next_season = true;
            }
            if showing_next_season {
                info!(%reference_date, "Season lapsed, showing next season");
            }
        }

        build_prediction(reference_date, dates, today, showing_next_season, basis)
    }

    /// Map regional day-of-year history onto the season relevant today.
    ///
    /// Returns `None` if a day of year cannot be turned into a date.
    pub fn project_historical(
        &self,
        window: &HistoricalWindow,
        reference_date: NaiveDate,
        today: NaiveDate,
    ) -> Option<HarvestWindowPrediction> {
        let years = resolve_season_year(window.harvest_start_doy, window.harvest_end_doy, today);
        let start = doy_to_date(window.harvest_start_doy, years.start_year)?;
        let end = doy_to_date(window.harvest_end_doy, years.end_year)?;

        // Inside a wrapping season, days at or after the start belong to the
        // start year and the rest to the end year.
        let year_of = |doy: i32| {
            if doy >= window.harvest_start_doy {
                years.start_year
            } else {
                years.end_year
            }
        };

        let (optimal_start, peak_center, optimal_end) = match (window.peak_start_doy, window.peak_end_doy) {
            (Some(peak_start), Some(peak_end)) => {
                let peak_start = doy_to_date(peak_start, year_of(peak_start))?.clamp(start, end);
                let peak_end = doy_to_date(peak_end, year_of(peak_end))?
                    .clamp(start, end)
                    .max(peak_start);
                let half = (peak_end - peak_start).num_days() / 2;
                (peak_start, shift(peak_start, half), peak_end)
            }
            _ => {
                let days = (end - start).num_days();
                (
                    shift(start, days / 4),
                    shift(start, days / 2),
                    shift(end, -(days / 4)),
                )
            }
        };

        let mut dates = [start, optimal_start, peak_center, optimal_end, end];
        enforce_order(&mut dates);
        Some(build_prediction(
            reference_date,
            dates,
            today,
            false,
            ProjectionBasis::HistoricalLookup,
        ))
    }

    fn fixed_offset_dates(&self, reference_date: NaiveDate) -> [NaiveDate; 5] {
        let maturity = shift(reference_date, self.fallback_days_to_maturity.max(0));
        FIXED_OFFSETS.map(|offset| shift(maturity, offset))
    }
}

fn climatology_dates(
    reference_date: NaiveDate,
    thresholds: &[f64; 5],
    avg_daily_gdd: f64,
) -> Option<[NaiveDate; 5]> {
    if !is_usable_rate(avg_daily_gdd) {
        return None;
    }
    Some(thresholds.map(|gdd| shift(reference_date, offset_days(gdd, avg_daily_gdd))))
}

/// Walk observed then forecast heat, extrapolating with `forward_rate`.
///
/// Forecast days only count after the last observed day. A threshold
/// reached by the series maps to the day it was crossed.
fn walk_observed(
    reference_date: NaiveDate,
    target: &GddTarget,
    thresholds: &[f64; 5],
    observations: &[DailyObservation],
    forecast: &[ForecastDay],
    forward_rate: f64,
) -> Option<[NaiveDate; 5]> {
    let mut days: Vec<(NaiveDate, f64)> = observations
        .iter()
        .filter(|obs| obs.date >= reference_date)
        .map(|obs| (obs.date, obs.gdd(target.base_temp, target.max_temp)))
        .collect();
    days.sort_by_key(|(date, _)| *date);

    let last_observed = days.last().map(|(date, _)| *date);
    let mut ahead: Vec<(NaiveDate, f64)> = forecast
        .iter()
        .filter(|day| day.date >= reference_date && last_observed.map_or(true, |last| day.date > last))
        .map(|day| (day.date, day.projected_gdd(target.base_temp, target.max_temp)))
        .collect();
    ahead.sort_by_key(|(date, _)| *date);
    days.extend(ahead);

    let mut total = 0.0;
    let series: Vec<(NaiveDate, f64)> = days
        .into_iter()
        .map(|(date, gdd)| {
            total += gdd;
            (date, total)
        })
        .collect();
    let anchor = series.last().map(|(date, _)| *date).unwrap_or(reference_date);

    let mut dates = [reference_date; 5];
    for (slot, threshold) in dates.iter_mut().zip(thresholds.iter()) {
        if let Some((date, _)) = series.iter().find(|(_, cumulative)| *cumulative >= *threshold) {
            *slot = *date;
            continue;
        }
        if !is_usable_rate(forward_rate) {
            return None;
        }
        *slot = shift(anchor, offset_days(threshold - total, forward_rate));
    }
    Some(dates)
}

/// Running maximum so the five dates never go backwards
fn enforce_order(dates: &mut [NaiveDate; 5]) {
    for i in 1..dates.len() {
        if dates[i] < dates[i - 1] {
            dates[i] = dates[i - 1];
        }
    }
}

pub fn evaluate_flags(dates: &[NaiveDate; 5], today: NaiveDate) -> SeasonFlags {
    let [maturity, optimal_start, peak, optimal_end, window_end] = *dates;
    let harvestable = maturity <= today && today <= window_end;
    SeasonFlags {
        harvestable,
        in_optimal_window: harvestable && optimal_start <= today && today <= optimal_end,
        at_peak: harvestable && (today - peak).num_days().abs() <= AT_PEAK_TOLERANCE_DAYS,
        past_optimal: optimal_end < today && today <= window_end,
        off_season: !harvestable,
    }
}

/// Share of the harvest window elapsed, rounded to one decimal
pub fn progress_pct(maturity: NaiveDate, window_end: NaiveDate, today: NaiveDate) -> f64 {
    if today < maturity {
        return 0.0;
    }
    if today > window_end {
        return 100.0;
    }
    let total = (window_end - maturity).num_days();
    if total == 0 {
        return 100.0;
    }
    let elapsed = (today - maturity).num_days();
    (elapsed as f64 / total as f64 * 1000.0).round() / 10.0
}

fn build_prediction(
    reference_date: NaiveDate,
    dates: [NaiveDate; 5],
    today: NaiveDate,
    showing_next_season: bool,
    basis: ProjectionBasis,
) -> HarvestWindowPrediction {
    let flags = evaluate_flags(&dates, today);
    HarvestWindowPrediction {
        reference_date,
        maturity_date: dates[0],
        optimal_start_date: dates[1],
        peak_center_date: dates[2],
        optimal_end_date: dates[3],
        window_end_date: dates[4],
        progress_pct: progress_pct(dates[0], dates[4], today),
        status: SeasonStatus::from_flags(&flags),
        flags,
        showing_next_season,
        basis,
    }
}
