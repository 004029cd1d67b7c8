//! Growing degree day accumulation
//!
//! Observations passed to these functions must already be complete: records
//! with missing temperatures are data gaps and are filtered out by the
//! weather source (see [`DailyObservation::from_partial`]). Nothing here
//! fails at runtime.

use chrono::NaiveDate;

use crate::models::{AccumulationState, DailyObservation, PaceStatus, SeasonPace, SeasonSummary};

/// Base temperature used for season summaries
pub const SUMMARY_BASE_TEMP: f64 = 55.0;

/// Slowest daily rate worth projecting with; anything lower is treated as no rate
pub const MIN_USABLE_DAILY_GDD: f64 = 0.1;

/// Furthest ahead a rate-based projection may place a date
pub const MAX_PROJECTION_DAYS: i64 = 730;

const FREEZING_F: f64 = 32.0;
const CHILL_CEILING_F: f64 = 45.0;
const CHILL_HOURS_PER_DAY: u32 = 8;

/// Pace deviation beyond which a season counts as ahead or behind
const PACE_TOLERANCE_PCT: f64 = 10.0;

/// Heat units for one day.
///
/// The high is capped at `max_temp` (modified 86/50 method) and the low is
/// floored at `base_temp`, so the result is never negative.
pub fn daily_gdd(temp_high: f64, temp_low: f64, base_temp: f64, max_temp: Option<f64>) -> f64 {
    let high = match max_temp {
        Some(cap) => temp_high.min(cap),
        None => temp_high,
    };
    let low = temp_low.max(base_temp);
    let gdd = (high + low) / 2.0 - base_temp;
    if gdd.is_nan() {
        return 0.0;
    }
    gdd.max(0.0)
}

/// Sum of daily GDD over a sequence; 0 for an empty sequence
pub fn cumulative_gdd<'a, I>(observations: I, base_temp: f64, max_temp: Option<f64>) -> f64
where
    I: IntoIterator<Item = &'a DailyObservation>,
{
    observations
        .into_iter()
        .map(|obs| obs.gdd(base_temp, max_temp))
        .sum()
}

/// Fold observations into an [`AccumulationState`]
pub fn accumulate(
    observations: &[DailyObservation],
    base_temp: f64,
    max_temp: Option<f64>,
) -> AccumulationState {
    observations
        .iter()
        .fold(AccumulationState::empty(), |mut state, obs| {
            state.cumulative_gdd += obs.gdd(base_temp, max_temp);
            state.observation_count += 1;
            state.last_date = match state.last_date {
                Some(last) if last >= obs.date => Some(last),
                _ => Some(obs.date),
            };
            state
        })
}

/// Days until `target_gdd` is reached at a constant rate.
///
/// `Some(0)` when already reached, `None` when the rate is below
/// [`MIN_USABLE_DAILY_GDD`].
pub fn days_to_target(current_gdd: f64, target_gdd: f64, avg_daily_gdd: f64) -> Option<i64> {
    if current_gdd >= target_gdd {
        return Some(0);
    }
    if !is_usable_rate(avg_daily_gdd) {
        return None;
    }
    Some(((target_gdd - current_gdd) / avg_daily_gdd).floor() as i64)
}

/// True for a finite rate at or above [`MIN_USABLE_DAILY_GDD`]
pub fn is_usable_rate(avg_daily_gdd: f64) -> bool {
    avg_daily_gdd.is_finite() && avg_daily_gdd >= MIN_USABLE_DAILY_GDD
}

/// Whole days to accumulate `gdd` at `rate`, within `[0, MAX_PROJECTION_DAYS]`
pub fn offset_days(gdd: f64, rate: f64) -> i64 {
    let days = (gdd / rate).floor();
    if days.is_nan() {
        return 0;
    }
    (days.clamp(0.0, MAX_PROJECTION_DAYS as f64)) as i64
}

/// Compare accumulated heat with what a normal season would have by now
pub fn compare_to_normal(
    current_gdd: f64,
    days_since_reference: i64,
    expected_daily_gdd: f64,
) -> SeasonPace {
    let expected_gdd = days_since_reference.max(0) as f64 * expected_daily_gdd.max(0.0);
    let deviation_gdd = current_gdd - expected_gdd;
    let deviation_pct = if expected_gdd > 0.0 {
        deviation_gdd / expected_gdd * 100.0
    } else {
        0.0
    };

    let (status, message) = if deviation_pct > PACE_TOLERANCE_PCT {
        (
            PaceStatus::Ahead,
            format!("Season running {:.0}% ahead of normal", deviation_pct),
        )
    } else if deviation_pct < -PACE_TOLERANCE_PCT {
        (
            PaceStatus::Behind,
            format!("Season running {:.0}% behind normal", deviation_pct.abs()),
        )
    } else {
        (PaceStatus::Normal, "Season tracking normal".to_string())
    };

    SeasonPace {
        status,
        current_gdd,
        expected_gdd,
        deviation_gdd,
        deviation_pct,
        message,
    }
}

/// Summarize the weather between `start` and `end` inclusive.
///
/// Returns `None` when no observation falls in the range.
pub fn summarize_season(
    observations: &[DailyObservation],
    start: NaiveDate,
    end: NaiveDate,
) -> Option<SeasonSummary> {
    let in_range: Vec<&DailyObservation> = observations
        .iter()
        .filter(|obs| obs.date >= start && obs.date <= end)
        .collect();
    if in_range.is_empty() {
        return None;
    }

    let count = in_range.len();
    let total_gdd = cumulative_gdd(in_range.iter().copied(), SUMMARY_BASE_TEMP, None);
    let avg_high = in_range.iter().map(|o| o.temp_high).sum::<f64>() / count as f64;
    let avg_low = in_range.iter().map(|o| o.temp_low).sum::<f64>() / count as f64;
    let min_temp = in_range
        .iter()
        .map(|o| o.temp_low)
        .fold(f64::INFINITY, f64::min);
    let max_temp = in_range
        .iter()
        .map(|o| o.temp_high)
        .fold(f64::NEG_INFINITY, f64::max);

    let frost_days: Vec<NaiveDate> = in_range
        .iter()
        .filter(|o| o.temp_low < FREEZING_F)
        .map(|o| o.date)
        .collect();
    let chill_days = in_range
        .iter()
        .filter(|o| o.temp_low >= FREEZING_F && o.temp_low <= CHILL_CEILING_F)
        .count() as u32;

    let expected_days = (end - start).num_days() + 1;

    Some(SeasonSummary {
        start_date: start,
        end_date: end,
        total_gdd,
        avg_daily_gdd: total_gdd / count as f64,
        avg_high,
        avg_low,
        min_temp,
        max_temp,
        frost_events: frost_days.len(),
        last_frost_date: frost_days.iter().max().copied(),
        chill_hours: chill_days * CHILL_HOURS_PER_DAY,
        observation_count: count,
        missing_days: (expected_days - count as i64).max(0),
    })
}
