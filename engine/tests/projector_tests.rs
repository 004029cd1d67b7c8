//! Harvest window projection tests
//!
//! Property-based and unit tests for:
//! - Property 4: Window Date Ordering
//! - Property 5: Season Wraparound Across Jan 1
//! - Property 6: Status Priority
//! - Property 20: Slow Rates Stay Within the Projection Horizon
//! - Scenario: Navel orange bloom on March 15

use chrono::{Datelike, Duration, NaiveDate};
use fielder_engine::calendar::{resolve_season_year, season_dates};
use fielder_engine::gdd::{MAX_PROJECTION_DAYS, MIN_USABLE_DAILY_GDD};
use fielder_engine::projector::{Projector, RateSource, RollForwardPolicy};
use fielder_engine::{
    DailyObservation, ForecastDay, GddTarget, HistoricalWindow, ProjectionBasis, SeasonStatus,
};
use proptest::prelude::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Valid targets: 0 < maturity < peak, window > 0
fn target_strategy() -> impl Strategy<Value = GddTarget> {
    (35.0f64..65.0, 100.0f64..8000.0, 1.0f64..2000.0, 10.0f64..5000.0).prop_map(
        |(base, maturity, gap, window)| {
            GddTarget::new(base, maturity, maturity + gap, window).unwrap()
        },
    )
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2030, 1u32..=365).prop_map(|(year, doy)| {
        NaiveDate::from_yo_opt(year, doy).unwrap()
    })
}

/// Any day inside the Nov 1 - Jan 31 season of 2025-26 or 2026-27
fn winter_day_strategy() -> impl Strategy<Value = NaiveDate> {
    (prop_oneof![Just(2025i32), Just(2026i32)], 0i64..92).prop_map(|(year, offset)| {
        date(year, 11, 1) + Duration::days(offset)
    })
}

fn rate_source_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), Just(-5.0), 1.0f64..40.0]
}

/// Positive rates below the usable floor, down to 1e-300
fn negligible_rate_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-300i32..-1).prop_map(|exp| 10f64.powi(exp)),
        0.0001f64..MIN_USABLE_DAILY_GDD,
    ]
}

/// Usable but slow rates
fn slow_rate_strategy() -> impl Strategy<Value = f64> {
    MIN_USABLE_DAILY_GDD..2.0
}

const NO_ROLL: RollForwardPolicy = RollForwardPolicy {
    grace_days: 30,
    long_storage: true,
};

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property 4: maturity <= optimal start <= peak <= optimal end <= window end
    #[test]
    fn prop_climatology_window_is_ordered(
        target in target_strategy(),
        reference in date_strategy(),
        today in date_strategy(),
        rate in rate_source_strategy(),
        long_storage in any::<bool>(),
    ) {
        let projector = Projector::new(RollForwardPolicy { grace_days: 30, long_storage });
        let prediction = projector.project(
            reference,
            &target,
            &RateSource::Climatology { avg_daily_gdd: rate },
            today,
        );
        prop_assert!(prediction.is_ordered(), "dates out of order: {:?}", prediction.dates());
        prop_assert!(prediction.progress_pct >= 0.0 && prediction.progress_pct <= 100.0);
    }

    /// Property 4: ordering holds when walking observations and forecasts
    #[test]
    fn prop_observed_window_is_ordered(
        target in target_strategy(),
        temps in prop::collection::vec((40.0f64..105.0, 20.0f64..40.0), 0..200),
        forward_rate in rate_source_strategy(),
    ) {
        let reference = date(2025, 3, 1);
        let observations: Vec<DailyObservation> = temps
            .iter()
            .enumerate()
            .map(|(i, (high, spread))| {
                DailyObservation::new(reference + Duration::days(i as i64), *high, high - spread)
            })
            .collect();
        let prediction = Projector::default().project(
            reference,
            &target,
            &RateSource::Observed {
                observations: &observations,
                forecast: &[],
                forward_rate,
            },
            date(2025, 9, 1),
        );
        prop_assert!(prediction.is_ordered(), "dates out of order: {:?}", prediction.dates());
    }

    /// Property 20: a negligible climatology rate falls back to fixed offsets
    #[test]
    fn prop_negligible_climatology_rate_uses_fixed_offsets(
        target in target_strategy(),
        reference in date_strategy(),
        rate in negligible_rate_strategy(),
    ) {
        let prediction = Projector::new(NO_ROLL).project(
            reference,
            &target,
            &RateSource::Climatology { avg_daily_gdd: rate },
            reference,
        );
        prop_assert_eq!(prediction.basis, ProjectionBasis::FixedOffsets);
        prop_assert!(prediction.is_ordered());
    }

    /// Property 20: slow rates never place a date past the horizon
    #[test]
    fn prop_slow_rate_within_horizon(
        target in target_strategy(),
        reference in date_strategy(),
        rate in slow_rate_strategy(),
    ) {
        let prediction = Projector::new(NO_ROLL).project(
            reference,
            &target,
            &RateSource::Climatology { avg_daily_gdd: rate },
            reference,
        );
        prop_assert!(prediction.is_ordered());
        prop_assert!((prediction.window_end_date - reference).num_days() <= MAX_PROJECTION_DAYS);
    }

    /// Property 20: the observed walk tolerates negligible forward rates and cold forecasts
    #[test]
    fn prop_observed_walk_negligible_forward_rate(
        target in target_strategy(),
        forward_rate in prop_oneof![negligible_rate_strategy(), slow_rate_strategy()],
        cold_days in 0usize..14,
    ) {
        let reference = date(2025, 3, 1);
        let observations: Vec<DailyObservation> = (0..30)
            .map(|i| DailyObservation::new(reference + Duration::days(i), 80.0, 60.0))
            .collect();
        let forecast: Vec<ForecastDay> = (0..cold_days)
            .map(|i| ForecastDay {
                date: date(2025, 3, 31) + Duration::days(i as i64),
                temp_high: 30.0,
                temp_low: 10.0,
                confidence: 0.9,
            })
            .collect();
        let prediction = Projector::new(NO_ROLL).project(
            reference,
            &target,
            &RateSource::Observed {
                observations: &observations,
                forecast: &forecast,
                forward_rate,
            },
            date(2025, 4, 1),
        );
        prop_assert!(prediction.is_ordered());
        if prediction.basis == ProjectionBasis::GddProjection {
            let last_known = date(2025, 3, 31) + Duration::days(cold_days as i64);
            prop_assert!((prediction.window_end_date - last_known).num_days() <= MAX_PROJECTION_DAYS);
        }
    }

    /// Property 5: every day from Nov 1 to Jan 31 is inside the window
    #[test]
    fn prop_wrapping_season_contains_winter_days(today in winter_day_strategy()) {
        let window = HistoricalWindow {
            harvest_start_doy: 305,
            harvest_end_doy: 31,
            peak_start_doy: None,
            peak_end_doy: None,
        };
        let prediction = Projector::default()
            .project_historical(&window, date(2025, 3, 15), today)
            .unwrap();

        prop_assert_eq!(
            prediction.window_end_date.year(),
            prediction.maturity_date.year() + 1
        );
        prop_assert!(prediction.flags.harvestable, "{} not harvestable", today);
        prop_assert!(prediction.status.is_in_season());
        prop_assert!(prediction.is_ordered());
    }

    /// Property 5: the resolved season always spans consecutive years when wrapping
    #[test]
    fn prop_wrapping_season_years_are_consecutive(
        start in 250i32..366,
        end in 1i32..120,
        today in date_strategy(),
    ) {
        let years = resolve_season_year(start, end, today);
        prop_assert_eq!(years.end_year, years.start_year + 1);
        let (season_start, season_end) = season_dates(start, end, today).unwrap();
        prop_assert!(season_start < season_end);
        // never a season that has already finished
        prop_assert!(season_end >= today);
    }

    /// Property 6: at most one display status, following the priority order
    #[test]
    fn prop_status_matches_flag_priority(
        target in target_strategy(),
        offset in 0i64..800,
        rate in 5.0f64..30.0,
    ) {
        let reference = date(2025, 3, 1);
        let today = reference + Duration::days(offset);
        let prediction = Projector::new(RollForwardPolicy { grace_days: 30, long_storage: true })
            .project(reference, &target, &RateSource::Climatology { avg_daily_gdd: rate }, today);

        let flags = prediction.flags;
        prop_assert_eq!(flags.off_season, !flags.harvestable);
        if flags.at_peak || flags.in_optimal_window || flags.past_optimal {
            prop_assert!(flags.harvestable);
        }
        let expected = if flags.at_peak {
            SeasonStatus::AtPeak
        } else if flags.in_optimal_window {
            SeasonStatus::InOptimalWindow
        } else if flags.past_optimal {
            SeasonStatus::PastOptimal
        } else if flags.harvestable {
            SeasonStatus::Harvestable
        } else {
            SeasonStatus::OffSeason
        };
        prop_assert_eq!(prediction.status, expected);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    fn navel() -> GddTarget {
        GddTarget::new(55.0, 5100.0, 6100.0, 3500.0).unwrap()
    }

    /// Scenario: Navel orange, bloom March 15, 22 GDD/day
    #[test]
    fn test_navel_orange_scenario() {
        let bloom = date(2025, 3, 15);
        let prediction = Projector::default().project(
            bloom,
            &navel(),
            &RateSource::Climatology { avg_daily_gdd: 22.0 },
            date(2025, 7, 1),
        );

        assert_eq!(prediction.maturity_date, date(2025, 11, 1));
        assert_eq!((prediction.peak_center_date - bloom).num_days(), 277);
        // peak lands in the December-January window
        assert!(prediction.peak_center_date >= date(2025, 12, 1));
        assert!(prediction.peak_center_date <= date(2026, 1, 31));
        // window end crosses into the next year and ordering holds
        assert_eq!(prediction.window_end_date.year(), 2026);
        assert!(prediction.is_ordered());
    }

    /// Test that the optimal window is the middle half by heat, not by days
    #[test]
    fn test_optimal_window_is_middle_half_by_gdd() {
        let target = GddTarget::new(50.0, 1000.0, 2000.0, 400.0).unwrap();
        let reference = date(2025, 4, 1);
        let prediction = Projector::default().project(
            reference,
            &target,
            &RateSource::Climatology { avg_daily_gdd: 10.0 },
            reference,
        );
        assert_eq!((prediction.optimal_start_date - reference).num_days(), 190);
        assert_eq!((prediction.optimal_end_date - reference).num_days(), 210);
        assert_eq!((prediction.window_end_date - reference).num_days(), 220);
    }

    /// Test that a wide window clamps optimal start to maturity
    #[test]
    fn test_wide_window_clamps_optimal_start() {
        let target = GddTarget::new(50.0, 1900.0, 2000.0, 2000.0).unwrap();
        let reference = date(2025, 4, 1);
        let prediction = Projector::default().project(
            reference,
            &target,
            &RateSource::Climatology { avg_daily_gdd: 10.0 },
            reference,
        );
        assert_eq!(prediction.optimal_start_date, prediction.maturity_date);
    }

    /// Test roll-forward repeats until the window is current
    #[test]
    fn test_roll_forward_is_bounded() {
        let target = GddTarget::new(50.0, 100.0, 200.0, 20.0).unwrap();
        let prediction = Projector::default().project(
            date(2020, 4, 1),
            &target,
            &RateSource::Climatology { avg_daily_gdd: 20.0 },
            date(2025, 6, 1),
        );
        assert!(prediction.showing_next_season);
        // three rolls at most
        assert_eq!(prediction.reference_date, date(2023, 4, 1));
    }

    /// Test a climatology rate of 1e-20 neither panics nor projects
    #[test]
    fn test_vanishing_rate_uses_fixed_offsets() {
        let bloom = date(2025, 3, 15);
        let prediction = Projector::default().project(
            bloom,
            &navel(),
            &RateSource::Climatology { avg_daily_gdd: 1e-20 },
            date(2025, 6, 1),
        );
        assert_eq!(prediction.basis, ProjectionBasis::FixedOffsets);
        assert_eq!(prediction.maturity_date, bloom + Duration::days(120));
    }

    /// Test a cold forecast after warm history keeps the observed rate beyond it
    #[test]
    fn test_cold_forecast_then_observed_rate() {
        // thresholds: 1000, 1800, 2000, 2200, 2400
        let target = GddTarget::new(50.0, 1000.0, 2000.0, 800.0).unwrap();
        let reference = date(2025, 3, 1);
        // 20 GDD/day for 40 days: 800
        let observations: Vec<DailyObservation> = (0..40)
            .map(|i| DailyObservation::new(reference + Duration::days(i), 80.0, 60.0))
            .collect();
        let forecast: Vec<ForecastDay> = (0..14)
            .map(|i| ForecastDay {
                date: date(2025, 4, 10) + Duration::days(i),
                temp_high: 44.0,
                temp_low: 30.0,
                confidence: 0.9,
            })
            .collect();
        let prediction = Projector::default().project(
            reference,
            &target,
            &RateSource::Observed {
                observations: &observations,
                forecast: &forecast,
                forward_rate: 20.0,
            },
            date(2025, 4, 10),
        );
        assert_eq!(prediction.basis, ProjectionBasis::GddProjection);
        // 200 remaining at 20/day from the last forecast day, Apr 23
        assert_eq!(prediction.maturity_date, date(2025, 5, 3));
        assert!(prediction.is_ordered());
    }
}
