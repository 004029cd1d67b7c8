//! Weather integration tests
//!
//! Tests for weather data including:
//! - Property 16: Forecast confidence falls with lead time
//! - Property 17: Incomplete provider rows never reach accumulation

mod common;

use std::time::Duration;

use common::{date, FakeWeather};
use fielder_engine::DailyObservation;
use fielder_service::external::weather::{
    climatology_from, forecast_confidence, parse_forecast, parse_observations, OpenMeteoDaily,
    OpenMeteoResponse,
};
use fielder_service::services::{WeatherOutcome, WeatherService};
use proptest::prelude::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ============================================================================
// Property Test Strategies
// ============================================================================

fn cell_strategy() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        3 => (-10.0f64..45.0).prop_map(Some),
        1 => Just(None),
    ]
}

fn daily_strategy() -> impl Strategy<Value = OpenMeteoDaily> {
    prop::collection::vec((cell_strategy(), cell_strategy()), 0..30).prop_map(|cells| {
        let start = date(2025, 5, 1);
        OpenMeteoDaily {
            time: (0..cells.len())
                .map(|i| (start + chrono::Duration::days(i as i64)).to_string())
                .collect(),
            temperature_2m_max: cells.iter().map(|(high, _)| *high).collect(),
            temperature_2m_min: cells.iter().map(|(_, low)| *low).collect(),
        }
    })
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 16: Forecast confidence falls with lead time
    #[test]
    fn prop_forecast_confidence_bounded(lead in 0usize..60) {
        let confidence = forecast_confidence(lead);
        prop_assert!((0.5..=0.95).contains(&confidence));
        prop_assert!(forecast_confidence(lead + 1) <= confidence);
    }

    /// Property 17: Incomplete provider rows never reach accumulation
    #[test]
    fn prop_incomplete_rows_dropped(daily in daily_strategy()) {
        let complete = daily
            .temperature_2m_max
            .iter()
            .zip(&daily.temperature_2m_min)
            .filter(|(high, low)| high.is_some() && low.is_some())
            .count();

        let observations = parse_observations(&daily);
        prop_assert_eq!(observations.len(), complete);
        prop_assert_eq!(parse_forecast(&daily).len(), complete);
        prop_assert!(observations.windows(2).all(|w| w[0].date < w[1].date));
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Test Open-Meteo payloads with null cells
    #[test]
    fn test_parse_open_meteo_payload() {
        let raw = r#"{
            "latitude": 27.64,
            "longitude": -80.4,
            "daily": {
                "time": ["2025-06-01", "2025-06-02", "2025-06-03"],
                "temperature_2m_max": [30.0, null, 20.0],
                "temperature_2m_min": [20.0, 10.0, 5.0]
            }
        }"#;
        let response: OpenMeteoResponse = serde_json::from_str(raw).unwrap();
        let daily = response.daily.unwrap();

        let observations = parse_observations(&daily);
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].date, date(2025, 6, 1));
        assert!(approx(observations[0].temp_high, 86.0));
        assert!(approx(observations[0].temp_low, 68.0));
        assert_eq!(observations[1].date, date(2025, 6, 3));
    }

    /// Test forecast confidence follows the original lead time
    #[test]
    fn test_forecast_confidence_by_lead() {
        let daily = OpenMeteoDaily {
            time: vec!["2025-06-01".into(), "2025-06-02".into(), "2025-06-03".into()],
            temperature_2m_max: vec![Some(30.0), None, Some(28.0)],
            temperature_2m_min: vec![Some(20.0), Some(19.0), Some(18.0)],
        };
        let forecast = parse_forecast(&daily);
        assert_eq!(forecast.len(), 2);
        assert!(approx(forecast[0].confidence, 0.95));
        assert!(approx(forecast[1].confidence, 0.89));
        assert!(approx(forecast_confidence(30), 0.5));
    }

    /// Test missing daily block is empty, not an error
    #[test]
    fn test_missing_daily_block() {
        let response: OpenMeteoResponse = serde_json::from_str(r#"{"latitude": 1.0}"#).unwrap();
        assert!(response.daily.is_none());
        assert!(parse_observations(&OpenMeteoDaily::default()).is_empty());
    }

    /// Test monthly normals from archive days
    #[test]
    fn test_climatology_from_observations() {
        let observations = [
            DailyObservation::new(date(2024, 7, 1), 80.0, 60.0),
            DailyObservation::new(date(2023, 7, 1), 90.0, 70.0),
        ];
        let climatology = climatology_from(7, &observations).unwrap();
        assert_eq!(climatology.month, 7);
        assert_eq!(climatology.avg_high, 85.0);
        assert_eq!(climatology.avg_low, 65.0);
        assert_eq!(climatology.avg_temp, 75.0);
        // (15 + 25) / 2 at base 55
        assert_eq!(climatology.avg_daily_gdd, 20.0);
        assert_eq!(climatology.observation_count, 2);
        assert!(!climatology.is_default);

        assert!(climatology_from(7, &[]).is_none());
    }

    /// Test a slow provider times out into an unavailable outcome
    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let weather = WeatherService::with_timeout(
            FakeWeather::constant(80.0, 60.0).with_delay(Duration::from_millis(250)),
            Duration::from_millis(20),
        );

        let outcome = weather
            .observations("indian_river", date(2025, 6, 1), date(2025, 6, 10))
            .await;
        assert!(matches!(outcome, WeatherOutcome::Unavailable(_)));
        assert!(weather.forecast("indian_river").await.is_empty());
        assert!(weather.climatology("indian_river", 6).await.is_none());
    }

    /// Test observed, empty and failed fetches
    #[tokio::test]
    async fn test_outcomes() {
        let timeout = Duration::from_secs(5);

        let observed = WeatherService::with_timeout(FakeWeather::constant(80.0, 60.0), timeout)
            .observations("indian_river", date(2025, 6, 1), date(2025, 6, 10))
            .await;
        assert_eq!(observed.observations().len(), 10);
        assert_eq!(observed.annotation("Fake"), "+ Fake weather (10 days)");

        let empty = WeatherService::with_timeout(FakeWeather::empty(), timeout)
            .observations("indian_river", date(2025, 6, 1), date(2025, 6, 10))
            .await;
        assert_eq!(empty, WeatherOutcome::Empty);

        let failed = WeatherService::with_timeout(FakeWeather::failing(), timeout)
            .observations("indian_river", date(2025, 6, 1), date(2025, 6, 10))
            .await;
        assert!(matches!(failed, WeatherOutcome::Unavailable(_)));
    }

    /// Test projection confidence tiers
    #[tokio::test]
    async fn test_project_gdd_to_date() {
        let today = date(2025, 6, 1);
        let timeout = Duration::from_secs(5);

        // Already reached
        let weather = WeatherService::with_timeout(FakeWeather::constant(80.0, 60.0), timeout);
        let reached = weather
            .project_gdd_to_date("central_valley", 500.0, 400.0, 50.0, None, today)
            .await;
        assert_eq!(reached.days, 0);
        assert_eq!(reached.date, today);
        assert_eq!(reached.confidence, 0.95);

        // Forecast at 20 GDD/day, 15 days out
        let weather = WeatherService::with_timeout(
            FakeWeather::constant(80.0, 60.0).with_forecast_from(today),
            timeout,
        );
        let projected = weather
            .project_gdd_to_date("central_valley", 0.0, 300.0, 50.0, None, today)
            .await;
        assert!(projected.from_forecast);
        assert_eq!(projected.days, 15);
        assert_eq!(projected.date, date(2025, 6, 16));
        assert_eq!(projected.confidence, 0.72);

        // Climatology only, 50 days out
        let weather = WeatherService::with_timeout(FakeWeather::constant(80.0, 60.0), timeout);
        let projected = weather
            .project_gdd_to_date("central_valley", 0.0, 1000.0, 50.0, None, today)
            .await;
        assert!(!projected.from_forecast);
        assert_eq!(projected.days, 50);
        assert_eq!(projected.confidence, 0.43);

        // Forecast below the base temperature: no usable rate
        let weather = WeatherService::with_timeout(
            FakeWeather::constant(44.0, 30.0).with_forecast_from(today),
            timeout,
        );
        let projected = weather
            .project_gdd_to_date("central_valley", 0.0, 300.0, 50.0, None, today)
            .await;
        assert!(projected.from_forecast);
        assert_eq!(projected.days, 30);
        assert_eq!(projected.date, date(2025, 7, 1));

        // Nothing available: 10 GDD/day fallback
        let weather = WeatherService::with_timeout(FakeWeather::failing(), timeout);
        let projected = weather
            .project_gdd_to_date("central_valley", 0.0, 100.0, 50.0, None, today)
            .await;
        assert_eq!(projected.days, 10);
        assert_eq!(projected.confidence, 0.6);
    }

    /// Test season statistics through the service
    #[tokio::test]
    async fn test_season_summary() {
        let weather = WeatherService::with_timeout(
            FakeWeather::constant(80.0, 60.0),
            Duration::from_secs(5),
        );
        let summary = weather
            .season_summary("central_valley", date(2025, 6, 1), date(2025, 6, 10))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.observation_count, 10);
        assert_eq!(summary.total_gdd, 150.0);
        assert_eq!(summary.frost_events, 0);

        let failing = WeatherService::with_timeout(FakeWeather::failing(), Duration::from_secs(5));
        assert!(failing
            .season_summary("central_valley", date(2025, 6, 1), date(2025, 6, 10))
            .await
            .is_err());
    }
}
