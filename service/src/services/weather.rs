//! Weather service with explicit fallbacks
//!
//! Wraps a [`WeatherSource`] with a request timeout. Failures and empty
//! responses become a [`WeatherOutcome`] instead of an error so that the
//! prediction pipeline can fall back to climatology and say so.

use std::future::Future;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use fielder_engine::gdd::{is_usable_rate, offset_days, summarize_season};
use fielder_engine::{Climatology, DailyObservation, ForecastDay, SeasonSummary};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::WeatherConfig;
use crate::error::{AppError, AppResult};
use crate::external::WeatherSource;

/// Daily GDD assumed for a projection when climatology is unavailable
const FALLBACK_DAILY_GDD: f64 = 10.0;

/// Days assumed to reach a target when no rate is usable
const FALLBACK_PROJECTION_DAYS: i64 = 30;

const FORECAST_CONFIDENCE: f64 = 0.8;
const CLIMATOLOGY_CONFIDENCE: f64 = 0.6;
const TARGET_REACHED_CONFIDENCE: f64 = 0.95;

/// What a historical fetch produced
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherOutcome {
    Observed(Vec<DailyObservation>),
    /// The provider answered with no usable days
    Empty,
    /// The provider failed or timed out
    Unavailable(String),
}

impl WeatherOutcome {
    pub fn observations(&self) -> &[DailyObservation] {
        match self {
            WeatherOutcome::Observed(observations) => observations,
            _ => &[],
        }
    }

    /// Data-source suffix describing the weather behind a prediction
    pub fn annotation(&self, provider: &str) -> String {
        match self {
            WeatherOutcome::Observed(observations) => {
                format!("+ {} weather ({} days)", provider, observations.len())
            }
            WeatherOutcome::Empty => "+ climatology estimate".to_string(),
            WeatherOutcome::Unavailable(_) => "(weather unavailable)".to_string(),
        }
    }
}

/// When a GDD target is expected to be reached
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GddProjection {
    pub date: NaiveDate,
    pub days: i64,
    pub confidence: f64,
    pub from_forecast: bool,
}

/// Weather service for prediction requests
#[derive(Clone)]
pub struct WeatherService<W> {
    source: W,
    timeout: Duration,
    forecast_days: u32,
}

impl<W: WeatherSource> WeatherService<W> {
    pub fn new(source: W, config: &WeatherConfig) -> Self {
        Self {
            source,
            timeout: config.timeout(),
            forecast_days: config.effective_forecast_days(),
        }
    }

    pub fn with_timeout(source: W, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            forecast_days: WeatherConfig::default().effective_forecast_days(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.source.name()
    }

    async fn guarded<T>(&self, request: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| AppError::Timeout(self.timeout.as_secs()))?
    }

    /// Observed days in `[start, end]`, never failing
    pub async fn observations(
        &self,
        region_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> WeatherOutcome {
        match self
            .guarded(self.source.get_historical(region_id, start, end))
            .await
        {
            Ok(observations) if observations.is_empty() => {
                warn!(region_id, %start, %end, "Weather provider returned no observations");
                WeatherOutcome::Empty
            }
            Ok(observations) => WeatherOutcome::Observed(observations),
            Err(e) => {
                warn!(region_id, error = %e, "Weather fetch failed, falling back");
                WeatherOutcome::Unavailable(e.to_string())
            }
        }
    }

    /// Forecast days, empty when the provider fails
    pub async fn forecast(&self, region_id: &str) -> Vec<ForecastDay> {
        match self
            .guarded(self.source.get_forecast(region_id, self.forecast_days))
            .await
        {
            Ok(days) => days,
            Err(e) => {
                warn!(region_id, error = %e, "Forecast unavailable");
                Vec::new()
            }
        }
    }

    /// Monthly normals, `None` when the provider fails
    pub async fn climatology(&self, region_id: &str, month: u32) -> Option<Climatology> {
        match self
            .guarded(self.source.get_climatology(region_id, month))
            .await
        {
            Ok(climatology) => Some(climatology),
            Err(e) => {
                warn!(region_id, month, error = %e, "Climatology unavailable");
                None
            }
        }
    }

    /// Project when `target_gdd` will be reached from `current_gdd`.
    ///
    /// Uses the forecast's average rate, else climatology for the current
    /// month. Confidence starts at 0.8 (forecast) or 0.6 (climatology) and
    /// drops ×0.9 beyond 14 days and a further ×0.8 beyond 30.
    pub async fn project_gdd_to_date(
        &self,
        region_id: &str,
        current_gdd: f64,
        target_gdd: f64,
        base_temp: f64,
        max_temp: Option<f64>,
        today: NaiveDate,
    ) -> GddProjection {
        let remaining = target_gdd - current_gdd;
        if remaining <= 0.0 {
            return GddProjection {
                date: today,
                days: 0,
                confidence: TARGET_REACHED_CONFIDENCE,
                from_forecast: false,
            };
        }

        let forecast = self.forecast(region_id).await;
        let (rate, mut confidence, from_forecast) = if forecast.is_empty() {
            let rate = self
                .climatology(region_id, today.month())
                .await
                .map(|c| c.avg_daily_gdd_at(base_temp, max_temp))
                .unwrap_or(FALLBACK_DAILY_GDD);
            (rate, CLIMATOLOGY_CONFIDENCE, false)
        } else {
            let total: f64 = forecast
                .iter()
                .map(|day| day.projected_gdd(base_temp, max_temp))
                .sum();
            (total / forecast.len() as f64, FORECAST_CONFIDENCE, true)
        };

        let days = if is_usable_rate(rate) {
            offset_days(remaining, rate)
        } else {
            FALLBACK_PROJECTION_DAYS
        };
        if days > 14 {
            confidence *= 0.9;
        }
        if days > 30 {
            confidence *= 0.8;
        }
        debug!(region_id, rate, days, from_forecast, "Projected GDD target");

        GddProjection {
            date: fielder_engine::calendar::shift(today, days),
            days,
            confidence: (confidence * 100.0).round() / 100.0,
            from_forecast,
        }
    }

    /// Season statistics between two dates; `None` when no days were observed
    pub async fn season_summary(
        &self,
        region_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Option<SeasonSummary>> {
        let observations = self
            .guarded(self.source.get_historical(region_id, start, end))
            .await?;
        Ok(summarize_season(&observations, start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotations() {
        let day = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let observed = WeatherOutcome::Observed(vec![DailyObservation::new(day, 80.0, 60.0)]);
        assert_eq!(observed.annotation("Open-Meteo"), "+ Open-Meteo weather (1 days)");
        assert_eq!(WeatherOutcome::Empty.annotation("Open-Meteo"), "+ climatology estimate");
        assert_eq!(
            WeatherOutcome::Unavailable("timeout".into()).annotation("Open-Meteo"),
            "(weather unavailable)"
        );
        assert!(WeatherOutcome::Empty.observations().is_empty());
    }
}
