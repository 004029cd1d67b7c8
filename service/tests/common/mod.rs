//! Shared helpers for service tests

#![allow(dead_code)]

use std::time::Duration;

use chrono::NaiveDate;
use fielder_engine::{Climatology, DailyObservation, ForecastDay};
use fielder_service::config::{Config, PredictionConfig};
use fielder_service::error::{AppError, AppResult};
use fielder_service::external::WeatherSource;
use fielder_service::repository::InMemoryCatalog;
use fielder_service::services::{PredictionService, WeatherService};

pub const CATALOG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/catalog.json");

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn fixture_catalog() -> InMemoryCatalog {
    InMemoryCatalog::load(CATALOG_PATH).unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    Normal,
    Empty,
    Failing,
}

/// Weather source with constant temperatures
#[derive(Debug, Clone)]
pub struct FakeWeather {
    pub behavior: Behavior,
    pub high: f64,
    pub low: f64,
    /// First forecast day; `None` serves no forecast
    pub forecast_start: Option<NaiveDate>,
    /// Forecast high and low when they differ from the observed ones
    pub forecast_temps: Option<(f64, f64)>,
    pub delay: Option<Duration>,
}

impl FakeWeather {
    pub fn constant(high: f64, low: f64) -> Self {
        Self {
            behavior: Behavior::Normal,
            high,
            low,
            forecast_start: None,
            forecast_temps: None,
            delay: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            behavior: Behavior::Failing,
            ..Self::constant(80.0, 60.0)
        }
    }

    pub fn empty() -> Self {
        Self {
            behavior: Behavior::Empty,
            ..Self::constant(80.0, 60.0)
        }
    }

    pub fn with_forecast_from(mut self, start: NaiveDate) -> Self {
        self.forecast_start = Some(start);
        self
    }

    pub fn with_forecast_temps(mut self, high: f64, low: f64) -> Self {
        self.forecast_temps = Some((high, low));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl WeatherSource for FakeWeather {
    fn name(&self) -> &str {
        "Fake"
    }

    async fn get_historical(
        &self,
        _region_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<DailyObservation>> {
        self.pause().await;
        match self.behavior {
            Behavior::Failing => Err(AppError::WeatherServiceUnavailable),
            Behavior::Empty => Ok(Vec::new()),
            Behavior::Normal => Ok(start
                .iter_days()
                .take_while(|day| *day <= end)
                .map(|day| DailyObservation::new(day, self.high, self.low))
                .collect()),
        }
    }

    async fn get_forecast(&self, _region_id: &str, days: u32) -> AppResult<Vec<ForecastDay>> {
        self.pause().await;
        if self.behavior == Behavior::Failing {
            return Err(AppError::WeatherServiceUnavailable);
        }
        let Some(start) = self.forecast_start else {
            return Ok(Vec::new());
        };
        let (high, low) = self.forecast_temps.unwrap_or((self.high, self.low));
        Ok(start
            .iter_days()
            .take(days as usize)
            .enumerate()
            .map(|(i, day)| ForecastDay {
                date: day,
                temp_high: high,
                temp_low: low,
                confidence: (0.95 - 0.03 * i as f64).max(0.5),
            })
            .collect())
    }

    async fn get_climatology(&self, _region_id: &str, month: u32) -> AppResult<Climatology> {
        self.pause().await;
        if self.behavior == Behavior::Failing {
            return Err(AppError::WeatherServiceUnavailable);
        }
        Ok(Climatology {
            month,
            avg_high: self.high,
            avg_low: self.low,
            avg_temp: (self.high + self.low) / 2.0,
            avg_daily_gdd: ((self.high + self.low) / 2.0 - 55.0).max(0.0),
            observation_count: 150,
            is_default: false,
        })
    }
}

pub fn service(weather: FakeWeather) -> PredictionService<FakeWeather, InMemoryCatalog> {
    PredictionService::new(weather, fixture_catalog(), &Config::default())
}

pub fn service_with_timeout(
    weather: FakeWeather,
    timeout: Duration,
) -> PredictionService<FakeWeather, InMemoryCatalog> {
    PredictionService::with_weather(
        WeatherService::with_timeout(weather, timeout),
        fixture_catalog(),
        PredictionConfig::default(),
    )
}
